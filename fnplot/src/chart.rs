//! Charts: a set of datums sampled over a shared view
use crate::{
    Error,
    cache::{DatumId, ExpressionCache},
    datum::{Datum, FnType, GraphType, SamplerName},
    eval::Rounding,
    helpers,
    sampler::{self, IntervalSamples, PointSamples, Samples, View},
    scale::{AxisType, Scale},
    types::Interval,
};
use serde::{Deserialize, Serialize};

/// Upper bound on the default number of samples per datum
pub const MAX_SAMPLES: usize = 4 * 550;

/// Options for a single axis
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AxisOptions {
    /// Linear or logarithmic
    #[serde(rename = "type")]
    pub kind: AxisType,
    /// Visible domain; a default is chosen if this is `None`
    pub domain: Option<[f64; 2]>,
    /// Flip the direction of the axis on screen
    pub invert: bool,
}

/// Options for building a [`Chart`]
///
/// ```
/// # use fnplot::chart::ChartOptions;
/// let opts: ChartOptions = serde_json::from_str(r#"{
///     "width": 800,
///     "xAxis": { "domain": [-1, 1] },
///     "data": [{ "fn": "x^2" }]
/// }"#).unwrap();
/// assert_eq!(opts.width, 800);
/// assert_eq!(opts.height, 350);
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    /// Total width, in pixels
    pub width: u32,
    /// Total height, in pixels
    pub height: u32,
    /// Optional title, which takes up extra space at the top
    pub title: Option<String>,
    /// Horizontal axis
    pub x_axis: AxisOptions,
    /// Vertical axis
    pub y_axis: AxisOptions,
    /// Functions to plot
    pub data: Vec<Datum>,
    /// Rounding policy for interval evaluation
    pub rounding: Rounding,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 550,
            height: 350,
            title: None,
            x_axis: AxisOptions::default(),
            y_axis: AxisOptions::default(),
            data: vec![],
            rounding: Rounding::default(),
        }
    }
}

/// Space around the plotting area, in pixels
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Margin {
    /// Left margin
    pub left: f64,
    /// Right margin
    pub right: f64,
    /// Top margin
    pub top: f64,
    /// Bottom margin
    pub bottom: f64,
}

impl Margin {
    fn new(title: bool) -> Self {
        Self {
            left: 30.0,
            right: 30.0,
            top: if title { 40.0 } else { 20.0 },
            bottom: 20.0,
        }
    }
}

/// Sampled output for one datum
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "sampler", rename_all = "camelCase")]
pub enum Sampled {
    /// Output of the interval sampler
    Interval(IntervalSamples),
    /// Output of the point sampler
    BuiltIn(PointSamples),
}

/// Everything drawn for a single datum
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatumSamples {
    /// How to render `samples`
    pub graph_type: GraphType,
    /// Whether to fill the area between the function and `y = 0`
    pub closed: bool,
    /// Samples of the main function
    pub samples: Sampled,
    /// Tangent line, if requested and defined
    pub derivative: Option<PointSamples>,
    /// Secant lines, or `None` where a secant is undefined
    pub secants: Vec<Option<PointSamples>>,
}

/// A set of datums plotted over a shared view
///
/// The chart owns one expression cache per backend, so redrawing after a
/// pan, zoom, or scope change reuses every compiled expression.
pub struct Chart {
    options: ChartOptions,
    margin: Margin,
    width: f64,
    height: f64,
    view: View,
    points: ExpressionCache<f64>,
    intervals: ExpressionCache<Interval>,
}

impl Chart {
    /// Builds a chart, validating axis domains
    pub fn build(options: ChartOptions) -> Result<Self, Error> {
        let margin = Margin::new(options.title.is_some());
        let width =
            (f64::from(options.width) - margin.left - margin.right).max(1.0);
        let height =
            (f64::from(options.height) - margin.top - margin.bottom).max(1.0);

        let x_domain = options.x_axis.domain.unwrap_or(match options.x_axis.kind {
            AxisType::Linear => [-6.0, 6.0],
            AxisType::Log => [1.0, 10.0],
        });
        let y_domain = match (options.y_axis.domain, options.y_axis.kind) {
            (Some(d), _) => d,
            (None, AxisType::Log) => [1.0, 10.0],
            (None, AxisType::Linear) => {
                // Keep the aspect ratio
                let dy = height * (x_domain[1] - x_domain[0]) / width;
                [-dy / 2.0, dy / 2.0]
            }
        };
        let x_range = if options.x_axis.invert {
            [width, 0.0]
        } else {
            [0.0, width]
        };
        let y_range = if options.y_axis.invert {
            [0.0, height]
        } else {
            [height, 0.0]
        };
        let view = View {
            x: Scale::new('x', options.x_axis.kind, x_domain, x_range)?,
            y: Scale::new('y', options.y_axis.kind, y_domain, y_range)?,
        };
        let rounding = options.rounding;
        Ok(Self {
            options,
            margin,
            width,
            height,
            view,
            points: ExpressionCache::new().with_rounding(rounding),
            intervals: ExpressionCache::new().with_rounding(rounding),
        })
    }

    /// Returns the chart's options
    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Returns the data, for modification between draws
    ///
    /// Changing an expression causes it to be recompiled on the next draw;
    /// changing a scope does not.
    pub fn data_mut(&mut self) -> &mut Vec<Datum> {
        &mut self.options.data
    }

    /// Returns the margins around the plotting area
    pub fn margin(&self) -> Margin {
        self.margin
    }

    /// Returns the size of the plotting area, in pixels
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Returns the current view
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Returns the total number of compilations across both backends
    pub fn compile_count(&self) -> usize {
        self.points.compile_count() + self.intervals.compile_count()
    }

    /// Changes the visible domains (pan / zoom)
    ///
    /// Both domains are validated before anything changes.
    pub fn set_domain(
        &mut self,
        x: [f64; 2],
        y: [f64; 2],
    ) -> Result<(), Error> {
        let vx = self.view.x.with_domain('x', x)?;
        let vy = self.view.y.with_domain('y', y)?;
        self.view = View { x: vx, y: vy };
        Ok(())
    }

    /// Moves the tangent point of datum `index`
    ///
    /// Returns `false` if there's no such datum, or it has no derivative.
    pub fn update_derivative(&mut self, index: usize, x0: f64) -> bool {
        match self
            .options
            .data
            .get_mut(index)
            .and_then(|d| d.derivative.as_mut())
        {
            Some(d) => {
                d.x0 = Some(x0);
                true
            }
            None => false,
        }
    }

    /// Moves the end point of secant `j` on datum `index`
    ///
    /// Returns `false` if there's no such secant.
    pub fn update_secant(&mut self, index: usize, j: usize, x1: f64) -> bool {
        match self
            .options
            .data
            .get_mut(index)
            .and_then(|d| d.secants.get_mut(j))
        {
            Some(s) => {
                s.x1 = Some(x1);
                true
            }
            None => false,
        }
    }

    /// Applies a pointer position (in function space) to every derivative
    /// and secant marked with `updateOnMouseMove`
    pub fn mouse_move(&mut self, x: f64) {
        for d in &mut self.options.data {
            let deriv = d.derivative.as_mut();
            if let Some(deriv) = deriv.filter(|d| d.update_on_mouse_move) {
                deriv.x0 = Some(x);
            }
            for s in d.secants.iter_mut().filter(|s| s.update_on_mouse_move) {
                s.x1 = Some(x);
            }
        }
    }

    /// Default sample count, two per horizontal pixel
    pub fn default_samples(&self) -> usize {
        MAX_SAMPLES.min(2 * self.width as usize)
    }

    /// Samples every datum
    ///
    /// Each datum succeeds or fails independently; a failed datum is logged
    /// and reported in its own slot.
    pub fn draw(&mut self) -> Vec<Result<DatumSamples, Error>> {
        let n = self.default_samples();
        let Chart {
            options,
            view,
            points,
            intervals,
            ..
        } = self;
        options
            .data
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let out = draw_datum(points, intervals, view, i, d, n);
                if let Err(e) = &out {
                    log::debug!("aborting draw of {}: {e}", DatumId::Data(i));
                }
                out
            })
            .collect()
    }
}

/// Converts an undefined helper line into `None`
fn omit_undefined<T>(r: Result<T, Error>) -> Result<Option<T>, Error> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(Error::UndefinedAtPoint(x)) => {
            log::debug!("helper line is undefined at {x}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn draw_datum(
    points: &mut ExpressionCache<f64>,
    intervals: &mut ExpressionCache<Interval>,
    view: &View,
    i: usize,
    d: &Datum,
    default_samples: usize,
) -> Result<DatumSamples, Error> {
    let id = DatumId::Data(i);
    let graph_type = d.graph_type()?;
    let n = d.n_samples.unwrap_or(default_samples);
    let [lo, hi] = view.x.domain();
    let range = match d.range {
        Some([a, b]) => [a.max(lo), b.min(hi)],
        None => [lo, hi],
    };
    // A linear datum whose range lies entirely outside the view draws nothing
    let off_screen = d.fn_type()? == FnType::Linear
        && matches!(d.range, Some([a, b]) if a < b && (b <= lo || a >= hi));
    let samples = match d.sampler()? {
        SamplerName::Interval if off_screen => {
            Sampled::Interval(IntervalSamples::Cells(Samples::default()))
        }
        SamplerName::BuiltIn if off_screen => {
            Sampled::BuiltIn(PointSamples::default())
        }
        SamplerName::Interval => {
            let s = sampler::interval::sample(intervals, id, d, view, range, n)?;
            Sampled::Interval(match s {
                IntervalSamples::Cells(c) if d.closed => {
                    IntervalSamples::Cells(c.closed_bounds())
                }
                s => s,
            })
        }
        SamplerName::BuiltIn => {
            Sampled::BuiltIn(sampler::point::sample(points, id, d, view, range, n)?)
        }
    };

    let line = |points: &mut ExpressionCache<f64>, id: DatumId, line: &Datum| {
        let n = line.n_samples.unwrap_or(2);
        sampler::point::sample(points, id, line, view, view.x.domain(), n)
    };
    let derivative = match omit_undefined(helpers::derivative_line(points, i, d))? {
        Some(Some(t)) => Some(line(points, DatumId::Derivative(i), &t)?),
        _ => None,
    };
    let mut secants = Vec::with_capacity(d.secants.len());
    for (j, s) in d.secants.iter().enumerate() {
        let out = match omit_undefined(helpers::secant_line(points, i, d, s))? {
            Some(t) => Some(line(points, DatumId::Secant(i, j), &t)?),
            None => None,
        };
        secants.push(out);
    }

    Ok(DatumSamples {
        graph_type,
        closed: d.closed,
        samples,
        derivative,
        secants,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn chart(json: &str) -> Chart {
        Chart::build(serde_json::from_str(json).unwrap()).unwrap()
    }

    #[test]
    fn default_view() {
        let c = chart("{}");
        assert_eq!(c.size(), (490.0, 310.0));
        assert_eq!(c.view().x.domain(), [-6.0, 6.0]);
        let [lo, hi] = c.view().y.domain();
        assert_relative_eq!(hi, 310.0 * 12.0 / 490.0 / 2.0);
        assert_eq!(lo, -hi);
        assert_eq!(c.view().x.range(), [0.0, 490.0]);
        assert_eq!(c.view().y.range(), [310.0, 0.0]);
        assert_eq!(c.default_samples(), 980);

        let c = chart(r#"{ "title": "hi", "xAxis": { "type": "log" } }"#);
        assert_eq!(c.size(), (490.0, 290.0));
        assert_eq!(c.view().x.domain(), [1.0, 10.0]);
        assert_eq!(c.margin().top, 40.0);
    }

    #[test]
    fn inverted_axes() {
        let c = chart(
            r#"{ "xAxis": { "invert": true }, "yAxis": { "invert": true } }"#,
        );
        assert_eq!(c.view().x.range(), [490.0, 0.0]);
        assert_eq!(c.view().y.range(), [0.0, 310.0]);
    }

    #[test]
    fn bad_domain() {
        let opts: ChartOptions =
            serde_json::from_str(r#"{ "yAxis": { "domain": [5, 2] } }"#)
                .unwrap();
        assert!(matches!(
            Chart::build(opts),
            Err(Error::InvertedDomain { axis: 'y', .. })
        ));
        let mut c = chart("{}");
        assert!(c.set_domain([0.0, 1.0], [3.0, 3.0]).is_err());
        assert_eq!(c.view().x.domain(), [-6.0, 6.0]);
    }

    #[test]
    fn independent_failures() {
        let mut c = chart(
            r#"{ "data": [
                { "fn": "x^2" },
                { "fn": 3 },
                { "fn": "x", "fnType": "polar" },
                { "fn": "x^2 + y^2 - 1", "fnType": "implicit" }
            ] }"#,
        );
        let out = c.draw();
        assert_eq!(out.len(), 4);
        assert!(out[0].is_ok());
        assert_eq!(
            out[1].as_ref().unwrap_err(),
            &Error::InvalidExpressionKind("a number")
        );
        assert!(matches!(
            out[2],
            Err(Error::UnsupportedFnType { sampler: "interval", .. })
        ));
        let Ok(DatumSamples {
            samples: Sampled::Interval(IntervalSamples::Regions(r)),
            ..
        }) = &out[3]
        else {
            panic!("expected regions");
        };
        assert!(!r.regions.is_empty());
    }

    #[test]
    fn closed() {
        let mut c = chart(
            r#"{ "data": [{ "fn": "x^2 + 1", "closed": true, "nSamples": 10 }] }"#,
        );
        let out = c.draw().remove(0).unwrap();
        assert!(out.closed);
        let Sampled::Interval(IntervalSamples::Cells(s)) = out.samples else {
            panic!("expected cells");
        };
        assert_eq!(s.cells.len(), 9);
        for c in s.cells.iter().flatten() {
            assert_eq!(c.y.lower(), 0.0);
        }
    }

    #[test]
    fn range_is_clipped() {
        let mut c = chart(
            r#"{ "data": [{ "fn": "x", "range": [0, 100], "nSamples": 3 }] }"#,
        );
        let out = c.draw().remove(0).unwrap();
        let Sampled::Interval(IntervalSamples::Cells(s)) = out.samples else {
            panic!("expected cells");
        };
        assert_eq!(s.cells[0].unwrap().x, Interval::new(0.0, 3.0));
        assert_eq!(s.cells[1].unwrap().x, Interval::new(3.0, 6.0));
    }

    #[test]
    fn range_outside_the_view() {
        for sampler in ["interval", "builtIn"] {
            let mut c = chart(&format!(
                r#"{{ "data": [{{
                    "fn": "x", "range": [0, 100], "nSamples": 3,
                    "sampler": "{sampler}",
                    "derivative": {{ "fn": "1", "x0": -7 }}
                }}] }}"#
            ));
            assert!(c.draw().remove(0).is_ok());

            c.set_domain([-10.0, -5.0], [-1.0, 1.0]).unwrap();
            let out = c.draw().remove(0).unwrap();
            match out.samples {
                Sampled::Interval(IntervalSamples::Cells(s)) => {
                    assert!(s.cells.is_empty())
                }
                Sampled::BuiltIn(s) => assert!(s.runs.is_empty()),
                s => panic!("unexpected samples {s:?}"),
            }
            // Helper lines still cover the view
            let t = out.derivative.unwrap();
            assert_eq!(t.runs[0], [[-10.0, -10.0], [-5.0, -5.0]]);

            // Touching the edge of the view is still off-screen
            c.set_domain([-10.0, 0.0], [-1.0, 1.0]).unwrap();
            assert!(c.draw().remove(0).is_ok());
        }
    }

    #[test]
    fn secant_with_its_own_fn() {
        let mut c = chart(
            r#"{ "data": [{
                "fn": "x^2",
                "secants": [{ "fn": "x + 1" }, { "x0": 1, "fn": "2 * x" }]
            }] }"#,
        );
        let out = c.draw().remove(0).unwrap();
        let [Some(a), Some(b)] = &out.secants[..] else {
            panic!("expected two secants, got {:?}", out.secants);
        };
        assert_eq!(a.runs[0], [[-6.0, -5.0], [6.0, 7.0]]);
        assert_eq!(b.runs[0], [[-6.0, -12.0], [6.0, 12.0]]);
    }

    #[test]
    fn inverted_range_is_an_error() {
        let mut c = chart(r#"{ "data": [{ "fn": "x", "range": [3, 1] }] }"#);
        assert!(c.draw().remove(0).is_err());
    }

    #[test]
    fn helpers_follow_the_mouse() {
        let mut c = chart(
            r#"{ "data": [{
                "fn": "x^2",
                "derivative": { "fn": "2 * x", "updateOnMouseMove": true },
                "secants": [{ "x0": 0, "updateOnMouseMove": true }]
            }] }"#,
        );
        // No x0 / x1 yet, so both lines are undefined
        let out = c.draw().remove(0).unwrap();
        assert_eq!(out.derivative, None);
        assert_eq!(out.secants, [None]);
        let compiled = c.compile_count();

        c.mouse_move(2.0);
        let out = c.draw().remove(0).unwrap();
        let t = out.derivative.unwrap();
        assert_eq!(t.runs[0], [[-6.0, -28.0], [6.0, 20.0]]);
        let s = out.secants[0].as_ref().unwrap();
        assert_eq!(s.runs[0], [[-6.0, -12.0], [6.0, 12.0]]);
        // Only the two helper lines are new
        assert_eq!(c.compile_count(), compiled + 2);

        c.mouse_move(3.0);
        c.draw();
        assert_eq!(c.compile_count(), compiled + 2);

        assert!(c.update_secant(0, 0, 1.0));
        assert!(!c.update_secant(0, 1, 1.0));
        assert!(c.update_derivative(0, 0.0));
        assert!(!c.update_derivative(1, 0.0));
    }

    #[test]
    fn pan_reuses_cache() {
        let mut c = chart(r#"{ "data": [{ "fn": "sin(x)" }] }"#);
        c.draw();
        c.set_domain([0.0, 1.0], [-1.0, 1.0]).unwrap();
        let out = c.draw().remove(0).unwrap();
        assert_eq!(c.compile_count(), 1);
        let Sampled::Interval(IntervalSamples::Cells(s)) = out.samples else {
            panic!("expected cells");
        };
        assert_eq!(s.cells[0].unwrap().x.lower(), 0.0);
    }
}
