//! Interval-arithmetic samplers
use super::{Cell, IntervalSamples, Region, Regions, SamplerKind, Samples, View};
use crate::{
    Error,
    cache::{DatumId, ExpressionCache},
    datum::Datum,
    eval::{Bindings, Evaluator, Scope},
    scale::{AxisType, Scale, check_domain},
    types::Interval,
};

/// Samples a 1D function over a range of `x` values
///
/// The range is split into `n - 1` adjacent cells (spaced to match the
/// x axis), and each cell is evaluated with interval arithmetic.
#[derive(Clone, Debug)]
pub struct RangeSampler {
    xs: Vec<f64>,
    y_view: [f64; 2],
    scaled_dx: f64,
}

impl RangeSampler {
    /// Builds a new sampler
    ///
    /// `range` is the part of the x axis to sample; `y_view` is the visible
    /// vertical domain, which bounds the extent of asymptotes.
    pub fn new(
        x_scale: &Scale,
        range: [f64; 2],
        y_view: [f64; 2],
        n: usize,
    ) -> Result<Self, Error> {
        check_domain('x', range)?;
        check_domain('y', y_view)?;
        if x_scale.kind() == AxisType::Log && range[0] <= 0.0 {
            return Err(Error::NonPositiveLogDomain {
                lo: range[0],
                hi: range[1],
            });
        }
        if n < 2 {
            return Err(Error::BadSampleCount(n));
        }
        let xs = x_scale.space(range, n);
        let scaled_dx = x_scale.map(xs[1]) - x_scale.map(xs[0]);
        Ok(Self {
            xs,
            y_view,
            scaled_dx,
        })
    }

    /// Evaluates `y = f(x)` across every cell
    ///
    /// Cells with an empty image are dropped; cells with an unbounded image
    /// become `None`, and neighbors on either side of a jump are stretched to
    /// the edge of the view.
    pub fn sample(
        &self,
        eval: &mut Evaluator<Interval>,
        scope: &Scope,
    ) -> Result<Samples, Error> {
        let mut vars = Bindings::<Interval>::merged(scope, []);
        let mut cells = Vec::with_capacity(self.xs.len() - 1);
        for w in self.xs.windows(2) {
            let x = Interval::new(w[0], w[1]);
            vars.set("x", x);
            let y = eval.eval(&vars)?;
            if y.is_whole() {
                cells.push(None);
            } else if !y.is_empty() {
                cells.push(Some(Cell { x, y }));
            }
        }
        self.repair_asymptotes(&mut cells);
        log::trace!(
            "sampled {} cells ({} defined)",
            self.xs.len() - 1,
            cells.iter().filter(|c| c.is_some()).count()
        );
        Ok(Samples {
            cells,
            scaled_dx: self.scaled_dx,
        })
    }

    fn repair_asymptotes(&self, cells: &mut [Option<Cell>]) {
        let [y_min, y_max] = self.y_view;
        for i in 1..cells.len().saturating_sub(1) {
            if cells[i].is_some() {
                continue;
            }
            let (Some(mut prev), Some(mut next)) = (cells[i - 1], cells[i + 1])
            else {
                continue;
            };
            if prev.y.overlaps(next.y) {
                continue;
            }
            if prev.y.lower() > next.y.upper() {
                prev.y.set_upper(y_max.max(prev.y.upper()));
                next.y.set_lower(y_min.min(next.y.lower()));
            }
            if prev.y.upper() < next.y.lower() {
                prev.y.set_lower(y_min.min(prev.y.lower()));
                next.y.set_upper(y_max.max(next.y.upper()));
            }
            cells[i - 1] = Some(prev);
            cells[i + 1] = Some(next);
        }
    }
}

/// Finds the rectangles where an implicit relation `f(x, y) = 0` may hold
///
/// The visible area is recursively split into quadrants; a quadrant is
/// discarded as soon as its interval image excludes zero, and kept as a leaf
/// once it's narrower than the resolution limit.
#[derive(Copy, Clone, Debug)]
pub struct QuadTreeSampler {
    x: Interval,
    y: Interval,
    rect_eps: f64,
}

impl QuadTreeSampler {
    /// Builds a new sampler over the given domains
    ///
    /// `rect_eps` is the width of a single pixel in function space.
    pub fn new(
        x_domain: [f64; 2],
        y_domain: [f64; 2],
        rect_eps: f64,
    ) -> Result<Self, Error> {
        check_domain('x', x_domain)?;
        check_domain('y', y_domain)?;
        if !(rect_eps > 0.0 && rect_eps.is_finite()) {
            return Err(Error::BadResolution(rect_eps));
        }
        Ok(Self {
            x: x_domain.into(),
            y: y_domain.into(),
            rect_eps,
        })
    }

    /// Subdivides the visible area, returning the surviving leaves
    pub fn sample(
        &self,
        eval: &mut Evaluator<Interval>,
        scope: &Scope,
    ) -> Result<Regions, Error> {
        let mut vars = Bindings::<Interval>::merged(scope, []);
        let mut regions = vec![];
        let mut todo = vec![(self.x, self.y)];
        let mut evals = 0usize;
        while let Some((x, y)) = todo.pop() {
            vars.set("x", x);
            vars.set("y", y);
            evals += 1;
            if !eval.eval(&vars)?.zero_in() {
                continue;
            }
            let mid_x = x.midpoint();
            let mid_y = y.midpoint();
            // Stop at the resolution limit, or when floats can't split further
            if x.width() < self.rect_eps
                || mid_x <= x.lower()
                || mid_x >= x.upper()
            {
                regions.push(Region { x, y });
                continue;
            }
            let east = Interval::new(mid_x, x.upper());
            let west = Interval::new(x.lower(), mid_x);
            let north = Interval::new(mid_y, y.upper());
            let south = Interval::new(y.lower(), mid_y);

            // Popped in reverse: NE, SE, NW, SW
            todo.push((west, south));
            todo.push((west, north));
            todo.push((east, south));
            todo.push((east, north));
        }
        log::trace!("quad-tree: {evals} evaluations, {} leaves", regions.len());
        Ok(Regions {
            regions,
            scaled_dx: 1.0,
        })
    }
}

/// Samples a datum with the interval sampler
///
/// `linear` functions are sampled across `range` with `n` points; `implicit`
/// relations are subdivided down to a single horizontal pixel.  Any other
/// function type is rejected.
pub fn sample(
    cache: &mut ExpressionCache<Interval>,
    id: DatumId,
    datum: &Datum,
    view: &View,
    range: [f64; 2],
    n: usize,
) -> Result<IntervalSamples, Error> {
    let kind = SamplerKind::try_from(datum.fn_type()?)?;
    let mut eval = cache.evaluator(id, "fn", datum.func()?)?;
    match kind {
        SamplerKind::OneDimensional => {
            let s = RangeSampler::new(&view.x, range, view.y.domain(), n)?;
            s.sample(&mut eval, &datum.scope).map(IntervalSamples::Cells)
        }
        SamplerKind::Implicit => {
            let rect_eps = (view.x.invert(1.0) - view.x.invert(0.0)).abs();
            let s = QuadTreeSampler::new(
                view.x.domain(),
                view.y.domain(),
                rect_eps,
            )?;
            s.sample(&mut eval, &datum.scope)
                .map(IntervalSamples::Regions)
        }
    }
}
