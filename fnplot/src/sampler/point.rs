//! Point sampler (`builtIn`), producing polylines
use super::View;
use crate::{
    Error, Expression,
    cache::{DatumId, ExpressionCache},
    datum::{Datum, FnType},
    eval::{Bindings, Evaluator},
    scale::linspace,
};
use serde::Serialize;
use std::f64::consts::{PI, TAU};

/// Output of the point sampler
///
/// Each run is a connected sequence of `[x, y]` points; runs are broken
/// wherever the function is undefined.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PointSamples {
    /// Connected runs of points
    pub runs: Vec<Vec<[f64; 2]>>,
}

impl PointSamples {
    /// Returns the total number of points
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.len()).sum()
    }

    /// Checks whether there are no points
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulates points into runs, clamping `y` if requested
struct Runs {
    runs: Vec<Vec<[f64; 2]>>,
    current: Vec<[f64; 2]>,
    clamp: Option<[f64; 2]>,
}

impl Runs {
    fn new(clamp: Option<[f64; 2]>) -> Self {
        Self {
            runs: vec![],
            current: vec![],
            clamp,
        }
    }

    fn push(&mut self, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            self.split();
            return;
        }
        let y = match self.clamp {
            Some([lo, hi]) => y.clamp(lo, hi),
            None => y,
        };
        self.current.push([x, y]);
    }

    fn split(&mut self) {
        if !self.current.is_empty() {
            self.runs.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> PointSamples {
        self.split();
        PointSamples { runs: self.runs }
    }
}

/// Returns the `y` range one pixel beyond the visible area
fn clamp_range(view: &View) -> [f64; 2] {
    let [r0, r1] = view.y.range();
    let a = view.y.invert(r0.min(r1) - 1.0);
    let b = view.y.invert(r0.max(r1) + 1.0);
    [a.min(b), a.max(b)]
}

fn required(e: &Option<Expression>) -> Result<&Expression, Error> {
    e.as_ref().ok_or(Error::InvalidExpressionKind("undefined"))
}

/// Evaluates a single property of a datum across a set of parameter values
fn eval_all(
    eval: &mut Evaluator<f64>,
    vars: &mut Bindings<f64>,
    name: &str,
    ts: &[f64],
) -> Result<Vec<f64>, Error> {
    ts.iter()
        .map(|&t| {
            vars.set(name, t);
            eval.eval(vars)
        })
        .collect()
}

/// Samples a datum at discrete points
///
/// - `linear` functions are evaluated at `n` points across `range`, spaced to
///   match the x axis
/// - `parametric` functions evaluate `x(t)` and `y(t)` across the datum's
///   own range (default `[-2π, 2π]`)
/// - `polar` functions evaluate `r(theta)` across the datum's own range
///   (default `[-π, π]`)
/// - `points` and `vector` are returned as-is
///
/// Unless the datum sets `skipBoundsCheck`, `y` values are clamped to one
/// pixel beyond the visible area.
pub fn sample(
    cache: &mut ExpressionCache<f64>,
    id: DatumId,
    datum: &Datum,
    view: &View,
    range: [f64; 2],
    n: usize,
) -> Result<PointSamples, Error> {
    let clamp = (!datum.skip_bounds_check).then(|| clamp_range(view));
    let mut out = Runs::new(clamp);
    let mut vars = Bindings::<f64>::merged(&datum.scope, []);
    match datum.fn_type()? {
        FnType::Linear => {
            let mut eval = cache.evaluator(id, "fn", datum.func()?)?;
            let xs = view.x.space(range, n);
            let ys = eval_all(&mut eval, &mut vars, "x", &xs)?;
            for (x, y) in xs.into_iter().zip(ys) {
                out.push(x, y);
            }
        }
        FnType::Parametric => {
            let [lo, hi] = datum.range.unwrap_or([-TAU, TAU]);
            let ts = linspace(lo, hi, n);
            let mut fx = cache.evaluator(id, "x", required(&datum.x)?)?;
            let mut fy = cache.evaluator(id, "y", required(&datum.y)?)?;
            let xs = eval_all(&mut fx, &mut vars, "t", &ts)?;
            let ys = eval_all(&mut fy, &mut vars, "t", &ts)?;
            for (x, y) in xs.into_iter().zip(ys) {
                out.push(x, y);
            }
        }
        FnType::Polar => {
            let [lo, hi] = datum.range.unwrap_or([-PI, PI]);
            let thetas = linspace(lo, hi, n);
            let mut fr = cache.evaluator(id, "r", required(&datum.r)?)?;
            let rs = eval_all(&mut fr, &mut vars, "theta", &thetas)?;
            for (theta, r) in thetas.into_iter().zip(rs) {
                out.push(r * theta.cos(), r * theta.sin());
            }
        }
        FnType::Points => {
            for &[x, y] in &datum.points {
                out.push(x, y);
            }
        }
        FnType::Vector => {
            if let Some([dx, dy]) = datum.vector {
                let [x, y] = datum.offset.unwrap_or([0.0, 0.0]);
                out.push(x, y);
                out.push(x + dx, y + dy);
            }
        }
        t @ FnType::Implicit => {
            return Err(Error::UnsupportedFnType {
                fn_type: t.to_string(),
                sampler: "builtIn",
            });
        }
    }
    let out = out.finish();
    log::trace!("{id}: {} points in {} runs", out.len(), out.runs.len());
    Ok(out)
}
