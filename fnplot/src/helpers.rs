//! Tangent and secant lines attached to a datum
//!
//! Both helpers evaluate the datum at one or two points, then return a new
//! `polyline` datum for the straight line `m * (x - x0) + y0`; the line's
//! parameters live in its scope, so moving the line never recompiles it.
use crate::{
    Error, Expression,
    cache::{DatumId, ExpressionCache},
    datum::{Datum, GraphType, SecantOptions},
    eval::Scope,
};

/// Expression shared by every helper line
const LINE: &str = "m * (x - x0) + y0";

fn line(scope: Scope, func: Option<Expression>) -> Datum {
    Datum {
        func: Some(func.unwrap_or_else(|| Expression::from(LINE))),
        graph_type: Some(GraphType::Polyline.to_string()),
        scope,
        n_samples: Some(2),
        skip_bounds_check: true,
        ..Datum::default()
    }
}

fn finite(v: f64, at: f64) -> Result<f64, Error> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(Error::UndefinedAtPoint(at))
    }
}

/// Evaluates the main expression of datum `index` at `x`
fn eval_at(
    cache: &mut ExpressionCache<f64>,
    index: usize,
    datum: &Datum,
    x: f64,
) -> Result<f64, Error> {
    let v = cache.evaluate(
        DatumId::Data(index),
        "fn",
        datum.func()?,
        &datum.scope,
        [("x", x)],
    )?;
    finite(v, x)
}

/// Builds the tangent line of datum `index`
///
/// Returns `Ok(None)` if the datum has no `derivative`.  If `x0` is missing,
/// the tangent point is at infinity, which usually makes the line undefined.
///
/// # Errors
/// [`Error::UndefinedAtPoint`] if either the function or its derivative is
/// non-finite at `x0`; callers should omit the line.
pub fn derivative_line(
    cache: &mut ExpressionCache<f64>,
    index: usize,
    datum: &Datum,
) -> Result<Option<Datum>, Error> {
    let Some(d) = &datum.derivative else {
        return Ok(None);
    };
    let x0 = d.x0.unwrap_or(f64::INFINITY);
    let m = cache.evaluate(
        DatumId::Data(index),
        "derivative.fn",
        &d.func,
        &datum.scope,
        [("x", x0)],
    )?;
    let m = finite(m, x0)?;
    let y0 = eval_at(cache, index, datum, x0)?;

    let scope = Scope::from([
        ("m".to_owned(), m),
        ("x0".to_owned(), x0),
        ("y0".to_owned(), y0),
    ]);
    Ok(Some(line(scope, None)))
}

/// Builds a secant line of datum `index`
///
/// The secant's own `scope` is extended with `x0`, `x1`, `y0`, `y1` and the
/// slope `m`.  A secant which provides its own `fn` is drawn as given, with
/// its own `scope` and without evaluating the datum.
///
/// # Errors
/// [`Error::MissingSecantOrigin`] if the secant has neither `fn` nor `x0`;
/// [`Error::UndefinedAtPoint`] if the function is non-finite at either end or
/// the slope can't be computed.
pub fn secant_line(
    cache: &mut ExpressionCache<f64>,
    index: usize,
    datum: &Datum,
    s: &SecantOptions,
) -> Result<Datum, Error> {
    if s.func.is_some() {
        return Ok(line(s.scope.clone(), s.func.clone()));
    }
    let x0 = s.x0.ok_or(Error::MissingSecantOrigin)?;
    let x1 = s.x1.unwrap_or(f64::INFINITY);
    let y0 = eval_at(cache, index, datum, x0)?;
    let y1 = eval_at(cache, index, datum, x1)?;
    let m = finite((y1 - y0) / (x1 - x0), x1)?;

    let mut scope = s.scope.clone();
    for (k, v) in [("x0", x0), ("x1", x1), ("y0", y0), ("y1", y1), ("m", m)] {
        scope.insert(k.to_owned(), v);
    }
    Ok(line(scope, s.func.clone()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datum::DerivativeOptions;

    fn parabola() -> Datum {
        let mut d = Datum::new("x^2");
        d.derivative = Some(DerivativeOptions {
            func: Expression::from("2 * x"),
            x0: Some(1.0),
            update_on_mouse_move: false,
        });
        d.secants = vec![SecantOptions {
            x0: Some(1.0),
            x1: Some(3.0),
            ..SecantOptions::default()
        }];
        d
    }

    #[test]
    fn tangent() {
        let mut cache = ExpressionCache::new();
        let d = parabola();
        let t = derivative_line(&mut cache, 0, &d).unwrap().unwrap();
        assert_eq!(t.scope["m"], 2.0);
        assert_eq!(t.scope["x0"], 1.0);
        assert_eq!(t.scope["y0"], 1.0);
        assert_eq!(t.n_samples, Some(2));
        assert!(t.skip_bounds_check);
        assert_eq!(t.graph_type().unwrap(), GraphType::Polyline);

        let f = t.func().unwrap();
        let v = cache
            .evaluate(DatumId::Derivative(0), "fn", f, &t.scope, [("x", 3.0)])
            .unwrap();
        assert_eq!(v, 5.0);
    }

    #[test]
    fn tangent_at_infinity() {
        let mut cache = ExpressionCache::new();
        let mut d = parabola();
        if let Some(deriv) = &mut d.derivative {
            deriv.x0 = None;
        }
        assert_eq!(
            derivative_line(&mut cache, 0, &d).unwrap_err(),
            Error::UndefinedAtPoint(f64::INFINITY)
        );
        let plain = Datum::new("x");
        assert!(derivative_line(&mut cache, 0, &plain).unwrap().is_none());
    }

    #[test]
    fn secant() {
        let mut cache = ExpressionCache::new();
        let d = parabola();
        let s = secant_line(&mut cache, 0, &d, &d.secants[0]).unwrap();
        assert_eq!(s.scope["y0"], 1.0);
        assert_eq!(s.scope["y1"], 9.0);
        assert_eq!(s.scope["m"], 4.0);
        assert!(matches!(&s.func, Some(Expression::Text(t)) if t == LINE));
    }

    #[test]
    fn secant_errors() {
        let mut cache = ExpressionCache::new();
        let mut d = parabola();
        d.secants[0].x0 = None;
        assert_eq!(
            secant_line(&mut cache, 0, &d, &d.secants[0]).unwrap_err(),
            Error::MissingSecantOrigin
        );

        let mut d = Datum::new("1 / x");
        d.secants = vec![SecantOptions {
            x0: Some(0.0),
            x1: Some(1.0),
            ..SecantOptions::default()
        }];
        assert_eq!(
            secant_line(&mut cache, 0, &d, &d.secants[0]).unwrap_err(),
            Error::UndefinedAtPoint(0.0)
        );
    }

    #[test]
    fn secant_with_its_own_fn() {
        let mut cache = ExpressionCache::new();
        // The datum itself is never evaluated
        let mut d = Datum::new("1 / x");
        d.secants = vec![SecantOptions {
            func: Some(Expression::from("x + 1")),
            scope: Scope::from([("k".to_owned(), 7.0)]),
            ..SecantOptions::default()
        }];
        let s = secant_line(&mut cache, 0, &d, &d.secants[0]).unwrap();
        assert!(matches!(&s.func, Some(Expression::Text(t)) if t == "x + 1"));
        assert_eq!(s.scope, Scope::from([("k".to_owned(), 7.0)]));
        assert_eq!(s.graph_type().unwrap(), GraphType::Polyline);

        d.secants[0].x0 = Some(0.0);
        let s = secant_line(&mut cache, 0, &d, &d.secants[0]).unwrap();
        assert!(!s.scope.contains_key("y0"));
        assert_eq!(cache.compile_count(), 0);
    }

    #[test]
    fn scope_is_passed_through() {
        let mut cache = ExpressionCache::new();
        let mut d = Datum::new("a * x");
        d.scope.insert("a".to_owned(), 3.0);
        d.secants = vec![SecantOptions {
            x0: Some(0.0),
            x1: Some(2.0),
            scope: Scope::from([("k".to_owned(), 7.0)]),
            ..SecantOptions::default()
        }];
        let s = secant_line(&mut cache, 0, &d, &d.secants[0]).unwrap();
        assert_eq!(s.scope["m"], 3.0);
        assert_eq!(s.scope["k"], 7.0);
    }
}
