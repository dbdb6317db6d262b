//! Description of a single plotted function
use crate::{Error, Expression, eval::Scope};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of function described by a [`Datum`]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum FnType {
    /// `y = f(x)`
    Linear,
    /// `x = x(t)`, `y = y(t)`
    Parametric,
    /// `r = r(theta)`
    Polar,
    /// `f(x, y) = 0`
    Implicit,
    /// Explicit list of points
    Points,
    /// Single arrow from `offset`
    Vector,
}

/// How a [`Datum`] is rendered
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GraphType {
    /// Rectangles from interval samples
    Interval,
    /// Connected line through point samples
    Polyline,
    /// Disconnected point samples
    Scatter,
}

/// Which sampler evaluates a [`Datum`]
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString,
)]
pub enum SamplerName {
    /// Interval arithmetic
    #[strum(serialize = "interval")]
    Interval,
    /// Point evaluation
    #[strum(serialize = "builtIn")]
    BuiltIn,
}

/// Tangent line drawn at `x0`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivativeOptions {
    /// Derivative of the datum's function, `f'(x)`
    #[serde(rename = "fn")]
    pub func: Expression,
    /// Point of tangency; the line is omitted if this is missing
    #[serde(default)]
    pub x0: Option<f64>,
    /// Follow the pointer (see [`Chart::update_derivative`])
    ///
    /// [`Chart::update_derivative`]: crate::chart::Chart::update_derivative
    #[serde(default)]
    pub update_on_mouse_move: bool,
}

/// Secant line between `x0` and `x1`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecantOptions {
    /// Starting position (required unless `fn` is given)
    pub x0: Option<f64>,
    /// Ending position, defaulting to infinity
    pub x1: Option<f64>,
    /// Extra variables for the secant line
    pub scope: Scope,
    /// Replaces the computed line, if present
    #[serde(rename = "fn")]
    pub func: Option<Expression>,
    /// Follow the pointer (see [`Chart::update_secant`])
    ///
    /// [`Chart::update_secant`]: crate::chart::Chart::update_secant
    pub update_on_mouse_move: bool,
}

/// A single function (or set of points) to plot
///
/// Field names match the JSON options (`fnType`, `nSamples`, ...).  Kinds are
/// kept as text and parsed on use, so that an unknown kind is reported for
/// this datum alone.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Datum {
    /// Main expression (`y = f(x)` or `f(x, y) = 0`)
    #[serde(rename = "fn")]
    pub func: Option<Expression>,
    /// `linear` (default), `parametric`, `polar`, `implicit`, `points`, or
    /// `vector`
    pub fn_type: Option<String>,
    /// `interval`, `polyline`, or `scatter`
    pub graph_type: Option<String>,
    /// `interval` or `builtIn`
    pub sampler: Option<String>,
    /// Constants available to every expression of this datum
    pub scope: Scope,
    /// Restricts the sampled domain (or the parameter range for parametric
    /// and polar functions)
    pub range: Option<[f64; 2]>,
    /// Number of sample points
    pub n_samples: Option<usize>,
    /// Fill the area between the function and `y = 0`
    pub closed: bool,
    /// Disable clamping of point samples to the visible range
    pub skip_bounds_check: bool,
    /// `x(t)` for parametric functions
    pub x: Option<Expression>,
    /// `y(t)` for parametric functions
    pub y: Option<Expression>,
    /// `r(theta)` for polar functions
    pub r: Option<Expression>,
    /// Points for `fnType: points`
    pub points: Vec<[f64; 2]>,
    /// Direction for `fnType: vector`
    pub vector: Option<[f64; 2]>,
    /// Origin for `fnType: vector`
    pub offset: Option<[f64; 2]>,
    /// Optional tangent line
    pub derivative: Option<DerivativeOptions>,
    /// Optional secant lines
    pub secants: Vec<SecantOptions>,
}

impl Datum {
    /// Builds a `linear` datum from the given expression
    pub fn new<E: Into<Expression>>(func: E) -> Self {
        Self {
            func: Some(func.into()),
            ..Self::default()
        }
    }

    /// Builds an `implicit` datum from the given expression
    pub fn implicit<E: Into<Expression>>(func: E) -> Self {
        Self {
            func: Some(func.into()),
            fn_type: Some(FnType::Implicit.to_string()),
            ..Self::default()
        }
    }

    /// Returns the function type, defaulting to [`FnType::Linear`]
    pub fn fn_type(&self) -> Result<FnType, Error> {
        match &self.fn_type {
            None => Ok(FnType::Linear),
            Some(s) => FnType::from_str(s).map_err(|_| Error::UnsupportedFnType {
                fn_type: s.clone(),
                sampler: "datum",
            }),
        }
    }

    /// Returns the graph type
    ///
    /// `points` default to `scatter`, `vector` to `polyline`, everything
    /// else to `interval`.
    pub fn graph_type(&self) -> Result<GraphType, Error> {
        match &self.graph_type {
            None => Ok(match self.fn_type()? {
                FnType::Points => GraphType::Scatter,
                FnType::Vector => GraphType::Polyline,
                _ => GraphType::Interval,
            }),
            Some(s) => GraphType::from_str(s).map_err(|_| {
                Error::UnsupportedFnType {
                    fn_type: s.clone(),
                    sampler: "graph",
                }
            }),
        }
    }

    /// Returns the sampler, which defaults to `interval` for interval graphs
    /// and `builtIn` for everything else
    pub fn sampler(&self) -> Result<SamplerName, Error> {
        match &self.sampler {
            None => Ok(match self.graph_type()? {
                GraphType::Interval => SamplerName::Interval,
                GraphType::Polyline | GraphType::Scatter => SamplerName::BuiltIn,
            }),
            Some(s) => SamplerName::from_str(s).map_err(|_| {
                Error::UnsupportedFnType {
                    fn_type: s.clone(),
                    sampler: "datum",
                }
            }),
        }
    }

    /// Returns the main expression, or an error if it's missing
    pub fn func(&self) -> Result<&Expression, Error> {
        self.func
            .as_ref()
            .ok_or(Error::InvalidExpressionKind("undefined"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let d: Datum = serde_json::from_str(r#"{ "fn": "x^2" }"#).unwrap();
        assert_eq!(d.fn_type().unwrap(), FnType::Linear);
        assert_eq!(d.graph_type().unwrap(), GraphType::Interval);
        assert_eq!(d.sampler().unwrap(), SamplerName::Interval);
        assert!(!d.closed);
        assert!(d.scope.is_empty());

        let d: Datum = serde_json::from_str(
            r#"{ "fnType": "points", "points": [[0, 1], [2, 3]] }"#,
        )
        .unwrap();
        assert_eq!(d.graph_type().unwrap(), GraphType::Scatter);
        assert_eq!(d.sampler().unwrap(), SamplerName::BuiltIn);
        assert_eq!(d.points, [[0.0, 1.0], [2.0, 3.0]]);
    }

    #[test]
    fn camel_case() {
        let d: Datum = serde_json::from_str(
            r#"{
                "fn": "1/x",
                "graphType": "polyline",
                "nSamples": 100,
                "skipBoundsCheck": true,
                "scope": { "a": 2 },
                "derivative": { "fn": "-1/x^2", "x0": 1, "updateOnMouseMove": true },
                "secants": [{ "x0": 1, "x1": 2 }]
            }"#,
        )
        .unwrap();
        assert_eq!(d.n_samples, Some(100));
        assert!(d.skip_bounds_check);
        assert_eq!(d.scope["a"], 2.0);
        assert_eq!(d.sampler().unwrap(), SamplerName::BuiltIn);
        let deriv = d.derivative.unwrap();
        assert_eq!(deriv.x0, Some(1.0));
        assert!(deriv.update_on_mouse_move);
        assert_eq!(d.secants[0].x1, Some(2.0));
    }

    #[test]
    fn unknown_kinds() {
        let d: Datum =
            serde_json::from_str(r#"{ "fn": "x", "fnType": "spiral" }"#).unwrap();
        assert!(matches!(
            d.fn_type(),
            Err(Error::UnsupportedFnType { fn_type, .. }) if fn_type == "spiral"
        ));
        let d: Datum =
            serde_json::from_str(r#"{ "fn": "x", "sampler": "magic" }"#).unwrap();
        assert!(d.sampler().is_err());
    }

    #[test]
    fn sampler_names() {
        assert_eq!(SamplerName::from_str("builtIn").unwrap(), SamplerName::BuiltIn);
        assert_eq!(SamplerName::BuiltIn.to_string(), "builtIn");
        assert_eq!(FnType::Implicit.to_string(), "implicit");
    }
}
