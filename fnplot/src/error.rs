//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `fnplot`
///
/// Structural and configuration problems are reported here; numeric
/// indeterminacy (empty or whole intervals) is never an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Node is not present in this `Context`
    #[error("node is not present in this `Context`")]
    BadNode,

    /// Variable is missing in the evaluation scope
    #[error("variable `{0}` is missing in the evaluation scope")]
    MissingVar(String),

    /// The expression can't be compiled by the requested backend
    #[error("expression must be a string or a function (got {0})")]
    InvalidExpressionKind(&'static str),

    /// Axis domain is inverted, degenerate, or non-finite
    #[error("the pair defining the {axis}-domain is inverted: [{lo}, {hi}]")]
    InvertedDomain {
        /// Axis name (`x` or `y`)
        axis: char,
        /// Lower bound
        lo: f64,
        /// Upper bound
        hi: f64,
    },

    /// Log-scaled axis with a domain that touches or crosses zero
    #[error("log axis requires a positive domain, got [{lo}, {hi}]")]
    NonPositiveLogDomain {
        /// Lower bound
        lo: f64,
        /// Upper bound
        hi: f64,
    },

    /// The sampler doesn't know how to handle this kind of function
    #[error("{fn_type} is not supported in the `{sampler}` sampler")]
    UnsupportedFnType {
        /// Name of the function type
        fn_type: String,
        /// Name of the sampler
        sampler: &'static str,
    },

    /// The expression evaluated to a non-finite value
    #[error("expression is undefined at {0}")]
    UndefinedAtPoint(f64),

    /// Too few sample points to form a single cell
    #[error("at least two samples are required, got {0}")]
    BadSampleCount(usize),

    /// Quad-tree resolution must be positive and finite
    #[error("resolution must be positive and finite, got {0}")]
    BadResolution(f64),

    /// A secant line was requested without a starting position
    #[error("secant must have the property `x0` defined")]
    MissingSecantOrigin,

    /// Unexpected token while parsing an expression
    #[error("unexpected token `{token}` at offset {offset}")]
    UnexpectedToken {
        /// Text of the token
        token: String,
        /// Byte offset into the source
        offset: usize,
    },

    /// Expression ended before it was complete
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Function name is not known to the parser
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    /// Function was called with the wrong number of arguments
    #[error("function `{name}` expects {expected} argument(s), got {got}")]
    BadArity {
        /// Function name
        name: String,
        /// Expected argument count
        expected: usize,
        /// Actual argument count
        got: usize,
    },
}
