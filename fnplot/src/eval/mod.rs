//! Evaluation of compiled expressions
//!
//! An [`Expression`] is compiled once per backend into a [`Compiled`]
//! function, then evaluated many times through an [`Evaluator`] (which owns
//! reusable scratch memory).  There are two backends:
//!
//! - `f64`, for evaluation at a single point
//! - [`Interval`], for evaluation over a range of inputs
//!
//! ```
//! use fnplot::{Expression, eval::{Bindings, Compiled, Evaluator}, types::Interval};
//!
//! let expr = Expression::from("x^2 - 1");
//!
//! let f = Compiled::<f64>::new(&expr).unwrap();
//! let mut eval = Evaluator::new(f);
//! let mut vars = Bindings::new();
//! vars.set("x", 3.0);
//! assert_eq!(eval.eval(&vars).unwrap(), 8.0);
//!
//! let f = Compiled::<Interval>::new(&expr).unwrap();
//! let mut eval = Evaluator::new(f);
//! let mut vars = Bindings::new();
//! vars.set("x", Interval::new(-1.0, 2.0));
//! assert_eq!(eval.eval(&vars).unwrap(), Interval::new(-1.0, 3.0));
//! ```
use crate::{
    Error, Expression,
    context::{Context, Tree},
    types::Interval,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod math;
mod tape;
mod vars;

pub use math::EvalMath;
pub use tape::{Tape, TapeOp};
pub use vars::{Bindings, Scope};

/// Rounding policy for interval evaluation
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Rounding {
    /// Round-to-nearest; results are a best-effort enclosure
    #[default]
    Relaxed,
    /// Every intermediate bound is pushed outward by one ulp
    Outward,
}

/// Native function for a particular backend
pub type NativeFn<T> = Arc<dyn Fn(&Bindings<T>) -> T + Send + Sync>;

/// A type which can be used as an evaluation backend
pub trait Backend: EvalMath + Send + Sync + 'static {
    /// Name of the backend, used in logging and cache keys
    const NAME: &'static str;

    /// Returns the native function for this backend, if `expr` holds one
    fn native(expr: &Expression) -> Option<NativeFn<Self>>;
}

impl Backend for f64 {
    const NAME: &'static str = "builtIn";
    fn native(expr: &Expression) -> Option<NativeFn<Self>> {
        match expr {
            Expression::Point(f) => Some(f.clone()),
            _ => None,
        }
    }
}

impl Backend for Interval {
    const NAME: &'static str = "interval";
    fn native(expr: &Expression) -> Option<NativeFn<Self>> {
        match expr {
            Expression::Interval(f) => Some(f.clone()),
            _ => None,
        }
    }
}

/// Compiled form of an expression, specialized to a single backend
///
/// Cloning is cheap, because the inner data is reference-counted.
pub enum Compiled<T> {
    /// Flattened expression, interpreted by [`Evaluator`]
    Tape(Arc<Tape>),
    /// User-provided closure, called as-is
    Native(NativeFn<T>),
}

impl<T> Clone for Compiled<T> {
    fn clone(&self) -> Self {
        match self {
            Compiled::Tape(t) => Compiled::Tape(t.clone()),
            Compiled::Native(f) => Compiled::Native(f.clone()),
        }
    }
}

impl<T> std::fmt::Debug for Compiled<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compiled::Tape(t) => f.debug_tuple("Tape").field(&t.len()).finish(),
            Compiled::Native(..) => f.write_str("Native"),
        }
    }
}

impl<T: Backend> Compiled<T> {
    /// Compiles an expression for this backend
    ///
    /// Text is parsed; trees are used directly; closures are wrapped as-is
    /// if they were written for this backend.
    pub fn new(expr: &Expression) -> Result<Self, Error> {
        match expr {
            Expression::Text(s) => Self::from_tree(&Tree::parse(s)?),
            Expression::Tree(t) => Self::from_tree(t),
            Expression::Point(..) | Expression::Interval(..) => T::native(expr)
                .map(Compiled::Native)
                .ok_or(Error::InvalidExpressionKind(expr.kind())),
            Expression::Unsupported(kind) => {
                Err(Error::InvalidExpressionKind(kind))
            }
        }
    }

    /// Compiles a tree into a tape
    pub fn from_tree(t: &Tree) -> Result<Self, Error> {
        let mut ctx = Context::new();
        let root = ctx.import(t)?;
        Ok(Compiled::Tape(Arc::new(ctx.get_tape(root)?)))
    }
}

/// Evaluator for a [`Compiled`] function
///
/// The evaluator owns its scratch memory, so repeated calls don't allocate.
pub struct Evaluator<T> {
    compiled: Compiled<T>,
    rounding: Rounding,
    inputs: Vec<T>,
    slots: Vec<T>,
}

impl<T: EvalMath> Evaluator<T> {
    /// Builds a new evaluator with [`Rounding::Relaxed`]
    pub fn new(compiled: Compiled<T>) -> Self {
        Self {
            compiled,
            rounding: Rounding::default(),
            inputs: vec![],
            slots: vec![],
        }
    }

    /// Sets the rounding policy
    ///
    /// This only affects tapes; native functions are called unchanged.
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Evaluates the function with the given variables
    ///
    /// Returns [`Error::MissingVar`] if the expression reads a variable that
    /// isn't bound.
    pub fn eval(&mut self, vars: &Bindings<T>) -> Result<T, Error> {
        match &self.compiled {
            Compiled::Native(f) => Ok(f(vars)),
            Compiled::Tape(tape) => {
                self.inputs.clear();
                for name in tape.vars() {
                    let v = vars
                        .get(name)
                        .ok_or_else(|| Error::MissingVar(name.clone()))?;
                    self.inputs.push(v);
                }
                Ok(run(tape, &self.inputs, &mut self.slots, self.rounding))
            }
        }
    }
}

/// Interprets a tape with the given inputs
///
/// With [`Rounding::Outward`], only results which may have been rounded are
/// widened.  Inputs and constants are taken as exact, as are operations which
/// never round (`abs`, `floor`, `min`, ...) and operations on singletons whose
/// result is exactly representable.  This keeps integer exponents as
/// singletons, so `x^3` still accepts a negative base.
fn run<T: EvalMath>(
    tape: &Tape,
    inputs: &[T],
    slots: &mut Vec<T>,
    rounding: Rounding,
) -> T {
    slots.clear();
    for op in tape.iter() {
        let (v, exact) = match *op {
            TapeOp::Input(i) => (inputs[i as usize], true),
            TapeOp::Const(c) => (T::from(c), true),
            TapeOp::Unary(op, a) => {
                let a = slots[a as usize];
                let v = op.apply(a);
                let exact = op.is_exact()
                    || a.singleton()
                        .and_then(|a| op.fold(a))
                        .is_some_and(|f| v.singleton() == Some(f));
                (v, exact)
            }
            TapeOp::Binary(op, a, b) => {
                let (a, b) = (slots[a as usize], slots[b as usize]);
                let v = op.apply(a, b);
                let exact = op.is_exact()
                    || a.singleton()
                        .zip(b.singleton())
                        .and_then(|(a, b)| op.fold(a, b))
                        .is_some_and(|f| v.singleton() == Some(f));
                (v, exact)
            }
        };
        slots.push(match rounding {
            Rounding::Outward if !exact => v.round_outward(),
            _ => v,
        });
    }
    // Tapes always contain at least one instruction
    slots.last().copied().unwrap_or_else(|| T::from(f64::NAN))
}
