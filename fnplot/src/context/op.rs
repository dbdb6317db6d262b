use crate::context::{Node, VarNode};
use crate::eval::EvalMath;
use ordered_float::OrderedFloat;

/// A one-argument math operation
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum UnaryOpcode {
    Neg,
    Abs,
    Recip,
    Sqrt,
    Square,
    Exp,
    Ln,
    Log10,
    Log2,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Floor,
    Ceil,
    Sign,
}

impl UnaryOpcode {
    /// Applies the operation to a value
    pub fn apply<T: EvalMath>(self, a: T) -> T {
        match self {
            UnaryOpcode::Neg => -a,
            UnaryOpcode::Abs => a.abs(),
            UnaryOpcode::Recip => a.recip(),
            UnaryOpcode::Sqrt => a.sqrt(),
            UnaryOpcode::Square => a.square(),
            UnaryOpcode::Exp => a.exp(),
            UnaryOpcode::Ln => a.ln(),
            UnaryOpcode::Log10 => a.log10(),
            UnaryOpcode::Log2 => a.log2(),
            UnaryOpcode::Sin => a.sin(),
            UnaryOpcode::Cos => a.cos(),
            UnaryOpcode::Tan => a.tan(),
            UnaryOpcode::Asin => a.asin(),
            UnaryOpcode::Acos => a.acos(),
            UnaryOpcode::Atan => a.atan(),
            UnaryOpcode::Floor => a.floor(),
            UnaryOpcode::Ceil => a.ceil(),
            UnaryOpcode::Sign => a.sign(),
        }
    }

    /// Checks whether the operation never rounds its result
    pub fn is_exact(self) -> bool {
        matches!(
            self,
            UnaryOpcode::Neg
                | UnaryOpcode::Abs
                | UnaryOpcode::Floor
                | UnaryOpcode::Ceil
                | UnaryOpcode::Sign
        )
    }

    /// Applies the operation to a constant, returning a value only if the
    /// result is finite and exactly representable
    pub fn fold(self, a: f64) -> Option<f64> {
        let out = self.apply(a);
        let exact = self.is_exact()
            || match self {
                UnaryOpcode::Square => a.mul_add(a, -out) == 0.0,
                UnaryOpcode::Sqrt => out.mul_add(out, -a) == 0.0,
                UnaryOpcode::Recip => out.mul_add(a, -1.0) == 0.0,
                _ => false,
            };
        (exact && out.is_finite()).then_some(out)
    }
}

/// Rounding error of `s = a + b` (Knuth's two-sum)
fn sum_error(a: f64, b: f64, s: f64) -> f64 {
    let bb = s - a;
    (a - (s - bb)) + (b - bb)
}

/// A two-argument math operation
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum BinaryOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,
}

impl BinaryOpcode {
    /// Applies the operation to a pair of values
    pub fn apply<T: EvalMath>(self, a: T, b: T) -> T {
        match self {
            BinaryOpcode::Add => a + b,
            BinaryOpcode::Sub => a - b,
            BinaryOpcode::Mul => a * b,
            BinaryOpcode::Div => a / b,
            BinaryOpcode::Pow => a.pow(b),
            BinaryOpcode::Min => a.min(b),
            BinaryOpcode::Max => a.max(b),
        }
    }

    /// Checks whether the operands can be swapped without changing the result
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOpcode::Add
                | BinaryOpcode::Mul
                | BinaryOpcode::Min
                | BinaryOpcode::Max
        )
    }

    /// Checks whether the operation never rounds its result
    pub fn is_exact(self) -> bool {
        matches!(self, BinaryOpcode::Min | BinaryOpcode::Max)
    }

    /// Applies the operation to constants, returning a value only if the
    /// result is finite and exactly representable
    pub fn fold(self, a: f64, b: f64) -> Option<f64> {
        let out = self.apply(a, b);
        let exact = match self {
            BinaryOpcode::Min | BinaryOpcode::Max => true,
            BinaryOpcode::Add => sum_error(a, b, out) == 0.0,
            BinaryOpcode::Sub => sum_error(a, -b, out) == 0.0,
            BinaryOpcode::Mul => a.mul_add(b, -out) == 0.0,
            BinaryOpcode::Div => out.mul_add(b, -a) == 0.0,
            // Integer powers stay exact below 2^53
            BinaryOpcode::Pow => {
                a.fract() == 0.0
                    && b.fract() == 0.0
                    && b >= 0.0
                    && out.abs() < 9007199254740992.0
            }
        };
        (exact && out.is_finite()).then_some(out)
    }
}

/// Represents an operation in a math expression.
///
/// `Op`s should be constructed by calling functions on
/// [`Context`](crate::context::Context), e.g.
/// [`Context::add`](crate::context::Context::add) will generate an
/// `Op::Binary(BinaryOpcode::Add, .., ..)` node and return an opaque handle.
///
/// Each `Op` is tightly coupled to the [`Context`](crate::context::Context)
/// which generated it, and will not be valid for a different `Context`.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Op {
    Var(VarNode),
    Const(OrderedFloat<f64>),
    Binary(BinaryOpcode, Node, Node),
    Unary(UnaryOpcode, Node),
}

impl Op {
    /// Iterates over children, producing 0, 1, or 2 values
    pub fn iter_children(&self) -> impl Iterator<Item = Node> + use<> {
        let out = match self {
            Op::Binary(_, a, b) => [Some(*a), Some(*b)],
            Op::Unary(_, a) => [Some(*a), None],
            Op::Var(..) | Op::Const(..) => [None, None],
        };
        out.into_iter().flatten()
    }
}
