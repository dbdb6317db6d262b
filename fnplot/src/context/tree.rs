//! Context-free math trees
use super::op::{BinaryOpcode, UnaryOpcode};
use std::sync::Arc;

/// Opcode type for trees
///
/// This is equivalent to [`Op`](crate::context::Op), but refers to variables
/// by name instead of by handle.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum TreeOp {
    /// Named input variable
    Var(Arc<str>),
    Const(f64),
    Binary(BinaryOpcode, Arc<TreeOp>, Arc<TreeOp>),
    Unary(UnaryOpcode, Arc<TreeOp>),
}

impl Drop for TreeOp {
    fn drop(&mut self) {
        // Early exit for TreeOps which have limited recursion
        if self.iter_children().all(|c| c.does_not_recurse()) {
            return;
        }

        let mut todo = vec![std::mem::replace(self, TreeOp::Const(0.0))];
        let empty = Arc::new(TreeOp::Const(0.0));
        while let Some(mut t) = todo.pop() {
            for t in t.iter_children_mut() {
                let arg = std::mem::replace(t, empty.clone());
                todo.extend(Arc::into_inner(arg));
            }
            drop(t);
        }
    }
}

impl TreeOp {
    /// Returns `true` if the given node has no children
    fn does_not_recurse(&self) -> bool {
        matches!(self, TreeOp::Const(..) | TreeOp::Var(..))
    }

    pub(crate) fn iter_children(&self) -> impl Iterator<Item = &Arc<TreeOp>> {
        match self {
            TreeOp::Const(..) | TreeOp::Var(..) => [None, None],
            TreeOp::Unary(_op, arg) => [Some(arg), None],
            TreeOp::Binary(_op, lhs, rhs) => [Some(lhs), Some(rhs)],
        }
        .into_iter()
        .flatten()
    }

    fn iter_children_mut(&mut self) -> impl Iterator<Item = &mut Arc<TreeOp>> {
        match self {
            TreeOp::Const(..) | TreeOp::Var(..) => [None, None],
            TreeOp::Unary(_op, arg) => [Some(arg), None],
            TreeOp::Binary(_op, lhs, rhs) => [Some(lhs), Some(rhs)],
        }
        .into_iter()
        .flatten()
    }
}

impl From<f64> for Tree {
    fn from(v: f64) -> Tree {
        Tree::constant(v)
    }
}

impl From<i32> for Tree {
    fn from(v: i32) -> Tree {
        Tree::constant(v as f64)
    }
}

impl From<TreeOp> for Tree {
    fn from(t: TreeOp) -> Tree {
        Tree(Arc::new(t))
    }
}

/// Owned handle for a standalone math tree
///
/// Cloning a `Tree` is cheap (it's an `Arc` under the hood); clones share
/// identity, as checked by [`Tree::ptr_eq`].
#[derive(Clone, Debug)]
pub struct Tree(Arc<TreeOp>);

impl std::ops::Deref for Tree {
    type Target = TreeOp;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        // Heap recursion using a `Vec`, to avoid blowing up the stack
        let mut todo = vec![(&self.0, &other.0)];
        while let Some((a, b)) = todo.pop() {
            if Arc::as_ptr(a) == Arc::as_ptr(b) {
                continue;
            }
            match (a.as_ref(), b.as_ref()) {
                (TreeOp::Var(a), TreeOp::Var(b)) => {
                    if *a != *b {
                        return false;
                    }
                }
                (TreeOp::Const(a), TreeOp::Const(b)) => {
                    if a.to_bits() != b.to_bits() {
                        return false;
                    }
                }
                (TreeOp::Unary(op_a, arg_a), TreeOp::Unary(op_b, arg_b)) => {
                    if *op_a != *op_b {
                        return false;
                    }
                    todo.push((arg_a, arg_b));
                }
                (
                    TreeOp::Binary(op_a, lhs_a, rhs_a),
                    TreeOp::Binary(op_b, lhs_b, rhs_b),
                ) => {
                    if *op_a != *op_b {
                        return false;
                    }
                    todo.push((lhs_a, lhs_b));
                    todo.push((rhs_a, rhs_b));
                }
                _ => return false,
            }
        }
        true
    }
}
impl Eq for Tree {}

impl Tree {
    /// Returns a pointer to the inner [`TreeOp`]
    ///
    /// This can be used as a strong (but not unique) identity.
    pub fn as_ptr(&self) -> *const TreeOp {
        Arc::as_ptr(&self.0)
    }

    /// Shallow (pointer) equality check
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.as_ptr(), other.as_ptr())
    }

    /// Borrow the inner `Arc<TreeOp>`
    pub(crate) fn arc(&self) -> &Arc<TreeOp> {
        &self.0
    }

    /// Parses an expression from text
    ///
    /// See [`parse`](crate::context::parse) for the accepted grammar.
    pub fn parse(s: &str) -> Result<Tree, crate::Error> {
        super::parse::parse(s)
    }
}

impl std::str::FromStr for Tree {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// See [`Context`](crate::context::Context) for documentation of these functions
#[allow(missing_docs)]
impl Tree {
    pub fn x() -> Self {
        Self::var("x")
    }
    pub fn y() -> Self {
        Self::var("y")
    }
    pub fn var(name: &str) -> Self {
        Tree(Arc::new(TreeOp::Var(name.into())))
    }
    pub fn constant(f: f64) -> Self {
        Tree(Arc::new(TreeOp::Const(f)))
    }
    fn op_unary(a: Tree, op: UnaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Unary(op, a.0)))
    }
    fn op_binary(a: Tree, b: Tree, op: BinaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Binary(op, a.0, b.0)))
    }
    pub fn square(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Square)
    }
    pub fn floor(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Floor)
    }
    pub fn ceil(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Ceil)
    }
    pub fn sign(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sign)
    }
    pub fn sqrt(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sqrt)
    }
    pub fn max<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Max)
    }
    pub fn min<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Min)
    }
    pub fn pow<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Pow)
    }
    pub fn neg(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Neg)
    }
    pub fn recip(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Recip)
    }
    pub fn sin(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sin)
    }
    pub fn cos(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Cos)
    }
    pub fn tan(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Tan)
    }
    pub fn asin(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Asin)
    }
    pub fn acos(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Acos)
    }
    pub fn atan(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Atan)
    }
    pub fn exp(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Exp)
    }
    pub fn ln(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Ln)
    }
    pub fn log10(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Log10)
    }
    pub fn log2(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Log2)
    }
    pub fn abs(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Abs)
    }
}

macro_rules! impl_binary {
    ($op:ident, $op_assign:ident, $base_fn:ident, $assign_fn:ident) => {
        impl<A: Into<Tree>> std::ops::$op<A> for Tree {
            type Output = Self;

            fn $base_fn(self, other: A) -> Self {
                Self::op_binary(self, other.into(), BinaryOpcode::$op)
            }
        }
        impl<A: Into<Tree>> std::ops::$op_assign<A> for Tree {
            fn $assign_fn(&mut self, other: A) {
                use std::ops::$op;
                let mut next = self.clone().$base_fn(other.into());
                std::mem::swap(self, &mut next);
            }
        }
        impl std::ops::$op<Tree> for f64 {
            type Output = Tree;
            fn $base_fn(self, other: Tree) -> Tree {
                Tree::op_binary(self.into(), other, BinaryOpcode::$op)
            }
        }
    };
}

impl_binary!(Add, AddAssign, add, add_assign);
impl_binary!(Sub, SubAssign, sub, sub_assign);
impl_binary!(Mul, MulAssign, mul, mul_assign);
impl_binary!(Div, DivAssign, div, div_assign);

impl std::ops::Neg for Tree {
    type Output = Tree;
    fn neg(self) -> Self::Output {
        Tree::op_unary(self, UnaryOpcode::Neg)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Context;

    #[test]
    fn tree_eq() {
        let a = Tree::x() * 2.0 + Tree::y();
        let b = Tree::x() * 2.0 + Tree::y();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));

        let c = Tree::x() * 2.0 - Tree::y();
        assert_ne!(a, c);
        assert_ne!(Tree::var("t"), Tree::var("theta"));
    }

    #[test]
    fn tree_import() {
        let t = (Tree::x() + 1.0).square();
        let mut ctx = Context::new();
        let root = ctx.import(&t).unwrap();
        let tape = ctx.get_tape(root).unwrap();
        assert_eq!(tape.vars(), ["x"]);
        // x, 1, x + 1, (x + 1)²
        assert_eq!(tape.len(), 4);
    }

    #[test]
    fn deep_drop() {
        let mut t = Tree::x();
        for _ in 0..100_000 {
            t += 1.0;
        }
        drop(t);
    }
}
