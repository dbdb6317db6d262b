//! Infrastructure for representing math expressions as graphs
//!
//! There are two ways to build an expression:
//! - A [`Tree`] is a standalone, reference-counted expression.  It is built
//!   with operator overloading or parsed from text with [`Tree::parse`].
//! - A [`Context`] is an arena which deduplicates operations.  Trees are
//!   imported into a `Context` with [`Context::import`], then flattened into a
//!   [`Tape`](crate::eval::Tape) for evaluation.
mod indexed;
mod op;
pub mod parse;
mod tree;

use indexed::{IndexMap, define_index};
pub use op::{BinaryOpcode, Op, UnaryOpcode};
pub use tree::{Tree, TreeOp};

use crate::{Error, eval::Tape};

use std::collections::HashMap;

use ordered_float::OrderedFloat;

define_index!(Node, "An index in the `Context::ops` map");
define_index!(VarNode, "An index in the `Context::vars` map");

/// A `Context` holds a set of deduplicated constants, variables, and
/// operations.
///
/// It should be used like an arena allocator: it grows over time, then frees
/// all of its contents when dropped.
#[derive(Debug, Default)]
pub struct Context {
    ops: IndexMap<Op, Node>,
    vars: IndexMap<String, VarNode>,
}

impl Context {
    /// Build a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of [`Op`] nodes in the context
    ///
    /// ```
    /// # use fnplot::context::Context;
    /// let mut ctx = Context::new();
    /// let x = ctx.x();
    /// assert_eq!(ctx.len(), 1);
    /// let y = ctx.y();
    /// assert_eq!(ctx.len(), 2);
    /// ctx.add(x, y).unwrap();
    /// assert_eq!(ctx.len(), 3);
    /// ```
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Checks whether the context is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Checks whether the given [`Node`] is valid in this context
    fn check_node(&self, node: Node) -> Result<(), Error> {
        self.get_op(node).ok_or(Error::BadNode).map(|_| ())
    }

    /// Looks up the constant associated with the given node.
    ///
    /// If the node is invalid for this tree, returns an error; if the node is
    /// not a constant, returns `Ok(None)`.
    pub fn const_value(&self, n: Node) -> Result<Option<f64>, Error> {
        match self.get_op(n) {
            Some(Op::Const(c)) => Ok(Some(c.0)),
            Some(_) => Ok(None),
            _ => Err(Error::BadNode),
        }
    }

    /// Looks up the variable name associated with the given `VarNode`
    pub fn get_var_by_index(&self, n: VarNode) -> Result<&str, Error> {
        match self.vars.get_by_index(n) {
            Some(c) => Ok(c),
            None => Err(Error::BadNode),
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Primitives
    /// Constructs or finds a variable node named `x`
    /// ```
    /// # use fnplot::context::Context;
    /// let mut ctx = Context::new();
    /// let x = ctx.x();
    /// assert_eq!(x, ctx.var("x"));
    /// ```
    pub fn x(&mut self) -> Node {
        self.var("x")
    }

    /// Constructs or finds a variable node named `y`
    pub fn y(&mut self) -> Node {
        self.var("y")
    }

    /// Returns a variable with the provided name.
    ///
    /// If a variable already exists with this name, then it is returned.
    pub fn var(&mut self, name: &str) -> Node {
        let v = self.vars.insert(String::from(name));
        self.ops.insert(Op::Var(v))
    }

    /// Returns a node representing the given constant value.
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let v = ctx.constant(3.0);
    /// assert_eq!(ctx.const_value(v).unwrap(), Some(3.0));
    /// ```
    pub fn constant(&mut self, f: f64) -> Node {
        self.ops.insert(Op::Const(OrderedFloat(f)))
    }

    ////////////////////////////////////////////////////////////////////////////
    // Helper functions to create nodes with constant folding
    /// Find or create a [Node] for the given unary operation, with constant
    /// folding.
    ///
    /// Folding only happens when the result is finite and exact, so interval
    /// evaluation sees the same rounding as it would without folding.
    fn op_unary(&mut self, a: Node, op: UnaryOpcode) -> Result<Node, Error> {
        if let Some(out) = self.const_value(a)?.and_then(|v| op.fold(v)) {
            return Ok(self.constant(out));
        }
        Ok(self.ops.insert(Op::Unary(op, a)))
    }

    /// Find or create a [Node] for the given binary operation, with constant
    /// folding.
    fn op_binary(
        &mut self,
        a: Node,
        b: Node,
        op: BinaryOpcode,
    ) -> Result<Node, Error> {
        if let (Some(va), Some(vb)) = (self.const_value(a)?, self.const_value(b)?)
        {
            if let Some(out) = op.fold(va, vb) {
                return Ok(self.constant(out));
            }
        }
        let (a, b) = if op.is_commutative() {
            (a.min(b), a.max(b))
        } else {
            (a, b)
        };
        Ok(self.ops.insert(Op::Binary(op, a, b)))
    }

    /// Builds an addition node
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let x = ctx.x();
    /// assert_eq!(ctx.add(x, 0.0).unwrap(), x);
    /// let sum = ctx.add(2.0, 3.0).unwrap();
    /// assert_eq!(ctx.const_value(sum).unwrap(), Some(5.0));
    /// ```
    pub fn add<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a: Node = a.into_node(self)?;
        let b: Node = b.into_node(self)?;
        match (self.const_value(a)?, self.const_value(b)?) {
            (Some(zero), _) if zero == 0.0 => Ok(b),
            (_, Some(zero)) if zero == 0.0 => Ok(a),
            _ => self.op_binary(a, b, BinaryOpcode::Add),
        }
    }

    /// Builds a multiplication node
    ///
    /// Multiplying a node by itself produces a `square` node.
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let x = ctx.x();
    /// let a = ctx.mul(x, 5.0).unwrap();
    /// let b = ctx.mul(5.0, x).unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(ctx.mul(x, x).unwrap(), ctx.square(x).unwrap());
    /// ```
    pub fn mul<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        if a == b {
            self.square(a)
        } else {
            match (self.const_value(a)?, self.const_value(b)?) {
                (Some(one), _) if one == 1.0 => Ok(b),
                (_, Some(one)) if one == 1.0 => Ok(a),
                _ => self.op_binary(a, b, BinaryOpcode::Mul),
            }
        }
    }

    /// Builds a subtraction node
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let x = ctx.x();
    /// let a = ctx.sub(x, 2.0).unwrap();
    /// let b = ctx.sub(2.0, x).unwrap();
    /// assert_ne!(a, b);
    /// assert_eq!(ctx.sub(x, 0.0).unwrap(), x);
    /// ```
    pub fn sub<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        match (self.const_value(a)?, self.const_value(b)?) {
            (Some(zero), _) if zero == 0.0 => self.neg(b),
            (_, Some(zero)) if zero == 0.0 => Ok(a),
            _ => self.op_binary(a, b, BinaryOpcode::Sub),
        }
    }

    /// Builds a division node
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let x = ctx.x();
    /// let y = ctx.y();
    /// let op = ctx.div(x, y).unwrap();
    /// assert_ne!(op, ctx.div(y, x).unwrap());
    ///
    /// // Inexact quotients are left for the evaluator
    /// let third = ctx.div(1.0, 3.0).unwrap();
    /// assert_eq!(ctx.const_value(third).unwrap(), None);
    /// ```
    pub fn div<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        match self.const_value(b)? {
            Some(one) if one == 1.0 => Ok(a),
            _ => self.op_binary(a, b, BinaryOpcode::Div),
        }
    }

    /// Builds a power node
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let x = ctx.x();
    /// assert_eq!(ctx.pow(x, 1.0).unwrap(), x);
    /// assert_eq!(ctx.pow(x, 2.0).unwrap(), ctx.square(x).unwrap());
    /// ```
    pub fn pow<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        match self.const_value(b)? {
            Some(one) if one == 1.0 => Ok(a),
            Some(two) if two == 2.0 => self.square(a),
            _ => self.op_binary(a, b, BinaryOpcode::Pow),
        }
    }

    /// Builds a `min` node
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let x = ctx.x();
    /// assert_eq!(ctx.min(x, x).unwrap(), x);
    /// let m = ctx.min(2.0, 5.0).unwrap();
    /// assert_eq!(ctx.const_value(m).unwrap(), Some(2.0));
    /// ```
    pub fn min<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        if a == b {
            Ok(a)
        } else {
            self.op_binary(a, b, BinaryOpcode::Min)
        }
    }

    /// Builds a `max` node
    pub fn max<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        if a == b {
            Ok(a)
        } else {
            self.op_binary(a, b, BinaryOpcode::Max)
        }
    }

    /// Builds a unary operation node
    ///
    /// Negation of a negation is collapsed.
    /// ```
    /// # use fnplot::context::{Context, UnaryOpcode};
    /// let mut ctx = Context::new();
    /// let x = ctx.x();
    /// let n = ctx.unary(x, UnaryOpcode::Neg).unwrap();
    /// assert_eq!(ctx.unary(n, UnaryOpcode::Neg).unwrap(), x);
    /// ```
    pub fn unary<A: IntoNode>(
        &mut self,
        a: A,
        op: UnaryOpcode,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        if let (UnaryOpcode::Neg, Some(Op::Unary(UnaryOpcode::Neg, inner))) =
            (op, self.get_op(a))
        {
            return Ok(*inner);
        }
        self.op_unary(a, op)
    }

    /// Builds a binary operation node, dispatching to the specialized
    /// builders (which apply simplifications)
    pub fn binary<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
        op: BinaryOpcode,
    ) -> Result<Node, Error> {
        match op {
            BinaryOpcode::Add => self.add(a, b),
            BinaryOpcode::Sub => self.sub(a, b),
            BinaryOpcode::Mul => self.mul(a, b),
            BinaryOpcode::Div => self.div(a, b),
            BinaryOpcode::Pow => self.pow(a, b),
            BinaryOpcode::Min => self.min(a, b),
            BinaryOpcode::Max => self.max(a, b),
        }
    }

    /// Builds a negation node
    pub fn neg<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        self.unary(a, UnaryOpcode::Neg)
    }

    /// Builds a square node
    /// ```
    /// # let mut ctx = fnplot::context::Context::new();
    /// let x = ctx.x();
    /// let op = ctx.square(x).unwrap();
    /// assert!(matches!(ctx.get_op(op), Some(fnplot::context::Op::Unary(..))));
    /// ```
    pub fn square<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        self.unary(a, UnaryOpcode::Square)
    }

    /// Builds a square-root node
    pub fn sqrt<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        self.unary(a, UnaryOpcode::Sqrt)
    }

    ////////////////////////////////////////////////////////////////////////////

    /// Imports a standalone [`Tree`] into the context
    ///
    /// Shared subtrees (by pointer) are only visited once, and equivalent
    /// operations are deduplicated.
    /// ```
    /// # use fnplot::context::{Context, Tree};
    /// let t = Tree::x().square() + Tree::y().square();
    /// let mut ctx = Context::new();
    /// let root = ctx.import(&t).unwrap();
    /// // x, y, x², y², sum
    /// assert_eq!(ctx.len(), 5);
    /// assert_eq!(ctx.get_tape(root).unwrap().len(), 5);
    /// ```
    pub fn import(&mut self, tree: &Tree) -> Result<Node, Error> {
        // Depth-first recursion on the heap, to protect against stack overflows
        enum Action<'a> {
            Down(&'a std::sync::Arc<TreeOp>),
            Up(&'a std::sync::Arc<TreeOp>),
        }

        let mut done: HashMap<*const TreeOp, Node> = HashMap::new();
        let mut todo = vec![Action::Down(tree.arc())];
        while let Some(action) = todo.pop() {
            match action {
                Action::Down(t) => {
                    if done.contains_key(&std::sync::Arc::as_ptr(t)) {
                        continue;
                    }
                    todo.push(Action::Up(t));
                    todo.extend(t.iter_children().map(Action::Down));
                }
                Action::Up(t) => {
                    let key = std::sync::Arc::as_ptr(t);
                    if done.contains_key(&key) {
                        continue;
                    }
                    let child = |c: &std::sync::Arc<TreeOp>| {
                        done.get(&std::sync::Arc::as_ptr(c))
                            .copied()
                            .ok_or(Error::BadNode)
                    };
                    let node = match t.as_ref() {
                        TreeOp::Var(name) => self.var(name),
                        TreeOp::Const(c) => self.constant(*c),
                        TreeOp::Unary(op, arg) => {
                            let a = child(arg)?;
                            self.unary(a, *op)?
                        }
                        TreeOp::Binary(op, lhs, rhs) => {
                            let a = child(lhs)?;
                            let b = child(rhs)?;
                            self.binary(a, b, *op)?
                        }
                    };
                    done.insert(key, node);
                }
            }
        }
        done.get(&tree.as_ptr()).copied().ok_or(Error::BadNode)
    }

    /// Flattens a subtree of the graph into straight-line code.
    ///
    /// This should always succeed unless the `root` is from a different
    /// `Context`, in which case `Error::BadNode` will be returned.
    pub fn get_tape(&self, root: Node) -> Result<Tape, Error> {
        Tape::new(self, root)
    }

    /// Looks up an operation by `Node` handle
    pub fn get_op(&self, node: Node) -> Option<&Op> {
        self.ops.get_by_index(node)
    }
}

////////////////////////////////////////////////////////////////////////////////
/// Helper trait for things that can be converted into a
/// [`Node`] given a [`Context`].
///
/// This trait allows you to write
/// ```
/// # let mut ctx = fnplot::context::Context::new();
/// let x = ctx.x();
/// let sum = ctx.add(x, 1.0).unwrap();
/// ```
/// instead of the more verbose
/// ```
/// # let mut ctx = fnplot::context::Context::new();
/// let x = ctx.x();
/// let num = ctx.constant(1.0);
/// let sum = ctx.add(x, num).unwrap();
/// ```
pub trait IntoNode {
    /// Converts the given values into a node
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error>;
}

impl IntoNode for Node {
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error> {
        ctx.check_node(self)?;
        Ok(self)
    }
}

impl IntoNode for f64 {
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error> {
        Ok(ctx.constant(self))
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        eval::{Bindings, Compiled, Evaluator, EvalMath},
        types::Interval,
    };
    use std::sync::Arc;

    fn eval<T: EvalMath>(
        ctx: &Context,
        root: Node,
        vars: &[(&str, T)],
    ) -> Result<T, Error> {
        let tape = Arc::new(ctx.get_tape(root)?);
        let mut b = Bindings::new();
        for (k, v) in vars {
            b.set(k, *v);
        }
        Evaluator::new(Compiled::Tape(tape)).eval(&b)
    }

    // This can't be in a doctest, because it uses a private function
    #[test]
    fn test_get_op() {
        let mut ctx = Context::new();
        let x = ctx.x();
        let op_x = ctx.get_op(x).unwrap();
        assert!(matches!(op_x, Op::Var(_)));
    }

    #[test]
    fn test_dedup() {
        let mut ctx = Context::new();
        let x1 = ctx.x();
        let x2 = ctx.var("x");
        assert_eq!(x1, x2);

        let a = ctx.add(x1, 1.0).unwrap();
        let b = ctx.add(1.0, x2).unwrap();
        assert_eq!(a, b);

        let c = ctx.sub(x1, 1.0).unwrap();
        let d = ctx.sub(1.0, x1).unwrap();
        assert_ne!(c, d);
    }

    #[test]
    fn test_constant_folding() {
        let mut ctx = Context::new();
        let a = ctx.constant(2.0);
        let b = ctx.add(a, 3.0).unwrap();
        assert_eq!(ctx.const_value(b).unwrap(), Some(5.0));

        let s = ctx.sqrt(4.0).unwrap();
        assert_eq!(ctx.const_value(s).unwrap(), Some(2.0));
        let n = ctx.neg(3.0).unwrap();
        assert_eq!(ctx.const_value(n).unwrap(), Some(-3.0));
        let q = ctx.div(1.0, 4.0).unwrap();
        assert_eq!(ctx.const_value(q).unwrap(), Some(0.25));
        let p = ctx.pow(-2.0, 3.0).unwrap();
        assert_eq!(ctx.const_value(p).unwrap(), Some(-8.0));

        // Non-finite results are left as operations
        let n = ctx.sqrt(-1.0).unwrap();
        assert_eq!(ctx.const_value(n).unwrap(), None);
        let d = ctx.div(1.0, 0.0).unwrap();
        assert_eq!(ctx.const_value(d).unwrap(), None);
        let v = eval::<Interval>(&ctx, d, &[]).unwrap();
        assert!(v.is_whole());
    }

    #[test]
    fn test_inexact_constants_are_kept() {
        let mut ctx = Context::new();
        for n in [
            ctx.mul(0.1, 3.0).unwrap(),
            ctx.add(0.1, 0.2).unwrap(),
            ctx.div(1.0, 3.0).unwrap(),
            ctx.sqrt(2.0).unwrap(),
            ctx.unary(1.0, UnaryOpcode::Exp).unwrap(),
        ] {
            assert_eq!(ctx.const_value(n).unwrap(), None);
        }

        // The interval result still encloses the rounded-to-nearest value
        let n = ctx.mul(0.1, 3.0).unwrap();
        let i = eval::<Interval>(&ctx, n, &[]).unwrap();
        assert!(i.contains(0.1 * 3.0));
    }

    #[test]
    fn test_double_neg() {
        let mut ctx = Context::new();
        let x = ctx.x();
        let n = ctx.neg(x).unwrap();
        let nn = ctx.neg(n).unwrap();
        assert_eq!(nn, x);
    }

    #[test]
    fn test_missing_var() {
        let mut ctx = Context::new();
        let a = ctx.var("a");
        let x = ctx.x();
        let s = ctx.add(a, x).unwrap();
        assert_eq!(
            eval(&ctx, s, &[("x", 1.0), ("y", 2.0)]),
            Err(Error::MissingVar("a".to_owned()))
        );
        assert_eq!(eval(&ctx, s, &[("x", 1.0), ("a", 2.0)]), Ok(3.0));
    }

    #[test]
    fn test_import_shared() {
        let x = Tree::x();
        let s = x.square();
        let t = s.clone() + s.clone() * 2.0;
        let mut ctx = Context::new();
        let root = ctx.import(&t).unwrap();
        // x, x², 2, 2·x², sum
        assert_eq!(ctx.len(), 5);
        assert_eq!(eval(&ctx, root, &[("x", 2.0)]).unwrap(), 12.0);
    }

    #[test]
    fn test_bad_node() {
        let mut a = Context::new();
        let b = Context::new();
        let x = a.x();
        assert!(b.get_tape(x).is_err());
        assert!(b.const_value(x).is_err());
        assert!(b.check_node(x).is_err());
    }
}
