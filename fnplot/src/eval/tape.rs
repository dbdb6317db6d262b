//! Straight-line representation of an expression graph
use crate::{
    Error,
    context::{BinaryOpcode, Context, Node, Op, UnaryOpcode},
};
use std::collections::HashMap;

/// Single instruction in a [`Tape`]
///
/// Each instruction writes to the slot matching its position in the tape;
/// arguments refer to earlier slots.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TapeOp {
    /// Reads the input at the given index in [`Tape::vars`]
    Input(u32),
    Const(f64),
    Unary(UnaryOpcode, u32),
    Binary(BinaryOpcode, u32, u32),
}

/// Flattened expression, in evaluation order
///
/// The final instruction produces the result.
#[derive(Clone, Debug)]
pub struct Tape {
    ops: Vec<TapeOp>,
    vars: Vec<String>,
}

impl Tape {
    /// Flattens the subgraph rooted at `root`
    pub fn new(ctx: &Context, root: Node) -> Result<Self, Error> {
        // Depth-first recursion on the heap, to protect against stack overflows
        enum Action {
            Down,
            Up,
        }

        let mut slots: HashMap<Node, u32> = HashMap::new();
        let mut var_index: HashMap<String, u32> = HashMap::new();
        let mut vars = vec![];
        let mut ops = vec![];

        let mut todo = vec![(Action::Down, root)];
        while let Some((action, node)) = todo.pop() {
            let op = ctx.get_op(node).ok_or(Error::BadNode)?;
            match action {
                Action::Down => {
                    if slots.contains_key(&node) {
                        continue;
                    }
                    todo.push((Action::Up, node));
                    todo.extend(op.iter_children().map(|c| (Action::Down, c)));
                }
                Action::Up => {
                    if slots.contains_key(&node) {
                        continue;
                    }
                    let slot = |n: &Node| slots.get(n).copied().ok_or(Error::BadNode);
                    let t = match op {
                        Op::Var(v) => {
                            let name = ctx.get_var_by_index(*v)?;
                            let i = match var_index.get(name) {
                                Some(i) => *i,
                                None => {
                                    let i = vars.len() as u32;
                                    vars.push(name.to_owned());
                                    var_index.insert(name.to_owned(), i);
                                    i
                                }
                            };
                            TapeOp::Input(i)
                        }
                        Op::Const(c) => TapeOp::Const(c.0),
                        Op::Unary(op, a) => TapeOp::Unary(*op, slot(a)?),
                        Op::Binary(op, a, b) => {
                            TapeOp::Binary(*op, slot(a)?, slot(b)?)
                        }
                    };
                    slots.insert(node, ops.len() as u32);
                    ops.push(t);
                }
            }
        }
        Ok(Self { ops, vars })
    }

    /// Returns the number of instructions in the tape
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Checks whether the tape is empty (which should never happen)
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Names of the variables read by this tape, indexed by [`TapeOp::Input`]
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Iterates over instructions in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &TapeOp> {
        self.ops.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tape_order() {
        let mut ctx = Context::new();
        let x = ctx.x();
        let y = ctx.y();
        let x2 = ctx.square(x).unwrap();
        let s = ctx.add(x2, y).unwrap();
        let t = ctx.get_tape(s).unwrap();
        assert_eq!(t.len(), 4);
        assert_eq!(t.vars().len(), 2);
        // The last instruction produces the result
        assert!(matches!(
            t.iter().last(),
            Some(TapeOp::Binary(BinaryOpcode::Add, ..))
        ));
        for (i, op) in t.iter().enumerate() {
            match op {
                TapeOp::Unary(_, a) => assert!((*a as usize) < i),
                TapeOp::Binary(_, a, b) => {
                    assert!((*a as usize) < i);
                    assert!((*b as usize) < i);
                }
                _ => (),
            }
        }
    }

    #[test]
    fn tape_dedup() {
        let mut ctx = Context::new();
        let x = ctx.x();
        let x_squared = ctx.mul(x, x).unwrap();
        let tape = ctx.get_tape(x_squared).unwrap();
        assert_eq!(tape.len(), 2);
        assert_eq!(tape.vars(), ["x".to_owned()]);
    }

    #[test]
    fn tape_constant() {
        let mut ctx = Context::new();
        let c = ctx.constant(1.5);
        let tape = ctx.get_tape(c).unwrap();
        assert_eq!(tape.len(), 1);
        assert!(tape.vars().is_empty());
    }
}
