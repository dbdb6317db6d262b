//! Expression sources, before compilation
use crate::{
    context::Tree,
    eval::{Bindings, NativeFn},
    types::Interval,
};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::sync::Arc;

/// Source of a function to be plotted
///
/// An expression is immutable; it is compiled lazily by an
/// [`ExpressionCache`](crate::cache::ExpressionCache), which uses
/// [`Expression::same_source`] to decide whether a cached compilation is
/// still valid.
///
/// When deserialized, strings become [`Expression::Text`]; any other kind of
/// value is kept as [`Expression::Unsupported`] so that the error surfaces at
/// compile time for that datum alone.
#[derive(Clone)]
pub enum Expression {
    /// Text in infix notation, e.g. `"x^2 - 1"`
    Text(String),
    /// Pre-built expression tree, usable by every backend
    Tree(Tree),
    /// Native function for point evaluation
    Point(NativeFn<f64>),
    /// Native function for interval evaluation
    Interval(NativeFn<Interval>),
    /// A value that can't be compiled, tagged with a description of its kind
    Unsupported(&'static str),
}

impl Expression {
    /// Wraps a closure for point evaluation
    pub fn point<F>(f: F) -> Self
    where
        F: Fn(&Bindings<f64>) -> f64 + Send + Sync + 'static,
    {
        Expression::Point(Arc::new(f))
    }

    /// Wraps a closure for interval evaluation
    pub fn interval<F>(f: F) -> Self
    where
        F: Fn(&Bindings<Interval>) -> Interval + Send + Sync + 'static,
    {
        Expression::Interval(Arc::new(f))
    }

    /// Returns a short description of the expression's kind
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Text(..) => "a string",
            Expression::Tree(..) => "a tree",
            Expression::Point(..) => "a point function",
            Expression::Interval(..) => "an interval function",
            Expression::Unsupported(kind) => kind,
        }
    }

    /// Checks whether two expressions have the same source
    ///
    /// Text is compared by value; trees and closures are compared by
    /// identity.  Unsupported values never match, so they're re-reported on
    /// every use.
    pub fn same_source(&self, other: &Expression) -> bool {
        match (self, other) {
            (Expression::Text(a), Expression::Text(b)) => a == b,
            (Expression::Tree(a), Expression::Tree(b)) => a.ptr_eq(b),
            (Expression::Point(a), Expression::Point(b)) => Arc::ptr_eq(a, b),
            (Expression::Interval(a), Expression::Interval(b)) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Expression::Tree(t) => {
                f.debug_tuple("Tree").field(&t.as_ptr()).finish()
            }
            Expression::Point(..) => f.write_str("Point(..)"),
            Expression::Interval(..) => f.write_str("Interval(..)"),
            Expression::Unsupported(kind) => {
                f.debug_tuple("Unsupported").field(kind).finish()
            }
        }
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Expression::Text(s.to_owned())
    }
}

impl From<String> for Expression {
    fn from(s: String) -> Self {
        Expression::Text(s)
    }
}

impl From<Tree> for Expression {
    fn from(t: Tree) -> Self {
        Expression::Tree(t)
    }
}

struct ExpressionVisitor;

impl<'de> Visitor<'de> for ExpressionVisitor {
    type Value = Expression;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an expression")
    }
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Expression, E> {
        Ok(Expression::from(v))
    }
    fn visit_string<E: de::Error>(self, v: String) -> Result<Expression, E> {
        Ok(Expression::from(v))
    }
    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Expression, E> {
        Ok(Expression::Unsupported("a boolean"))
    }
    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<Expression, E> {
        Ok(Expression::Unsupported("a number"))
    }
    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<Expression, E> {
        Ok(Expression::Unsupported("a number"))
    }
    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Expression, E> {
        Ok(Expression::Unsupported("a number"))
    }
    fn visit_unit<E: de::Error>(self) -> Result<Expression, E> {
        Ok(Expression::Unsupported("null"))
    }
    fn visit_none<E: de::Error>(self) -> Result<Expression, E> {
        Ok(Expression::Unsupported("null"))
    }
    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> Result<Expression, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Expression::Unsupported("an array"))
    }
    fn visit_map<A: MapAccess<'de>>(
        self,
        mut map: A,
    ) -> Result<Expression, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Expression::Unsupported("an object"))
    }
}

impl<'de> serde::Deserialize<'de> for Expression {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ExpressionVisitor)
    }
}
