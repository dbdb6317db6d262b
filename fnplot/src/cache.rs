//! Memoized compilation of datum expressions
use crate::{
    Error, Expression,
    eval::{Backend, Bindings, Compiled, Evaluator, Rounding, Scope},
};
use std::collections::HashMap;

/// Identity of a datum within a chart
///
/// Helper lines (derivative and secants) are separate data with their own
/// cache entries, owned by the datum that produced them.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum DatumId {
    /// Index into the chart's `data`
    Data(usize),
    /// Tangent line of the datum at the given index
    Derivative(usize),
    /// Secant line `(datum index, secant index)`
    Secant(usize, usize),
}

impl std::fmt::Display for DatumId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatumId::Data(i) => write!(f, "data[{i}]"),
            DatumId::Derivative(i) => write!(f, "data[{i}].derivative"),
            DatumId::Secant(i, j) => write!(f, "data[{i}].secants[{j}]"),
        }
    }
}

/// Cached compilation of one property
#[derive(Debug)]
struct CompiledEntry<T> {
    /// The expression which produced `compiled`
    source: Expression,
    compiled: Compiled<T>,
}

/// Per-backend cache of compiled expressions
///
/// Entries are keyed by datum and property name (e.g. `"fn"`, `"x"`,
/// `"r"`).  An entry is recompiled only when the expression for its key
/// changes; changing the scope never triggers recompilation.
///
/// ```
/// # use fnplot::{cache::{DatumId, ExpressionCache}, eval::Scope, Expression};
/// let mut cache = ExpressionCache::<f64>::new();
/// let id = DatumId::Data(0);
/// let expr = Expression::from("x + a");
/// let mut scope = Scope::new();
/// scope.insert("a".to_owned(), 1.0);
///
/// let v = cache.evaluate(id, "fn", &expr, &scope, [("x", 2.0)]).unwrap();
/// assert_eq!(v, 3.0);
/// scope.insert("a".to_owned(), 10.0);
/// let v = cache.evaluate(id, "fn", &expr, &scope, [("x", 2.0)]).unwrap();
/// assert_eq!(v, 12.0);
/// assert_eq!(cache.compile_count(), 1);
/// ```
#[derive(Debug)]
pub struct ExpressionCache<T> {
    entries: HashMap<DatumId, HashMap<String, CompiledEntry<T>>>,
    compile_count: usize,
    rounding: Rounding,
}

impl<T> Default for ExpressionCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            compile_count: 0,
            rounding: Rounding::default(),
        }
    }
}

impl<T: Backend> ExpressionCache<T> {
    /// Builds an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rounding policy used by evaluators from this cache
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Returns the number of times that an expression has been compiled
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Returns the compiled form of `expr`, compiling it if the cached entry
    /// for `(datum, property)` came from a different source
    ///
    /// A failed compilation leaves no entry behind.
    pub fn compile(
        &mut self,
        datum: DatumId,
        property: &str,
        expr: &Expression,
    ) -> Result<Compiled<T>, Error> {
        let props = self.entries.entry(datum).or_default();
        if let Some(e) = props.get(property) {
            if e.source.same_source(expr) {
                return Ok(e.compiled.clone());
            }
        }
        props.remove(property);
        log::debug!(
            "compiling {datum}.{property} ({} backend, {})",
            T::NAME,
            expr.kind()
        );
        self.compile_count += 1;
        let compiled = Compiled::new(expr)?;
        props.insert(
            property.to_owned(),
            CompiledEntry {
                source: expr.clone(),
                compiled: compiled.clone(),
            },
        );
        Ok(compiled)
    }

    /// Returns an evaluator for `expr`, using the cached compilation
    pub fn evaluator(
        &mut self,
        datum: DatumId,
        property: &str,
        expr: &Expression,
    ) -> Result<Evaluator<T>, Error> {
        let compiled = self.compile(datum, property, expr)?;
        Ok(Evaluator::new(compiled).with_rounding(self.rounding))
    }

    /// Evaluates `expr` once, with `overrides` applied on top of `scope`
    pub fn evaluate<'a, I>(
        &mut self,
        datum: DatumId,
        property: &str,
        expr: &Expression,
        scope: &Scope,
        overrides: I,
    ) -> Result<T, Error>
    where
        I: IntoIterator<Item = (&'a str, T)>,
    {
        let mut eval = self.evaluator(datum, property, expr)?;
        eval.eval(&Bindings::merged(scope, overrides))
    }

    /// Drops every entry belonging to the given datum
    pub fn forget(&mut self, datum: DatumId) {
        self.entries.remove(&datum);
    }

    /// Drops every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of cached entries
    pub fn len(&self) -> usize {
        self.entries.values().map(|p| p.len()).sum()
    }

    /// Checks whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{context::Tree, types::Interval};

    #[test]
    fn recompile_on_change() {
        let mut cache = ExpressionCache::<Interval>::new();
        let id = DatumId::Data(0);
        let scope = Scope::new();
        let x = [("x", Interval::new(1.0, 2.0))];

        let a = Expression::from("x + 1");
        let v = cache.evaluate(id, "fn", &a, &scope, x).unwrap();
        assert_eq!(v, Interval::new(2.0, 3.0));
        cache.evaluate(id, "fn", &a, &scope, x).unwrap();
        assert_eq!(cache.compile_count(), 1);

        // Same text, different allocation
        let a2 = Expression::from(String::from("x + 1"));
        cache.evaluate(id, "fn", &a2, &scope, x).unwrap();
        assert_eq!(cache.compile_count(), 1);

        let b = Expression::from("x * 2");
        let v = cache.evaluate(id, "fn", &b, &scope, x).unwrap();
        assert_eq!(v, Interval::new(2.0, 4.0));
        assert_eq!(cache.compile_count(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_independent() {
        let mut cache = ExpressionCache::<f64>::new();
        let e = Expression::from("x");
        cache.compile(DatumId::Data(0), "fn", &e).unwrap();
        cache.compile(DatumId::Data(1), "fn", &e).unwrap();
        cache.compile(DatumId::Data(0), "x", &e).unwrap();
        assert_eq!(cache.compile_count(), 3);
        assert_eq!(cache.len(), 3);

        cache.forget(DatumId::Data(0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn tree_identity() {
        let mut cache = ExpressionCache::<f64>::new();
        let t = Tree::x().square();
        let e = Expression::from(t.clone());
        cache.compile(DatumId::Data(0), "fn", &e).unwrap();
        cache.compile(DatumId::Data(0), "fn", &Expression::from(t)).unwrap();
        assert_eq!(cache.compile_count(), 1);
        cache
            .compile(DatumId::Data(0), "fn", &Expression::from(Tree::x().square()))
            .unwrap();
        assert_eq!(cache.compile_count(), 2);
    }

    #[test]
    fn invalid_kind() {
        let mut cache = ExpressionCache::<f64>::new();
        let e = Expression::Unsupported("a number");
        assert_eq!(
            cache.compile(DatumId::Data(0), "fn", &e).unwrap_err(),
            Error::InvalidExpressionKind("a number")
        );
        assert!(cache.is_empty());

        let e = Expression::interval(|_| Interval::WHOLE);
        assert_eq!(
            cache.compile(DatumId::Data(0), "fn", &e).unwrap_err(),
            Error::InvalidExpressionKind("an interval function")
        );
    }

    #[test]
    fn parse_error_is_not_cached() {
        let mut cache = ExpressionCache::<f64>::new();
        let e = Expression::from("x +");
        assert!(cache.compile(DatumId::Data(0), "fn", &e).is_err());
        assert!(cache.compile(DatumId::Data(0), "fn", &e).is_err());
        assert_eq!(cache.compile_count(), 2);
    }
}
