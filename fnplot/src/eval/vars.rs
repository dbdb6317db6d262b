//! Variable bindings for evaluation
use std::collections::BTreeMap;

/// User-provided mapping from variable name to numeric value
pub type Scope = BTreeMap<String, f64>;

/// Values bound to variable names for a single evaluation
///
/// Bindings are built by merging a [`Scope`] with per-call overrides; the
/// overrides always win on a key collision.
///
/// ```
/// # use fnplot::eval::{Bindings, Scope};
/// let mut scope = Scope::new();
/// scope.insert("a".to_owned(), 1.0);
/// scope.insert("x".to_owned(), 2.0);
/// let b = Bindings::<f64>::merged(&scope, [("x", 3.0)]);
/// assert_eq!(b.get("a"), Some(1.0));
/// assert_eq!(b.get("x"), Some(3.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Bindings<T>(BTreeMap<String, T>);

impl<T> Default for Bindings<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: Copy> Bindings<T> {
    /// Builds an empty set of bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds bindings from a scope, then applies `overrides` on top
    pub fn merged<'a, I>(scope: &Scope, overrides: I) -> Self
    where
        T: From<f64>,
        I: IntoIterator<Item = (&'a str, T)>,
    {
        let mut out: Self =
            Self(scope.iter().map(|(k, v)| (k.clone(), T::from(*v))).collect());
        for (k, v) in overrides {
            out.set(k, v);
        }
        out
    }

    /// Looks up a value by name
    pub fn get(&self, name: &str) -> Option<T> {
        self.0.get(name).copied()
    }

    /// Binds a value, replacing any previous value with the same name
    pub fn set(&mut self, name: &str, v: T) {
        match self.0.get_mut(name) {
            Some(prev) => *prev = v,
            None => {
                self.0.insert(name.to_owned(), v);
            }
        }
    }

    /// Iterates over `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Interval;

    #[test]
    fn overrides_win() {
        let mut scope = Scope::new();
        scope.insert("x".to_owned(), 1.0);
        scope.insert("m".to_owned(), 2.0);
        let b = Bindings::<Interval>::merged(
            &scope,
            [("x", Interval::new(-1.0, 1.0))],
        );
        assert_eq!(b.get("x"), Some(Interval::new(-1.0, 1.0)));
        assert_eq!(b.get("m"), Some(Interval::new(2.0, 2.0)));
        assert_eq!(b.get("y"), None);
        assert_eq!(b.iter().count(), 2);
    }

    #[test]
    fn scope_untouched() {
        let mut scope = Scope::new();
        scope.insert("x".to_owned(), 1.0);
        let mut b = Bindings::<f64>::merged(&scope, []);
        b.set("x", 5.0);
        assert_eq!(scope["x"], 1.0);
        assert_eq!(b.get("x"), Some(5.0));
    }
}
