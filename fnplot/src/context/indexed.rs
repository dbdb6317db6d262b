//! Containers which hand out strongly-typed indexes
use std::collections::HashMap;
use std::hash::Hash;

/// Trait for an index type, which must be convertible to and from `usize`
pub trait Index: From<usize> + Into<usize> + Copy {}

/// Defines a strongly-typed index (newtype around `usize`)
macro_rules! define_index {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd,
        )]
        pub struct $name(usize);

        impl $name {
            /// Returns the inner index
            pub fn get(&self) -> usize {
                self.0
            }
        }
        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self(v)
            }
        }
        impl From<$name> for usize {
            fn from(v: $name) -> Self {
                v.0
            }
        }
        impl crate::context::indexed::Index for $name {}
    };
}
pub(crate) use define_index;

/// Deduplicating map from values to a tightly packed set of indexes
///
/// Inserting a value which is already present returns its existing index.
#[derive(Debug)]
pub struct IndexMap<V, I> {
    data: Vec<V>,
    map: HashMap<V, I>,
}

impl<V, I> Default for IndexMap<V, I> {
    fn default() -> Self {
        Self {
            data: vec![],
            map: HashMap::new(),
        }
    }
}

impl<V: Clone + Hash + Eq, I: Index> IndexMap<V, I> {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn get_by_index(&self, i: I) -> Option<&V> {
        self.data.get(i.into())
    }
    /// Inserts a value, returning its index (which may already exist)
    pub fn insert(&mut self, v: V) -> I {
        if let Some(i) = self.map.get(&v) {
            return *i;
        }
        let i = I::from(self.data.len());
        self.data.push(v.clone());
        self.map.insert(v, i);
        i
    }
}
