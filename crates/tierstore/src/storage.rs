//! Secondary-store interface and reference implementation
//!
//! The cache layer consults a [`Storage`] on every miss. The store is the
//! authoritative data source; the cache never writes through to it.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

use crate::error::{Error, Result};

/// Backing data source consulted on cache misses.
///
/// Implementations may be arbitrarily slow and may fail; the cache layer
/// performs no retries and propagates errors unchanged to its caller.
pub trait Storage<K, V> {
    /// Fetch the value for `key`.
    ///
    /// # Returns
    /// * `Result<V>` - The stored value, or an implementation-defined error
    fn get(&self, key: &K) -> Result<V>;
}

/// In-memory reference store backed by a hash map.
///
/// Stands in for the "low speed" storage tier in tests, benchmarks, and
/// examples. Lookups clone the stored value.
#[derive(Debug)]
pub struct MapStore<K, V> {
    entries: HashMap<K, V, RandomState>,
}

impl<K, V> MapStore<K, V>
where
    K: Hash + Eq,
{
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Load a value into the store
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    /// Number of values in the store
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for MapStore<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V> for MapStore<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    fn get(&self, key: &K) -> Result<V> {
        self.entries.get(key).cloned().ok_or(Error::NotFound)
    }
}

impl<K, V, S> Storage<K, V> for &S
where
    S: Storage<K, V>,
{
    fn get(&self, key: &K) -> Result<V> {
        (**self).get(key)
    }
}
