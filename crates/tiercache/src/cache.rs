//! TierCache: LRU cache layered over a secondary store
//!
//! On a hit the value comes straight out of the LRU engine. On a miss the
//! secondary store is consulted, its answer cached, and the least-recently
//! used entry evicted if the cache was full. Store errors propagate
//! unchanged and cache nothing.

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;
use tierstore::{Result, Storage};

use crate::lru::LruEngine;
use crate::stats::CacheStats;

/// Fixed-capacity LRU cache in front of a slower [`Storage`].
///
/// The engine itself is single-threaded; the lock only exists so the facade
/// can expose a `&self` API. Every lookup mutates recency order, so even
/// `get` takes the write side.
pub struct TierCache<K, V, S> {
    /// Authoritative backing store, consulted on misses only
    store: S,

    /// LRU engine for hot data
    cache: RwLock<LruEngine<K, V>>,

    /// Hit/miss accounting
    stats: CacheStats,

    /// Cache capacity
    capacity: usize,
}

impl<K, V, S> TierCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: Storage<K, V>,
{
    /// Create a cache of the given capacity in front of `store`
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(store: S, capacity: usize) -> Self {
        Self {
            store,
            cache: RwLock::new(LruEngine::new(capacity)),
            stats: CacheStats::new(),
            capacity,
        }
    }

    /// Get a value from the cache, falling back to the secondary store.
    ///
    /// A miss fetches from the store, caches the answer, and returns it;
    /// the fetched value is cached whatever it is, so a store that answers
    /// `Ok(None)` for absent keys (with `V = Option<T>`) gets that `None`
    /// cached too. A store error propagates unchanged and caches nothing.
    pub fn get(&self, key: &K) -> Result<V> {
        // Try cache first
        {
            let mut cache = self.cache.write();
            if let Some(value) = cache.get(key) {
                self.stats.record_hit();
                return Ok(value.clone());
            }
        }

        // Cache miss - fetch from the secondary store
        self.stats.record_miss();
        let value = self.store.get(key)?;

        let mut cache = self.cache.write();
        if cache.insert(key.clone(), value.clone()).is_some() {
            self.stats.record_eviction();
        }
        self.stats.record_insert();

        Ok(value)
    }

    /// Pre-populate the cache directly, bypassing the secondary store.
    ///
    /// There is no write path through the store; this only seeds the cache
    /// (inserting at the most-recently-used position, evicting if full).
    pub fn put(&self, key: K, value: V) {
        let mut cache = self.cache.write();
        if cache.insert(key, value).is_some() {
            self.stats.record_eviction();
        }
        self.stats.record_insert();
    }

    /// Check whether a key is cached, without promoting it
    pub fn contains(&self, key: &K) -> bool {
        self.cache.read().contains_key(key)
    }

    /// Hit/miss/eviction counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Current number of cached entries
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    /// Fixed cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all cached entries and reset the counters
    pub fn clear_cache(&self) {
        let mut cache = self.cache.write();
        cache.clear();
        self.stats.reset();
    }
}

impl<K, V, S> TierCache<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
{
    /// Render the recency list head-to-tail for debugging:
    /// `[key,value] -> [key,value] -> ... -> null`
    pub fn dump(&self) -> String {
        self.cache.read().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tierstore::{Error, MapStore};

    /// Store double that counts how often the cache falls through to it
    struct CountingStore<K, V> {
        inner: MapStore<K, V>,
        calls: Cell<u64>,
    }

    impl<K: Hash + Eq, V> CountingStore<K, V> {
        fn new(inner: MapStore<K, V>) -> Self {
            Self {
                inner,
                calls: Cell::new(0),
            }
        }

        fn calls(&self) -> u64 {
            self.calls.get()
        }
    }

    impl<K: Hash + Eq, V: Clone> Storage<K, V> for CountingStore<K, V> {
        fn get(&self, key: &K) -> Result<V> {
            self.calls.set(self.calls.get() + 1);
            self.inner.get(key)
        }
    }

    fn store_abc() -> CountingStore<&'static str, &'static str> {
        let mut inner = MapStore::new();
        inner.insert("a", "v1");
        inner.insert("b", "v2");
        inner.insert("c", "v3");
        CountingStore::new(inner)
    }

    #[test]
    fn test_miss_fetches_once_then_hits() {
        let cache = TierCache::new(store_abc(), 2);
        assert_eq!(cache.capacity(), 2);

        assert_eq!(cache.get(&"a").unwrap(), "v1");
        assert_eq!(cache.store.calls(), 1);

        // Second lookup is served from the cache
        assert_eq!(cache.get(&"a").unwrap(), "v1");
        assert_eq!(cache.store.calls(), 1);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_promoted_entry_survives_eviction() {
        // capacity 2: a, b, re-touch a, then c evicts b
        let cache = TierCache::new(store_abc(), 2);

        assert_eq!(cache.get(&"a").unwrap(), "v1");
        assert_eq!(cache.store.calls(), 1);
        assert_eq!(cache.get(&"b").unwrap(), "v2");
        assert_eq!(cache.store.calls(), 2);

        // Hit, no store call, promotes "a"
        assert_eq!(cache.get(&"a").unwrap(), "v1");
        assert_eq!(cache.store.calls(), 2);

        // Miss evicts "b", the least recently used
        assert_eq!(cache.get(&"c").unwrap(), "v3");
        assert_eq!(cache.store.calls(), 3);
        assert_eq!(cache.stats().evictions(), 1);
        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));

        // "b" is a miss again
        assert_eq!(cache.get(&"b").unwrap(), "v2");
        assert_eq!(cache.store.calls(), 4);
    }

    #[test]
    fn test_cached_keys_never_touch_store() {
        let cache = TierCache::new(store_abc(), 3);

        cache.put("a", "v1");
        cache.put("b", "v2");
        cache.put("c", "v3");

        assert_eq!(cache.get(&"a").unwrap(), "v1");
        assert_eq!(cache.get(&"b").unwrap(), "v2");
        assert_eq!(cache.get(&"c").unwrap(), "v3");

        assert_eq!(cache.store.calls(), 0);
        assert_eq!(cache.stats().hits(), 3);
        assert_eq!(cache.stats().misses(), 0);
        assert_eq!(cache.stats().hit_ratio(), 1.0);
    }

    #[test]
    fn test_store_error_propagates_and_caches_nothing() {
        let cache = TierCache::new(store_abc(), 2);

        assert!(matches!(cache.get(&"nope"), Err(Error::NotFound)));
        assert_eq!(cache.cache_len(), 0);
        assert_eq!(cache.store.calls(), 1);

        // Nothing was cached, so the store is consulted again
        assert!(cache.get(&"nope").is_err());
        assert_eq!(cache.store.calls(), 2);
        assert_eq!(cache.stats().inserts(), 0);
    }

    #[test]
    fn test_absent_sentinel_value_is_cached() {
        // A store that answers Ok(None) for "absent" gets the None cached
        let mut inner: MapStore<&str, Option<i32>> = MapStore::new();
        inner.insert("ghost", None);
        let cache = TierCache::new(CountingStore::new(inner), 2);

        assert_eq!(cache.get(&"ghost").unwrap(), None);
        assert_eq!(cache.store.calls(), 1);

        // The None is served from the cache now
        assert_eq!(cache.get(&"ghost").unwrap(), None);
        assert_eq!(cache.store.calls(), 1);
        assert_eq!(cache.cache_len(), 1);
    }

    #[test]
    fn test_put_overwrite_keeps_single_entry() {
        let cache = TierCache::new(store_abc(), 2);

        cache.put("a", "old");
        cache.put("a", "new");

        assert_eq!(cache.cache_len(), 1);
        assert_eq!(cache.get(&"a").unwrap(), "new");
        assert_eq!(cache.store.calls(), 0);
        assert_eq!(cache.stats().evictions(), 0);
    }

    #[test]
    fn test_eviction_accounting() {
        let cache = TierCache::new(store_abc(), 1);

        cache.get(&"a").unwrap();
        cache.get(&"b").unwrap();
        cache.get(&"c").unwrap();

        assert_eq!(cache.cache_len(), 1);
        assert_eq!(cache.stats().evictions(), 2);
        assert_eq!(cache.stats().inserts(), 3);
    }

    #[test]
    fn test_clear_cache() {
        let cache = TierCache::new(store_abc(), 4);

        cache.get(&"a").unwrap();
        cache.get(&"b").unwrap();
        assert_eq!(cache.cache_len(), 2);

        cache.clear_cache();

        assert_eq!(cache.cache_len(), 0);
        assert_eq!(cache.stats().lookups(), 0);

        // Cleared keys miss again
        cache.get(&"a").unwrap();
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_dump() {
        let cache = TierCache::new(store_abc(), 4);

        cache.put("a", "v1");
        cache.put("b", "v2");

        assert_eq!(cache.dump(), "[b,v2] -> [a,v1] -> null");
    }
}
