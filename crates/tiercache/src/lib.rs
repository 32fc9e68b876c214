//! # tiercache
//!
//! Fixed-capacity LRU cache in front of a slower secondary store.
//!
//! ## Architecture
//! - **Bucket table**: hand-built array of collision chains, sized once at
//!   construction (power of two, 0.75 load factor), indexed by bit mask
//! - **Recency list**: intrusive doubly-linked list over the same entries,
//!   most recently used at the head, eviction from the tail
//! - **Facade**: [`TierCache`] consults a [`tierstore::Storage`] on misses
//!   and tracks hit/miss statistics
//!
//! get/put/evict are all O(1) average case; no built-in ordered map is
//! involved.

#![warn(missing_docs)]

mod cache;
mod lru;
mod stats;

pub use cache::TierCache;
pub use lru::LruEngine;
pub use stats::{CacheStats, StatsSnapshot};
