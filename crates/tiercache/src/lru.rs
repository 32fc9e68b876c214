//! LRU (Least Recently Used) cache engine
//!
//! Hand-built hash table combined with an intrusive recency list, no
//! `HashMap`/`BTreeMap` underneath. Both structures thread the same arena
//! slots:
//!
//! ```text
//!   entries (slot arena)
//!   ┌─────┬──────────────────────────────────────────────────────┐
//!   │ idx │ Entry { hash, key, value, bucket_next, prev, next }  │
//!   └─────┴──────────────────────────────────────────────────────┘
//!
//!   buckets[hash & mask] ─► idx ─► idx ─► ...        (collision chains)
//!   head ─► idx ◄──► idx ◄──► idx ◄── tail           (MRU ... LRU)
//! ```
//!
//! All of get/insert/evict are O(1) average case. The bucket array is sized
//! once at construction from the capacity and a 0.75 load factor; there is
//! no resizing.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use ahash::RandomState;

/// Bucket array is sized to `capacity / DEFAULT_LOAD_FACTOR`, rounded up to
/// a power of two so `hash & (len - 1)` indexes it.
const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Arena slot shared by the bucket table and the recency list
struct Entry<K, V> {
    /// Spread hash, computed once at insertion
    hash: u64,
    key: K,
    value: V,
    /// Next entry in the same collision chain
    bucket_next: Option<usize>,
    /// Toward the list head (more recently used)
    prev: Option<usize>,
    /// Toward the list tail (less recently used)
    next: Option<usize>,
}

/// Fixed-capacity LRU engine.
///
/// Single-threaded by construction: every operation takes `&mut self` and
/// runs to completion. Entries live in a slot arena and are addressed by
/// index, so the doubly-linked recency list and the singly-linked bucket
/// chains share nodes without any pointer aliasing.
pub struct LruEngine<K, V> {
    hasher: RandomState,
    /// Collision chain heads, length a fixed power of two
    buckets: Box<[Option<usize>]>,
    entries: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used, the eviction candidate
    tail: Option<usize>,
    len: usize,
    capacity: usize,
}

impl<K, V> LruEngine<K, V>
where
    K: Hash + Eq,
{
    /// Create a new engine with the given capacity
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        // Fixed seeds in tests for deterministic behavior
        #[cfg(test)]
        let hasher = RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        );
        #[cfg(not(test))]
        let hasher = RandomState::new();

        let min_buckets = (capacity as f64 / DEFAULT_LOAD_FACTOR).ceil() as usize;
        let num_buckets = min_buckets.next_power_of_two();

        Self {
            hasher,
            buckets: vec![None; num_buckets].into_boxed_slice(),
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            capacity,
        }
    }

    /// Look up a value and promote it to most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let hash = self.hash_key(key);
        let idx = self.find(hash, key)?;
        self.promote(idx);
        self.entries[idx].as_ref().map(|entry| &entry.value)
    }

    /// Look up a value without touching the recency order
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = self.find(self.hash_key(key), key)?;
        self.entries[idx].as_ref().map(|entry| &entry.value)
    }

    /// Check whether a key is cached, without touching the recency order
    pub fn contains_key(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Insert a key-value pair at the most-recently-used position.
    ///
    /// If the key is already cached its value is updated in place and the
    /// entry promoted; no second entry for the same key is ever created.
    /// Otherwise a new entry is linked at the list head and appended to its
    /// collision chain, evicting the least-recently-used entry first when
    /// the cache is full. Returns the evicted pair, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let hash = self.hash_key(&key);

        if let Some(idx) = self.find(hash, &key) {
            // Update existing
            if let Some(entry) = self.entries[idx].as_mut() {
                entry.value = value;
            }
            self.promote(idx);
            return None;
        }

        let evicted = if self.len == self.capacity {
            self.evict_tail()
        } else {
            None
        };

        let idx = self.alloc_entry();
        self.entries[idx] = Some(Entry {
            hash,
            key,
            value,
            bucket_next: None,
            prev: None,
            next: None,
        });
        self.attach_front(idx);
        self.append_to_bucket(idx, hash);
        self.len += 1;

        evicted
    }

    /// Current number of cached entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed capacity set at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries; capacity and bucket count are unchanged
    pub fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        for chain in self.buckets.iter_mut() {
            *chain = None;
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn hash_key(&self, key: &K) -> u64 {
        // Spread high bits into the low bits the bucket mask keeps, since
        // the bucket count is small
        let raw = self.hasher.hash_one(key);
        raw ^ (raw >> 16)
    }

    fn bucket_index(&self, hash: u64) -> usize {
        (hash & (self.buckets.len() as u64 - 1)) as usize
    }

    /// Scan the collision chain for `key`, comparing by equality
    fn find(&self, hash: u64, key: &K) -> Option<usize> {
        let mut cursor = self.buckets[self.bucket_index(hash)];
        while let Some(idx) = cursor {
            let entry = self.entries[idx].as_ref()?;
            if entry.key == *key {
                return Some(idx);
            }
            cursor = entry.bucket_next;
        }
        None
    }

    /// Move an entry to the most-recently-used position
    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return; // Already at front
        }

        self.detach(idx);
        self.attach_front(idx);
    }

    /// Unlink an entry from the recency list, patching both neighbors
    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.entries[idx].as_ref() {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_entry) = self.entries[prev_idx].as_mut() {
                    prev_entry.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_entry) = self.entries[next_idx].as_mut() {
                    next_entry.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    /// Link a detached entry as the new list head
    fn attach_front(&mut self, idx: usize) {
        if let Some(entry) = self.entries[idx].as_mut() {
            entry.prev = None;
            entry.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = self.entries[head_idx].as_mut() {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    /// Remove the least-recently-used entry from both structures
    fn evict_tail(&mut self) -> Option<(K, V)> {
        let idx = self.tail?;
        let hash = self.entries[idx].as_ref()?.hash;

        self.detach(idx);
        self.remove_from_bucket(idx, hash);

        let entry = self.entries[idx].take()?;
        self.free.push(idx);
        self.len -= 1;

        Some((entry.key, entry.value))
    }

    /// Splice an entry out of its collision chain.
    ///
    /// # Panics
    /// Panics if the entry is not on the chain its cached hash selects.
    /// That means the bucket table and the recency list disagree about the
    /// live entry set; size accounting is already corrupt and continuing
    /// would make it worse.
    fn remove_from_bucket(&mut self, idx: usize, hash: u64) {
        let bucket = self.bucket_index(hash);

        if self.buckets[bucket] == Some(idx) {
            self.buckets[bucket] = self.entries[idx].as_ref().and_then(|e| e.bucket_next);
            return;
        }

        let mut cursor = self.buckets[bucket];
        while let Some(cur) = cursor {
            let next = self.entries[cur].as_ref().and_then(|e| e.bucket_next);
            if next == Some(idx) {
                let after = self.entries[idx].as_ref().and_then(|e| e.bucket_next);
                if let Some(entry) = self.entries[cur].as_mut() {
                    entry.bucket_next = after;
                }
                return;
            }
            cursor = next;
        }

        panic!("lru: evicted entry missing from its bucket chain");
    }

    /// Append an entry at the end of its collision chain
    fn append_to_bucket(&mut self, idx: usize, hash: u64) {
        let bucket = self.bucket_index(hash);

        match self.buckets[bucket] {
            None => self.buckets[bucket] = Some(idx),
            Some(first) => {
                let mut cur = first;
                while let Some(next) = self.entries[cur].as_ref().and_then(|e| e.bucket_next) {
                    cur = next;
                }
                if let Some(entry) = self.entries[cur].as_mut() {
                    entry.bucket_next = Some(idx);
                }
            }
        }
    }

    fn alloc_entry(&mut self) -> usize {
        if let Some(idx) = self.free.pop() {
            idx
        } else {
            let idx = self.entries.len();
            self.entries.push(None);
            idx
        }
    }

    /// Walk both structures and assert they agree. Test-only.
    #[cfg(test)]
    fn check_invariants(&self) {
        assert!(self.len <= self.capacity, "len exceeds capacity");
        assert!(self.buckets.len().is_power_of_two());

        // Forward list walk: backlinks consistent, ends terminated
        let mut in_list = vec![false; self.entries.len()];
        let mut count = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let entry = self.entries[idx].as_ref().expect("list links a free slot");
            assert_eq!(entry.prev, prev, "broken backlink at {idx}");
            assert!(!in_list[idx], "entry {idx} linked twice");
            in_list[idx] = true;
            count += 1;
            prev = Some(idx);
            cursor = entry.next;
        }
        assert_eq!(self.tail, prev, "tail does not end the list");
        assert_eq!(count, self.len, "list length disagrees with len");

        // Every chain node is in the list, on the right chain, exactly once
        let mut chained = 0;
        for (bucket, chain) in self.buckets.iter().enumerate() {
            let mut cursor = *chain;
            while let Some(idx) = cursor {
                let entry = self.entries[idx].as_ref().expect("chain links a free slot");
                assert_eq!(self.bucket_index(entry.hash), bucket, "entry on wrong chain");
                assert!(in_list[idx], "chain entry {idx} not in list");
                chained += 1;
                cursor = entry.bucket_next;
            }
        }
        assert_eq!(chained, self.len, "chain total disagrees with len");

        let live = self.entries.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(live, self.len, "arena live count disagrees with len");
    }
}

/// Diagnostic rendering of the recency list, head to tail:
/// `[key,value] -> [key,value] -> ... -> null`. Not a persisted format.
impl<K, V> fmt::Display for LruEngine<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match self.entries[idx].as_ref() {
                Some(entry) => {
                    write!(f, "[{},{}] -> ", entry.key, entry.value)?;
                    cursor = entry.next;
                }
                None => break,
            }
        }
        write!(f, "null")
    }
}
