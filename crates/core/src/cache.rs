// crates/core/src/cache.rs
//! Bounded memoization store for enrichment results.
//!
//! Eviction under capacity pressure is insertion-order (FIFO), not
//! access-order. The dashboard's enrichment keys embed the session's
//! `updated` timestamp, so a mutated session naturally stops hitting its
//! old entry and the orphan ages out here.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// String-keyed TTL + capacity bounded store.
///
/// `get` evicts an entry whose age exceeds the TTL as a side effect of
/// the lookup, so both accessors take `&mut self`.
pub struct TtlCache<V> {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<String, CacheEntry<V>>,
    order: VecDeque<String>,
}

/// The cache used by the enrichment pipeline. The stored value is itself
/// optional: `Some(None)` from `get` means "computed, nothing derived",
/// which is distinct from a miss.
pub type EnrichmentCache = TtlCache<Option<String>>;

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Lookup against an explicit clock, for deterministic tests.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => now.duration_since(entry.inserted_at) > self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            self.order.retain(|k| k != key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    /// Insert against an explicit clock, for deterministic tests.
    ///
    /// Re-inserting an existing key refreshes its timestamp and moves it
    /// to the back of the eviction queue.
    pub fn insert_at(&mut self, key: impl Into<String>, value: V, now: Instant) {
        let key = key.into();
        if self.entries.remove(&key).is_some() {
            self.order.retain(|k| k != &key);
        } else if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, CacheEntry { value, inserted_at: now });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
