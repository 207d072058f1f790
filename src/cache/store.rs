//! Cache Store Module
//!
//! Bounded key/value table combining HashMap storage with LRU tracking and
//! age-based expiration.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tracing::warn;

use crate::cache::{CacheEntry, CacheStats, Clock, LruTracker, SystemClock, DEFAULT_CAPACITY};
use crate::config::CacheConfig;

/// Upper bound on slots reserved up front; larger stores grow on demand.
const MAX_PREALLOCATION: usize = 1024;

// == Cache Store ==
/// Bounded cache with LRU eviction and TTL support.
///
/// The store never holds more than `capacity` entries: eviction happens
/// inside `put`, before the new entry is linked in. Entries older than
/// `ttl_ms` are treated as absent and dropped the next time they are read.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Maximum entry age in milliseconds, 0 = never expires
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore on the system clock.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries; 0 falls back to the default
    /// * `ttl_ms` - Maximum entry age in milliseconds, 0 disables expiration
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        Self::with_clock(capacity, ttl_ms, Arc::new(SystemClock))
    }

    /// Creates a new CacheStore reading time from `clock`.
    pub fn with_clock(capacity: usize, ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        let capacity = if capacity == 0 {
            warn!(
                "Cache capacity must be at least 1, using default of {}",
                DEFAULT_CAPACITY
            );
            DEFAULT_CAPACITY
        } else {
            capacity
        };

        let reserved = capacity.min(MAX_PREALLOCATION);
        Self {
            entries: HashMap::with_capacity(reserved),
            lru: LruTracker::with_capacity(reserved),
            stats: CacheStats::new(),
            capacity,
            ttl_ms,
            clock,
        }
    }

    /// Creates a store from resolved memoization settings.
    pub fn from_config(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(config.capacity, config.ttl_ms, clock)
    }

    // == Put ==
    /// Inserts or replaces the entry for `key`.
    ///
    /// The entry is stamped with the current time and becomes the most
    /// recently used. Inserting a new key into a full store first evicts
    /// the least recently used entry; replacing an existing key never
    /// evicts.
    ///
    /// # Returns
    /// The evicted key, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        let now = self.clock.now_ms();
        let mut evicted = None;

        // Only a new key can push the store past capacity
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.lru.evict_oldest() {
                self.entries.remove(&oldest);
                self.stats.record_eviction();
                evicted = Some(oldest);
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, now));
        self.stats.set_total_entries(self.entries.len());

        evicted
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A valid entry counts as a use and moves to the head of the LRU order.
    /// An expired entry is removed and the read counts as a miss.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now, self.ttl_ms),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        self.lru.touch(key);
        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Contains ==
    /// Checks for a live entry without touching recency or stats.
    pub fn contains(&self, key: &K) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now, self.ttl_ms))
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.stats.set_total_entries(self.entries.len());
        Some(entry.value)
    }

    // == Clear ==
    /// Removes all entries. Counters other than the entry count are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        if self.ttl_ms == 0 {
            return 0;
        }

        let now = self.clock.now_ms();
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.ttl_ms))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.lru.remove(&key);
            self.stats.record_expiration();
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries, including expired ones not
    /// yet dropped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }
}
