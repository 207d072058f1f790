//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with age tracking.

// == Cache Entry ==
/// A single memoized result with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion or replacement timestamp (milliseconds)
    pub created_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped at `now_ms`.
    pub fn new(value: V, now_ms: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
        }
    }

    // == Age ==
    /// Returns the entry's age in milliseconds at `now_ms`.
    ///
    /// A clock reading earlier than the insertion time yields an age of zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived `ttl_ms`.
    ///
    /// Boundary condition: the entry stays valid while its age is at most
    /// `ttl_ms` and expires once the age exceeds it. A `ttl_ms` of zero
    /// disables age-based expiration.
    pub fn is_expired(&self, now_ms: u64, ttl_ms: u64) -> bool {
        ttl_ms > 0 && self.age_ms(now_ms) > ttl_ms
    }

    // == Time To Live ==
    /// Returns the remaining lifetime in milliseconds, or None when the
    /// entry never expires by age.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry is still within its TTL
    /// - `None` if `ttl_ms` is zero
    pub fn ttl_remaining_ms(&self, now_ms: u64, ttl_ms: u64) -> Option<u64> {
        if ttl_ms == 0 {
            return None;
        }
        Some(ttl_ms.saturating_sub(self.age_ms(now_ms)))
    }
}
