//! Cache Module
//!
//! Bounded in-memory key/value store with TTL expiration and LRU eviction.
//! Knows nothing about functions or owners; the memoization layer builds on it.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Capacity used when none (or an invalid one) is configured
pub const DEFAULT_CAPACITY: usize = 20;

/// TTL used when none (or an invalid one) is configured; 0 = never expires
pub const DEFAULT_TTL_MS: u64 = 0;
