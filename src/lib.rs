//! Memorize - function memoization with bounded, expiring caches
//!
//! Caches function results by argument list with LRU eviction, TTL
//! expiration and per-owner isolation for methods.

pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod tasks;

pub use config::{
    global_options, reset_global_options, set_global_options, CacheConfig, MemoOptions,
};
pub use error::{MemoError, Result};
pub use memo::{
    memorize_fn, try_memorize_fn, ArgKey, MemoStats, Memoized, MethodMemo, Sweep, SweepReport,
};
pub use tasks::spawn_sweep_task;
