//! Memo Scope Module
//!
//! One cache store plus the hit/miss protocol shared by free-function and
//! per-owner memos.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::memo::ArgKey;

// == Memo Stats ==
/// Counters for one memo (or the sum of several owner scopes).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// Calls whose arguments could not be keyed and ran uncached
    pub uncacheable: u64,
    /// Number of live scopes the counters were gathered from
    pub scopes: usize,
}

impl MemoStats {
    pub fn merge(&mut self, other: &MemoStats) {
        self.cache.merge(&other.cache);
        self.uncacheable += other.uncacheable;
        self.scopes += other.scopes;
    }
}

enum Lookup<V> {
    Hit(V),
    Miss(ArgKey),
    Bypass,
}

// == Memo Scope ==
/// Cache store owned by exactly one (function, owner) pair.
///
/// The store lock is taken separately for the lookup and the insert and is
/// never held while the wrapped function runs, so a memoized function may
/// call back into its own memo.
#[derive(Debug)]
pub struct MemoScope<V> {
    store: Mutex<CacheStore<ArgKey, V>>,
    config: CacheConfig,
    uncacheable: AtomicU64,
}

impl<V> MemoScope<V> {
    pub fn config(&self) -> CacheConfig {
        self.config
    }
}

impl<V: Clone> MemoScope<V> {
    /// Creates a scope on the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(CacheStore::from_config(&config, clock)),
            config,
            uncacheable: AtomicU64::new(0),
        }
    }

    // == Get Or Compute ==
    /// Returns the cached result for `args`, or runs `compute` once and
    /// caches what it returns.
    ///
    /// Arguments that cannot be keyed bypass the store: `compute` runs and
    /// its result is returned without being cached.
    pub fn get_or_compute<A, C>(&self, args: A, compute: C) -> V
    where
        A: Serialize,
        C: FnOnce(A) -> V,
    {
        match self.lookup(&args) {
            Lookup::Hit(value) => value,
            Lookup::Miss(key) => {
                let value = compute(args);
                self.insert(key, value.clone());
                value
            }
            Lookup::Bypass => compute(args),
        }
    }

    // == Try Get Or Compute ==
    /// Like [`get_or_compute`](Self::get_or_compute) for fallible functions.
    ///
    /// Only `Ok` results are cached. An `Err` is returned as is and leaves
    /// the store untouched, so the next call with the same arguments runs
    /// the function again.
    pub fn try_get_or_compute<A, E, C>(&self, args: A, compute: C) -> Result<V, E>
    where
        A: Serialize,
        C: FnOnce(A) -> Result<V, E>,
    {
        match self.lookup(&args) {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss(key) => {
                let value = compute(args)?;
                self.insert(key, value.clone());
                Ok(value)
            }
            Lookup::Bypass => compute(args),
        }
    }

    fn lookup<A: Serialize>(&self, args: &A) -> Lookup<V> {
        let key = match ArgKey::derive(args) {
            Ok(key) => key,
            Err(e) => {
                self.uncacheable.fetch_add(1, Ordering::Relaxed);
                warn!("Calling through without memoization: {}", e);
                return Lookup::Bypass;
            }
        };

        match self.store.lock().get(&key) {
            Some(value) => {
                debug!(key = %key, "memo hit");
                Lookup::Hit(value)
            }
            None => {
                debug!(key = %key, "memo miss");
                Lookup::Miss(key)
            }
        }
    }

    fn insert(&self, key: ArgKey, value: V) {
        if let Some(evicted) = self.store.lock().put(key, value) {
            debug!(key = %evicted, "memo entry evicted");
        }
    }

    // == Maintenance ==
    /// Drops every cached result.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Drops expired results, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.store.lock().cleanup_expired()
    }

    /// Returns the number of stored results.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            cache: self.store.lock().stats(),
            uncacheable: self.uncacheable.load(Ordering::Relaxed),
            scopes: 1,
        }
    }
}
