//! Free Function Memoization
//!
//! Wraps a standalone function in a single cache scope created at wrap time.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::Clock;
use crate::config::{resolve_with_globals, CacheConfig, MemoOptions};
use crate::memo::{MemoScope, MemoStats, Sweep, SweepReport};

// == Memoized ==
/// A function whose results are cached by argument list.
///
/// Arguments are passed as one tuple, so a two-argument function is a
/// `Fn((A1, A2)) -> R`. Build one with [`memorize_fn`] (results always
/// cached) or [`try_memorize_fn`] (only `Ok` results cached).
pub struct Memoized<A, V, F> {
    func: F,
    scope: MemoScope<V>,
    _args: PhantomData<fn(A)>,
}

/// Wraps `func` so that repeated calls with equal arguments reuse the first
/// result.
///
/// `options` are merged over the process-wide defaults once, here.
///
/// # Example
/// ```
/// use memorize::{memorize_fn, MemoOptions};
///
/// let square = memorize_fn(|(n,): (u64,)| n * n, MemoOptions::new().with_size(100));
/// assert_eq!(square.call((12,)), 144);
/// assert_eq!(square.stats().cache.misses, 1);
/// ```
pub fn memorize_fn<A, V, F>(func: F, options: MemoOptions) -> Memoized<A, V, F>
where
    A: Serialize,
    V: Clone,
    F: Fn(A) -> V,
{
    Memoized::from_parts(func, resolve_with_globals(&options))
}

/// Wraps a fallible `func`; successful results are cached, errors are not.
pub fn try_memorize_fn<A, V, E, F>(func: F, options: MemoOptions) -> Memoized<A, V, F>
where
    A: Serialize,
    V: Clone,
    F: Fn(A) -> Result<V, E>,
{
    Memoized::from_parts(func, resolve_with_globals(&options))
}

impl<A, V: Clone, F> Memoized<A, V, F> {
    fn from_parts(func: F, config: CacheConfig) -> Self {
        Self {
            func,
            scope: MemoScope::new(config),
            _args: PhantomData,
        }
    }

    /// Rebuilds the (empty) cache on a different time source.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        let config = self.scope.config();
        Self {
            func: self.func,
            scope: MemoScope::with_clock(config, clock),
            _args: PhantomData,
        }
    }

    pub fn stats(&self) -> MemoStats {
        self.scope.stats()
    }

    /// Drops every cached result.
    pub fn clear(&self) {
        self.scope.clear();
    }
}

impl<A, V, F> Memoized<A, V, F> {
    /// Settings this memo was built with.
    pub fn config(&self) -> CacheConfig {
        self.scope.config()
    }
}

impl<A, V, F> Memoized<A, V, F>
where
    A: Serialize,
    V: Clone,
    F: Fn(A) -> V,
{
    // == Call ==
    /// Returns the cached result for `args`, running the function on a miss.
    pub fn call(&self, args: A) -> V {
        self.scope.get_or_compute(args, &self.func)
    }
}

impl<A, V, F> Memoized<A, V, F>
where
    A: Serialize,
    V: Clone,
{
    // == Try Call ==
    /// Returns the cached result for `args`, running the function on a miss.
    ///
    /// An error from the function is returned unchanged and not cached.
    pub fn try_call<E>(&self, args: A) -> Result<V, E>
    where
        F: Fn(A) -> Result<V, E>,
    {
        self.scope.try_get_or_compute(args, &self.func)
    }
}

impl<A, V, F> Sweep for Memoized<A, V, F>
where
    V: Clone + Send,
    F: Send + Sync,
{
    fn sweep(&self) -> SweepReport {
        SweepReport {
            expired: self.scope.cleanup_expired(),
            released_scopes: 0,
        }
    }
}

impl<A, V, F> fmt::Debug for Memoized<A, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("config", &self.scope.config())
            .finish_non_exhaustive()
    }
}
