//! Memoization Module
//!
//! Wraps functions and methods so that calls with equal arguments reuse a
//! cached result.
//!
//! # Flow
//! 1. The argument tuple is encoded into an [`ArgKey`]
//! 2. The owning scope's store is consulted
//! 3. On a hit the stored value is returned without calling the function
//! 4. On a miss the function runs once and its result is stored

mod canonical;
mod function;
mod key;
mod method;
mod scope;

use serde::Serialize;

pub use function::{memorize_fn, try_memorize_fn, Memoized};
pub use key::ArgKey;
pub use method::MethodMemo;
pub use scope::{MemoScope, MemoStats};

// == Sweep ==
/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired results dropped
    pub expired: usize,
    /// Scopes released because their owner was dropped
    pub released_scopes: usize,
}

/// Eager reclamation of memory that lazy checks would free later.
///
/// Correctness never depends on sweeping: expired results are already
/// treated as misses when read.
pub trait Sweep: Send + Sync {
    fn sweep(&self) -> SweepReport;
}
