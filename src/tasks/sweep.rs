//! Sweep Task
//!
//! Background task that periodically reclaims expired results and released
//! owner scopes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::memo::Sweep;

/// Spawns a background task that sweeps `target` every `interval`.
///
/// The task runs until aborted through the returned handle. Each pass holds
/// a store lock only for the duration of that store's cleanup.
///
/// # Example
/// ```ignore
/// let memo = Arc::new(memorize_fn(|(n,): (u64,)| n * 2, MemoOptions::new().with_duration(5_000)));
/// let handle = spawn_sweep_task(memo.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(target: Arc<dyn Sweep>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting memo sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let report = target.sweep();

            if report.expired > 0 || report.released_scopes > 0 {
                info!(
                    "Memo sweep: removed {} expired results, released {} scopes",
                    report.expired, report.released_scopes
                );
            } else {
                debug!("Memo sweep: nothing to reclaim");
            }
        }
    })
}
