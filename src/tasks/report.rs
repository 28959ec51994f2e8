//! Stats Report Task
//!
//! Background task that periodically logs cache statistics. It only reads
//! counters; it never purges entries.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::TimedLruCache;

/// Spawns a background task that logs a JSON stats line every interval.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `report_interval_secs` - Interval in seconds between reports
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TimedLruCache::<String, String>::new(1000, 300));
/// let report_handle = spawn_report_task(cache.clone(), 1);
/// // Later, during shutdown:
/// report_handle.abort();
/// ```
pub fn spawn_report_task<K, V>(
    cache: Arc<TimedLruCache<K, V>>,
    report_interval_secs: u64,
) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let interval = Duration::from_secs(report_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stats report task with interval of {} seconds",
            report_interval_secs
        );

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let stats = cache.stats();
            match serde_json::to_string(&stats) {
                Ok(line) => info!(target: "timed_lru::stats", "{}", line),
                Err(err) => warn!("Failed to serialize stats: {}", err),
            }
        }
    })
}
