//! Workload Task
//!
//! Blocking worker loop that exercises a shared cache with a deterministic
//! mix of operations until told to stop.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::cache::TimedLruCache;

/// Distinct values each worker cycles through per key
const VALUES_PER_KEY: u64 = 4;

/// Counts of what one worker did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub operations: u64,
    pub puts: u64,
    /// Reads (`get`/`pop`/`get_key`) that returned something
    pub found: u64,
    /// Reads that returned nothing
    pub empty: u64,
    pub removed: u64,
}

/// Runs operations against `cache` until `stop` is set or `max_operations`
/// is reached (0 = no limit).
///
/// Every tenth step is, in order: four puts, three gets, a pop, a reverse
/// lookup and a removal, each on a key chosen from `key_space`.
pub fn run_worker(
    cache: &TimedLruCache<String, String>,
    worker_id: usize,
    key_space: usize,
    max_operations: u64,
    stop: &AtomicBool,
) -> WorkerSummary {
    let mut summary = WorkerSummary {
        worker_id,
        ..WorkerSummary::default()
    };
    let key_space = key_space.max(1) as u64;
    let mut step: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        if max_operations != 0 && summary.operations >= max_operations {
            break;
        }

        let key = format!("key-{}", (step * 7 + worker_id as u64) % key_space);
        let value = format!("w{}-{}", worker_id, step % VALUES_PER_KEY);

        match step % 10 {
            0..=3 => {
                cache.put(key, value);
                summary.puts += 1;
            }
            4..=6 => tally(&mut summary, cache.get(&key).is_some()),
            7 => tally(&mut summary, cache.pop(&key).is_some()),
            8 => tally(&mut summary, cache.get_key(&value).is_some()),
            _ => summary.removed += cache.remove(&key).len() as u64,
        }

        summary.operations += 1;
        step += 1;
    }

    debug!(worker_id, operations = summary.operations, "worker finished");
    summary
}

fn tally(summary: &mut WorkerSummary, found: bool) {
    if found {
        summary.found += 1;
    } else {
        summary.empty += 1;
    }
}
