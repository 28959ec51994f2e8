//! Timed LRU - workload driver
//!
//! Hammers a shared timed cache from several blocking workers and logs
//! statistics until interrupted or the configured run time elapses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timed_lru::tasks::{run_worker, WorkerSummary};
use timed_lru::{spawn_report_task, Config, TimedLruCache};

/// Main entry point for the workload driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the shared timed cache
/// 4. Start the background stats report task
/// 5. Start the blocking workload workers
/// 6. Stop on Ctrl+C/SIGTERM or when the run time elapses
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timed_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Timed LRU workload driver");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: capacity={}, expiration={}s, workers={}, key_space={}, run_seconds={}, report_interval={}s",
        config.capacity,
        config.expiration_secs,
        config.workers,
        config.key_space,
        config.run_seconds,
        config.report_interval
    );

    let cache = Arc::new(TimedLruCache::<String, String>::from_config(&config));
    let report_handle = spawn_report_task(cache.clone(), config.report_interval);

    let stop = Arc::new(AtomicBool::new(false));
    let workers: Vec<_> = (0..config.workers)
        .map(|worker_id| {
            let cache = cache.clone();
            let stop = stop.clone();
            let key_space = config.key_space;
            tokio::task::spawn_blocking(move || run_worker(&cache, worker_id, key_space, 0, &stop))
        })
        .collect();
    info!("{} workers started", workers.len());

    wait_for_stop(config.run_seconds).await;
    stop.store(true, Ordering::Relaxed);

    let mut summaries: Vec<WorkerSummary> = Vec::with_capacity(workers.len());
    for worker in workers {
        summaries.push(worker.await.context("worker panicked")?);
    }

    report_handle.abort();
    warn!("Stats report task aborted");

    let total_ops: u64 = summaries.iter().map(|s| s.operations).sum();
    info!("Workers finished: {} operations", total_ops);
    info!("Final stats: {}", serde_json::to_string(&cache.stats())?);
    info!("Worker summaries: {}", serde_json::to_string(&summaries)?);

    Ok(())
}

/// Waits for Ctrl+C, SIGTERM, or `run_seconds` (0 = no deadline).
async fn wait_for_stop(run_seconds: u64) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        if run_seconds == 0 {
            std::future::pending::<()>().await;
        } else {
            tokio::time::sleep(Duration::from_secs(run_seconds)).await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping workers...");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping workers...");
        }
        _ = deadline => {
            info!("Run time elapsed, stopping workers...");
        }
    }
}
