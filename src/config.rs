//! Configuration Module
//!
//! Handles loading cache and workload settings from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::{DEFAULT_EXPIRATION_SECS, DEFAULT_MAX_CAPACITY};
use crate::error::{CacheError, Result};

/// Cache and workload configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries the cache can hold (0 = unbounded)
    pub capacity: usize,
    /// Seconds after insertion at which an entry expires (0 = never)
    pub expiration_secs: u64,
    /// Number of concurrent workload workers
    pub workers: usize,
    /// Number of distinct keys the workload touches
    pub key_space: usize,
    /// How long the workload runs in seconds (0 = until interrupted)
    pub run_seconds: u64,
    /// Interval in seconds between statistics reports
    pub report_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_EXPIRATION` - Expiration in seconds (default: 43200)
    /// - `WORKERS` - Workload workers (default: 4)
    /// - `KEY_SPACE` - Distinct workload keys (default: 64)
    /// - `RUN_SECONDS` - Workload duration in seconds (default: 10)
    /// - `REPORT_INTERVAL` - Stats report frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            expiration_secs: env_or("CACHE_EXPIRATION", defaults.expiration_secs),
            workers: env_or("WORKERS", defaults.workers),
            key_space: env_or("KEY_SPACE", defaults.key_space),
            run_seconds: env_or("RUN_SECONDS", defaults.run_seconds),
            report_interval: env_or("REPORT_INTERVAL", defaults.report_interval),
        }
    }

    /// Rejects settings the workload cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(CacheError::InvalidConfig(
                "WORKERS must be at least 1".to_string(),
            ));
        }
        if self.key_space == 0 {
            return Err(CacheError::InvalidConfig(
                "KEY_SPACE must be at least 1".to_string(),
            ));
        }
        if self.report_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "REPORT_INTERVAL must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MAX_CAPACITY,
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            workers: 4,
            key_space: 64,
            run_seconds: 10,
            report_interval: 1,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
