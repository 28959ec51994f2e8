//! Timed LRU - A thread-safe multimap cache
//!
//! Provides a bounded multimap with least-recently-used eviction, and a
//! timed variant whose entries expire lazily a fixed time after insertion.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{LruCache, TimedLruCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_report_task;
