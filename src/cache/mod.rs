//! Cache Module
//!
//! Provides a thread-safe multimap cache with LRU eviction, and a timed
//! variant layered on top of it with lazy expiration.

mod clock;
mod entry;
mod lru;
mod lru_cache;
mod stats;
mod store;
mod timed;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::TimedEntry;
pub use lru_cache::LruCache;
pub use stats::CacheStats;
pub use timed::TimedLruCache;

pub(crate) use store::MultimapStore;

// == Public Constants ==
/// Default capacity of a timed cache
pub const DEFAULT_MAX_CAPACITY: usize = 1000;

/// Default expiration of a timed cache in seconds (12 hours)
pub const DEFAULT_EXPIRATION_SECS: u64 = 43_200;
