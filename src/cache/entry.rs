//! Timed Entry Module
//!
//! Value wrapper stored by the timed cache, stamped with its insertion time.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

// == Timed Entry ==
/// A cached value together with the second it was inserted.
///
/// Equality compares both the value and the timestamp, so the same value
/// inserted in two different seconds yields two distinct entries. Ordering
/// sorts by value first, then by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimedEntry<V> {
    value: V,
    /// Insertion time (Unix seconds); never refreshed by reads
    timestamp: u64,
}

impl<V> TimedEntry<V> {
    // == Constructor ==
    /// Wraps `value` with an explicit insertion timestamp in Unix seconds.
    pub fn new(value: V, timestamp: u64) -> Self {
        Self { value, timestamp }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    /// Insertion time in Unix seconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Insertion time as a UTC datetime, if representable.
    pub fn inserted_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at time `now`.
    ///
    /// An entry expires once `now >= timestamp + expiration_secs`. An
    /// expiration of 0 means the entry never expires.
    pub fn is_expired(&self, now: Duration, expiration_secs: u64) -> bool {
        if expiration_secs == 0 {
            return false;
        }
        let deadline = Duration::from_secs(self.timestamp.saturating_add(expiration_secs));
        now >= deadline
    }
}

impl<V: Ord> PartialOrd for TimedEntry<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: Ord> Ord for TimedEntry<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then(self.timestamp.cmp(&other.timestamp))
    }
}
