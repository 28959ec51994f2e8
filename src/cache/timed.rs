//! Timed LRU Cache Module
//!
//! Wraps the LRU cache with insertion-relative expiration. Stale entries are
//! never swept in the background; they are purged lazily by the read paths
//! that encounter them.

use std::collections::BTreeSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{
    CacheStats, Clock, LruCache, SystemClock, TimedEntry, DEFAULT_EXPIRATION_SECS,
    DEFAULT_MAX_CAPACITY,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Timed LRU Cache ==
/// An LRU multimap cache whose entries expire a fixed number of seconds
/// after insertion.
///
/// Reading an entry promotes it for eviction purposes but does not extend
/// its life. An expiration of 0 disables expiry.
///
/// # Example
/// ```
/// use timed_lru::cache::TimedLruCache;
///
/// let cache = TimedLruCache::new(100, 60);
/// cache.put("session", "alice");
/// assert_eq!(cache.get(&"session"), Some("alice"));
/// ```
#[derive(Debug)]
pub struct TimedLruCache<K, V> {
    inner: LruCache<K, TimedEntry<V>>,
    expiration_secs: u64,
    clock: Arc<dyn Clock>,
}

impl<K, V> Default for TimedLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY, DEFAULT_EXPIRATION_SECS)
    }
}

impl<K, V> TimedLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructors ==
    /// Creates a cache with the given capacity (0 = unbounded) and
    /// expiration in seconds (0 = never), reading the system clock.
    pub fn new(capacity: usize, expiration_secs: u64) -> Self {
        Self::with_clock(capacity, expiration_secs, Arc::new(SystemClock))
    }

    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(capacity: usize, expiration_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: LruCache::new(capacity),
            expiration_secs,
            clock,
        }
    }

    /// Creates a cache from a `Duration`, which must be whole seconds.
    pub fn with_expiration(capacity: usize, expiration: Duration) -> Result<Self> {
        if expiration.subsec_nanos() != 0 {
            return Err(CacheError::InvalidConfig(format!(
                "expiration must be a whole number of seconds, got {:?}",
                expiration
            )));
        }
        Ok(Self::new(capacity, expiration.as_secs()))
    }

    /// Creates a cache using the capacity and expiration from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capacity, config.expiration_secs)
    }

    /// Returns the configured expiration in seconds.
    pub fn expiration(&self) -> u64 {
        self.expiration_secs
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    // == Put ==
    /// Stores `value` under `key`, stamped with the current second.
    pub fn put(&self, key: K, value: V)
    where
        V: PartialEq,
    {
        let entry = TimedEntry::new(value, self.clock.now_secs());
        self.inner.put(key, entry);
    }

    // == Get ==
    /// Returns the least recently used live value for `key`.
    ///
    /// If that entry has expired it is removed and nothing is returned.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let mut store = self.inner.lock();
        let now = self.clock.now();

        let Some(handle) = store.lru_handle(key) else {
            store.stats_mut().record_miss();
            return None;
        };

        let expired = store
            .value(handle)
            .is_some_and(|entry| entry.is_expired(now, self.expiration_secs));

        if expired {
            store.remove_handle(handle);
            let stats = store.stats_mut();
            stats.record_expirations(1);
            stats.record_miss();
            debug!("purged expired entry on get");
            return None;
        }

        let value = store.value(handle).map(|entry| entry.value().clone());
        store.promote(handle);
        store.stats_mut().record_hit();
        value
    }

    // == Pop ==
    /// Removes the entry `get` would select and returns its value unless it
    /// has expired. The slot is vacated either way.
    pub fn pop(&self, key: &K) -> Option<V> {
        let mut store = self.inner.lock();
        let now = self.clock.now();

        let popped = store
            .lru_handle(key)
            .and_then(|handle| store.remove_handle(handle))
            .map(|(_, entry)| entry);

        match popped {
            Some(entry) if entry.is_expired(now, self.expiration_secs) => {
                let stats = store.stats_mut();
                stats.record_expirations(1);
                stats.record_miss();
                debug!("discarded expired entry on pop");
                None
            }
            Some(entry) => {
                store.stats_mut().record_hit();
                Some(entry.into_value())
            }
            None => {
                store.stats_mut().record_miss();
                None
            }
        }
    }

    // == Get Key ==
    /// Reverse lookup: returns the key of the least recently used live entry
    /// holding `value`.
    ///
    /// Every expired entry passed over during the scan is purged, whether or
    /// not it holds `value`.
    pub fn get_key(&self, value: &V) -> Option<K>
    where
        V: PartialEq,
    {
        let mut store = self.inner.lock();
        let now = self.clock.now();

        let mut expired = Vec::new();
        let mut found = None;
        for (handle, key, entry) in store.iter_oldest_first() {
            if entry.is_expired(now, self.expiration_secs) {
                expired.push(handle);
            } else if entry.value() == value {
                found = Some(key.clone());
                break;
            }
        }

        if !expired.is_empty() {
            for handle in &expired {
                store.remove_handle(*handle);
            }
            store.stats_mut().record_expirations(expired.len());
            debug!(purged = expired.len(), "purged expired entries during reverse lookup");
        }

        found
    }

    /// Returns true if a live entry holds `value`. Purges like `get_key`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.get_key(value).is_some()
    }

    /// Returns true if `key` has any entry, expired or not.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    // == Remove ==
    /// Removes every entry under `key` regardless of expiration.
    pub fn remove(&self, key: &K) -> Vec<TimedEntry<V>> {
        self.inner.remove(key)
    }

    /// Removes every entry under `key` whose value equals `value`,
    /// regardless of expiration.
    pub fn remove_value(&self, key: &K, value: &V) -> Vec<TimedEntry<V>>
    where
        V: PartialEq,
    {
        let mut store = self.inner.lock();

        let matching: Vec<_> = store
            .handles(key)
            .iter()
            .copied()
            .filter(|&h| store.value(h).is_some_and(|entry| entry.value() == value))
            .collect();

        matching
            .into_iter()
            .filter_map(|h| store.remove_handle(h))
            .map(|(_, entry)| entry)
            .collect()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    // == Size ==
    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Number of entries under `key`, including expired ones.
    pub fn value_range(&self, key: &K) -> usize {
        self.inner.value_range(key)
    }

    // == Snapshots ==
    /// Returns every stored `(key, value)` pair without filtering expired ones.
    pub fn entry_set(&self) -> BTreeSet<(K, V)>
    where
        K: Ord,
        V: Ord + Clone,
    {
        self.inner
            .lock()
            .iter_oldest_first()
            .map(|(_, key, entry)| (key.clone(), entry.value().clone()))
            .collect()
    }

    /// Returns the values stored under `key` without filtering expired ones.
    pub fn value_set(&self, key: &K) -> BTreeSet<V>
    where
        V: Ord + Clone,
    {
        let store = self.inner.lock();
        store
            .handles(key)
            .iter()
            .filter_map(|&h| store.value(h))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const START: u64 = 1_700_000_000;

    type TestCache = TimedLruCache<&'static str, &'static str>;

    fn timed(capacity: usize, expiration: u64) -> (TestCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let cache = TimedLruCache::with_clock(capacity, expiration, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_defaults() {
        let cache: TimedLruCache<String, String> = TimedLruCache::default();
        assert_eq!(cache.capacity(), 1000);
        assert_eq!(cache.expiration(), 43200);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_with_expiration_rejects_fractional_seconds() {
        let result = TimedLruCache::<u32, u32>::with_expiration(5, Duration::from_millis(1500));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));

        let cache = TimedLruCache::<u32, u32>::with_expiration(5, Duration::from_secs(3)).unwrap();
        assert_eq!(cache.expiration(), 3);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            capacity: 7,
            expiration_secs: 9,
            ..Config::default()
        };
        let cache: TimedLruCache<u32, u32> = TimedLruCache::from_config(&config);
        assert_eq!(cache.capacity(), 7);
        assert_eq!(cache.expiration(), 9);
    }

    #[test]
    fn test_get_after_expiration() {
        let (cache, clock) = timed(5, 2);

        assert_eq!(cache.get(&"Key1"), None);
        cache.put("Key1", "Value1");

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"Key1"), Some("Value1"));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"Key1"), None);
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_reads_do_not_extend_life() {
        let (cache, clock) = timed(5, 3);

        cache.put("k", "v");
        for _ in 0..2 {
            clock.advance(Duration::from_secs(1));
            assert_eq!(cache.get(&"k"), Some("v"));
        }
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn test_zero_expiration_never_expires() {
        let (cache, clock) = timed(5, 0);

        cache.put("k", "v");
        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));
        assert_eq!(cache.get(&"k"), Some("v"));
    }

    #[test]
    fn test_get_skips_to_next_duplicate_only_on_later_call() {
        let (cache, clock) = timed(5, 5);

        cache.put("k", "old");
        clock.advance(Duration::from_secs(3));
        cache.put("k", "new");
        clock.advance(Duration::from_secs(2));

        // The stalest duplicate is expired: purged, nothing returned
        assert_eq!(cache.get(&"k"), None);
        assert_eq!(cache.value_range(&"k"), 1);
        assert_eq!(cache.get(&"k"), Some("new"));
    }

    #[test]
    fn test_pop_expired_vacates_slot() {
        let (cache, clock) = timed(5, 2);

        cache.put("k", "v");
        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.pop(&"k"), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(&"k"), None);
    }

    #[test]
    fn test_pop_live_entry() {
        let (cache, _clock) = timed(5, 2);

        cache.put("k", "v");
        assert_eq!(cache.pop(&"k"), Some("v"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_key() {
        let (cache, _clock) = timed(2, 0);

        assert_eq!(cache.get_key(&"Value1"), None);
        cache.put("Key1", "Value1");
        assert_eq!(cache.get_key(&"Value1"), Some("Key1"));
    }

    #[test]
    fn test_get_key_sweeps_expired_entries_it_passes() {
        let (cache, clock) = timed(10, 5);

        cache.put("stale", "x");
        cache.put("stale-match", "target");
        clock.advance(Duration::from_secs(5));
        cache.put("live", "target");
        cache.put("after", "y");

        assert_eq!(cache.get_key(&"target"), Some("live"));
        assert!(!cache.contains_key(&"stale"));
        assert!(!cache.contains_key(&"stale-match"));
        assert!(cache.contains_key(&"after"));
        assert_eq!(cache.stats().expirations, 2);
    }

    #[test]
    fn test_contains_value_purges() {
        let (cache, clock) = timed(3, 1);

        cache.put("Key1", "Value1");
        assert!(!cache.contains_value(&"Value2"));
        assert!(cache.contains_value(&"Value1"));

        clock.advance(Duration::from_secs(1));
        assert!(!cache.contains_value(&"Value1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_ignores_expiration() {
        let (cache, clock) = timed(5, 2);

        cache.put("k", "v1");
        cache.put("k", "v2");
        clock.advance(Duration::from_secs(10));

        assert!(cache.contains_key(&"k"));
        let removed = cache.remove(&"k");
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|e| e.timestamp() == START));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_value_removes_every_timestamp() {
        let (cache, clock) = timed(5, 0);

        cache.put("k", "v");
        clock.advance(Duration::from_secs(1));
        // Same value, different second: a second entry
        cache.put("k", "v");
        cache.put("k", "other");
        assert_eq!(cache.value_range(&"k"), 3);

        let removed = cache.remove_value(&"k", &"v");
        assert_eq!(removed.len(), 2);
        assert_eq!(cache.value_range(&"k"), 1);
        assert!(cache.remove_value(&"k", &"v").is_empty());
    }

    #[test]
    fn test_put_same_second_replaces() {
        let (cache, _clock) = timed(5, 0);

        cache.put("k", "v");
        cache.put("k", "v");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_before_expiration() {
        let (cache, _clock) = timed(5, 2);

        cache.put("Key1", "Value1");
        cache.put("Key2", "Value21");
        cache.put("Key2", "Value22");
        cache.put("Key3", "Value3");
        assert_eq!(cache.len(), 4);

        assert_eq!(cache.get(&"Key1"), Some("Value1"));
        assert_eq!(cache.get(&"Key2"), Some("Value21"));

        assert_eq!(cache.remove(&"Key2").len(), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"Key1"), Some("Value1"));

        assert_eq!(cache.remove_value(&"Key1", &"Value1").len(), 1);
        assert_eq!(cache.pop(&"Key3"), Some("Value3"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_set_includes_expired() {
        let (cache, clock) = timed(3, 1);

        cache.put("Key1", "Value1");
        cache.put("Key2", "Value21");
        cache.put("Key2", "Value22");
        assert!(cache.is_full());

        clock.advance(Duration::from_secs(5));

        let set = cache.entry_set();
        assert_eq!(set.len(), 3);
        assert!(set.contains(&("Key1", "Value1")));
        assert!(set.contains(&("Key2", "Value21")));
        assert!(set.contains(&("Key2", "Value22")));

        let values = cache.value_set(&"Key2");
        assert_eq!(values.len(), 2);
        assert!(values.contains("Value21"));
        assert!(values.contains("Value22"));

        // Listing never purges
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_clear() {
        let (cache, _clock) = timed(3, 0);

        cache.put("Key1", "Value1");
        cache.put("Key2", "Value21");
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expiry_checked_against_time_at_lock() {
        let (cache, clock) = timed(5, 2);
        cache.put("k", "v");

        std::thread::scope(|s| {
            let guard = cache.inner.lock();
            let reader = s.spawn(|| cache.get(&"k"));

            // The reader is parked on the lock while the entry expires
            std::thread::sleep(Duration::from_millis(50));
            clock.advance(Duration::from_secs(2));
            drop(guard);

            assert_eq!(reader.join().unwrap(), None);
        });
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_promotes_against_capacity_eviction() {
        let (cache, _clock) = timed(2, 60);

        cache.put("a", "1");
        cache.put("b", "2");
        assert_eq!(cache.get(&"a"), Some("1"));

        cache.put("c", "3");

        assert!(cache.contains_key(&"a"));
        assert!(!cache.contains_key(&"b"));
        assert!(cache.contains_key(&"c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reput_in_later_second_takes_own_slot() {
        let (cache, clock) = timed(2, 0);

        cache.put("k", "v");
        cache.put("other", "x");
        clock.advance(Duration::from_secs(1));

        // Distinct timestamp, so not a duplicate: the stale copy is evicted
        // as the oldest entry instead of being replaced in place
        cache.put("k", "v");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.value_range(&"k"), 1);
        assert!(cache.contains_key(&"other"));
        assert_eq!(cache.stats().evictions, 1);
        let removed = cache.remove(&"k");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].timestamp(), START + 1);
    }

    #[test]
    fn test_reput_in_later_second_evicts_other_entry() {
        let (cache, clock) = timed(2, 0);

        cache.put("other", "x");
        cache.put("k", "v");
        clock.advance(Duration::from_secs(1));
        cache.put("k", "v");

        // The earlier "k" entry survives alongside the new one
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.value_range(&"k"), 2);
        assert!(!cache.contains_key(&"other"));
    }

    #[test]
    fn test_shared_pointer_values() {
        let cache: TimedLruCache<&str, Arc<String>> = TimedLruCache::new(5, 60);

        let val1 = Arc::new("Value1".to_string());
        let val2 = Arc::new("Value2".to_string());
        cache.put("Key1", val1.clone());
        cache.put("Key2", val2.clone());

        assert!(cache.contains_value(&val1));
        assert!(cache.contains_value(&val2));
        assert_eq!(cache.get(&"Key1").as_deref().map(String::as_str), Some("Value1"));
    }
}
