//! LRU Cache Module
//!
//! Thread-safe multimap LRU cache. Every operation runs under one exclusive
//! lock covering both the lookup and the structural change.

use std::collections::BTreeSet;
use std::hash::Hash;

use parking_lot::{Mutex, MutexGuard};

use crate::cache::{CacheStats, MultimapStore};

// == LRU Cache ==
/// A size-limited multimap cache that evicts the least recently used entry
/// when a new one is added while full.
///
/// A capacity of 0 means the cache is unbounded.
///
/// # Example
/// ```
/// use timed_lru::cache::LruCache;
///
/// let cache = LruCache::new(3);
/// cache.put("k", 1);
/// cache.put("k", 2);
///
/// // The least recently used value for the key comes back first
/// assert_eq!(cache.get(&"k"), Some(1));
/// assert_eq!(cache.get(&"k"), Some(2));
/// ```
#[derive(Debug)]
pub struct LruCache<K, V> {
    store: Mutex<MultimapStore<K, V>>,
}

impl<K, V> Default for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries (0 = no limit).
    pub fn new(capacity: usize) -> Self {
        Self {
            store: Mutex::new(MultimapStore::new(capacity)),
        }
    }

    /// Locks the underlying store for a compound operation.
    pub(crate) fn lock(&self) -> MutexGuard<'_, MultimapStore<K, V>> {
        self.store.lock()
    }

    /// Returns the configured capacity; 0 means unbounded.
    pub fn capacity(&self) -> usize {
        self.store.lock().capacity()
    }

    /// Returns true if the cache maps `key` to at least one value.
    pub fn contains_key(&self, key: &K) -> bool {
        self.store.lock().contains_key(key)
    }

    /// Returns true if any key maps to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.get_key(value).is_some()
    }

    /// Removes every mapping.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    // == Put ==
    /// Inserts `(key, value)` as the most recently used entry.
    ///
    /// An identical pair already cached is replaced rather than duplicated.
    /// At capacity, the globally least recently used entry is evicted first,
    /// whatever its key.
    pub fn put(&self, key: K, value: V)
    where
        V: PartialEq,
    {
        self.store.lock().insert(key, value);
    }

    // == Get ==
    /// Returns the least recently used value mapped to `key` and promotes
    /// that entry to most recently used.
    ///
    /// Repeated calls on a key with several values therefore cycle through
    /// them, oldest first.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let mut store = self.store.lock();
        match store.lru_handle(key) {
            Some(handle) => {
                let value = store.value(handle).cloned();
                store.promote(handle);
                store.stats_mut().record_hit();
                value
            }
            None => {
                store.stats_mut().record_miss();
                None
            }
        }
    }

    // == Pop ==
    /// Removes and returns the entry `get` would have returned.
    pub fn pop(&self, key: &K) -> Option<V> {
        let mut store = self.store.lock();
        let popped = store
            .lru_handle(key)
            .and_then(|handle| store.remove_handle(handle))
            .map(|(_, value)| value);
        match popped {
            Some(_) => store.stats_mut().record_hit(),
            None => store.stats_mut().record_miss(),
        }
        popped
    }

    // == Get Key ==
    /// Reverse lookup: returns the key of the least recently used entry
    /// holding `value`.
    ///
    /// When several keys map to equal values only that one key is returned.
    /// Recency is not changed.
    pub fn get_key(&self, value: &V) -> Option<K>
    where
        V: PartialEq,
    {
        self.store
            .lock()
            .iter_oldest_first()
            .find(|(_, _, v)| *v == value)
            .map(|(_, k, _)| k.clone())
    }

    // == Remove ==
    /// Removes every value mapped to `key`, in no particular order.
    pub fn remove(&self, key: &K) -> Vec<V> {
        self.store.lock().remove_key(key)
    }

    /// Removes the single entry holding `(key, value)`, if present.
    pub fn remove_value(&self, key: &K, value: &V) -> Option<V>
    where
        V: PartialEq,
    {
        let mut store = self.store.lock();
        let handle = store.find(key, value)?;
        store.remove_handle(handle).map(|(_, v)| v)
    }

    // == Size ==
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// True if adding an entry would evict the least recently used one.
    pub fn is_full(&self) -> bool {
        self.store.lock().is_full()
    }

    /// Returns the number of values mapped to `key`.
    pub fn value_range(&self, key: &K) -> usize {
        self.store.lock().value_range(key)
    }

    // == Snapshots ==
    /// Returns a copy of every `(key, value)` pair.
    pub fn entry_set(&self) -> BTreeSet<(K, V)>
    where
        K: Ord,
        V: Ord + Clone,
    {
        self.store
            .lock()
            .iter_oldest_first()
            .map(|(_, k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns a copy of the values mapped to `key`.
    pub fn value_set(&self, key: &K) -> BTreeSet<V>
    where
        V: Ord + Clone,
    {
        let store = self.store.lock();
        store
            .handles(key)
            .iter()
            .filter_map(|&h| store.value(h).cloned())
            .collect()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }
}
