//! Multimap Store Module
//!
//! Unsynchronized cache engine combining a key index with the recency list.
//! Every method here assumes the caller already holds the cache lock, so
//! helpers compose freely without re-acquiring it.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use crate::cache::lru::{Handle, OldestFirst, RecencyList};
use crate::cache::CacheStats;

// == Multimap Store ==
/// Multimap storage with LRU eviction.
///
/// One key may own several entries; a `(key, value)` pair is unique.
#[derive(Debug)]
pub(crate) struct MultimapStore<K, V> {
    /// Key to entry handles, in insertion order per key
    index: HashMap<K, Vec<Handle>>,
    /// Entries in global recency order
    order: RecencyList<K, V>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries, 0 = unbounded
    capacity: usize,
}

impl<K, V> MultimapStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty store. A capacity of 0 disables the bound.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            order: RecencyList::new(),
            stats: CacheStats::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Insert ==
    /// Stores a `(key, value)` pair as the most recently used entry.
    ///
    /// An identical pair already present is removed first. When the store is
    /// full the globally least recently used entry is evicted before the new
    /// one is admitted.
    pub fn insert(&mut self, key: K, value: V) -> Handle
    where
        V: PartialEq,
    {
        if let Some(duplicate) = self.find(&key, &value) {
            self.remove_handle(duplicate);
        }

        if self.is_full() {
            self.evict_oldest();
        }

        let handle = self.order.push_front(key.clone(), value);
        self.index.entry(key).or_default().push(handle);
        handle
    }

    // == Lookup ==
    /// Finds the entry holding exactly `(key, value)`.
    pub fn find(&self, key: &K, value: &V) -> Option<Handle>
    where
        V: PartialEq,
    {
        self.handles(key)
            .iter()
            .copied()
            .find(|&h| self.order.value(h) == Some(value))
    }

    /// Finds the least recently used entry among those mapped to `key`.
    pub fn lru_handle(&self, key: &K) -> Option<Handle> {
        self.handles(key)
            .iter()
            .copied()
            .min_by_key(|&h| self.order.stamp(h).unwrap_or(u64::MAX))
    }

    /// Handles of every entry mapped to `key`.
    pub fn handles(&self, key: &K) -> &[Handle] {
        self.index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn value(&self, handle: Handle) -> Option<&V> {
        self.order.value(handle)
    }

    // == Promote ==
    /// Marks an entry as most recently used.
    pub fn promote(&mut self, handle: Handle) {
        self.order.touch(handle);
    }

    // == Remove ==
    /// Removes a single entry from both the index and the recency list.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let (key, value) = self.order.remove(handle)?;
        self.unindex(&key, handle);
        Some((key, value))
    }

    fn unindex(&mut self, key: &K, handle: Handle) {
        if let Some(handles) = self.index.get_mut(key) {
            handles.retain(|&h| h != handle);
            if handles.is_empty() {
                self.index.remove(key);
            }
        }
    }

    /// Removes every entry mapped to `key`, returning their values.
    pub fn remove_key(&mut self, key: &K) -> Vec<V> {
        let handles = self.index.remove(key).unwrap_or_default();
        handles
            .into_iter()
            .filter_map(|h| self.order.remove(h))
            .map(|(_, value)| value)
            .collect()
    }

    // == Evict Oldest ==
    /// Evicts the globally least recently used entry.
    pub fn evict_oldest(&mut self) -> Option<(K, V)> {
        let (handle, key, value) = self.order.evict_oldest()?;
        self.unindex(&key, handle);
        self.stats.record_eviction();
        trace!(remaining = self.order.len(), "evicted least recently used entry");
        Some((key, value))
    }

    // == Iteration ==
    /// Walks entries from least to most recently used.
    pub fn iter_oldest_first(&self) -> OldestFirst<'_, K, V> {
        self.order.iter_oldest_first()
    }

    // == Size ==
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// True when a new entry cannot be admitted without an eviction.
    pub fn is_full(&self) -> bool {
        self.capacity != 0 && self.order.len() >= self.capacity
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Number of entries mapped to `key`.
    pub fn value_range(&self, key: &K) -> usize {
        self.handles(key).len()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    // == Stats ==
    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.order.len());
        stats
    }
}
