//! Recency List Module
//!
//! Arena-backed doubly-linked list holding every cache entry in recency order.

// == Handle ==
/// Stable reference to an entry inside the recency arena.
///
/// Slots are recycled once their entry is removed. The handle also carries
/// the id its entry was created with, so a stale handle resolves to nothing
/// instead of to whichever entry took over the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle {
    index: usize,
    id: u64,
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    /// Creation id, never reused within one list
    id: u64,
    /// Monotonic touch counter, larger = more recent
    stamp: u64,
    /// Neighbour towards the front (more recent)
    prev: Option<usize>,
    /// Neighbour towards the back (less recent)
    next: Option<usize>,
}

// == Recency List ==
/// Tracks access order over all entries for LRU eviction.
///
/// Entries are linked where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    front: Option<usize>,
    back: Option<usize>,
    len: usize,
    tick: u64,
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RecencyList<K, V> {
    // == Constructor ==
    /// Creates a new empty recency list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            front: None,
            back: None,
            len: 0,
            tick: 0,
        }
    }

    // == Push Front ==
    /// Inserts a new entry as the most recently used one.
    pub fn push_front(&mut self, key: K, value: V) -> Handle {
        let stamp = self.next_stamp();
        let node = Node {
            key,
            value,
            id: stamp,
            stamp,
            prev: None,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        self.link_front(index);
        self.len += 1;
        Handle { index, id: stamp }
    }

    // == Touch ==
    /// Marks an entry as recently used (moves it to the front).
    pub fn touch(&mut self, handle: Handle) {
        if self.node(handle).is_none() {
            return;
        }
        let stamp = self.next_stamp();
        self.unlink(handle.index);
        self.link_front(handle.index);
        if let Some(node) = self.slots[handle.index].as_mut() {
            node.stamp = stamp;
        }
    }

    // == Remove ==
    /// Removes an entry and hands back its key and value.
    pub fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        self.node(handle)?;
        self.unlink(handle.index);
        let node = self.slots[handle.index].take()?;
        self.free.push(handle.index);
        self.len -= 1;
        Some((node.key, node.value))
    }

    // == Peek Oldest ==
    /// Returns the least recently used entry without removing it.
    pub fn peek_oldest(&self) -> Option<Handle> {
        self.back.and_then(|index| self.handle_at(index))
    }

    // == Evict Oldest ==
    /// Removes the least recently used entry, returning its former handle
    /// along with its key and value.
    ///
    /// Returns None if the list is empty.
    pub fn evict_oldest(&mut self) -> Option<(Handle, K, V)> {
        let handle = self.peek_oldest()?;
        let (key, value) = self.remove(handle)?;
        Some((handle, key, value))
    }

    // == Accessors ==
    pub fn value(&self, handle: Handle) -> Option<&V> {
        self.node(handle).map(|node| &node.value)
    }

    /// Recency stamp of an entry; a smaller stamp was touched longer ago.
    pub fn stamp(&self, handle: Handle) -> Option<u64> {
        self.node(handle).map(|node| node.stamp)
    }

    // == Iteration ==
    /// Walks entries from least to most recently used.
    pub fn iter_oldest_first(&self) -> OldestFirst<'_, K, V> {
        OldestFirst {
            list: self,
            cursor: self.back,
        }
    }

    // == Length ==
    /// Returns the number of tracked entries.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.front = None;
        self.back = None;
        self.len = 0;
    }

    fn node(&self, handle: Handle) -> Option<&Node<K, V>> {
        self.slots
            .get(handle.index)
            .and_then(Option::as_ref)
            .filter(|node| node.id == handle.id)
    }

    fn handle_at(&self, index: usize) -> Option<Handle> {
        let node = self.slots.get(index)?.as_ref()?;
        Some(Handle { index, id: node.id })
    }

    fn next_stamp(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn link_front(&mut self, index: usize) {
        let old_front = self.front;
        if let Some(node) = self.slots[index].as_mut() {
            node.prev = None;
            node.next = old_front;
        }
        match old_front {
            Some(front) => {
                if let Some(node) = self.slots[front].as_mut() {
                    node.prev = Some(index);
                }
            }
            None => self.back = Some(index),
        }
        self.front = Some(index);
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = match self.slots[index].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.slots[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.front = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.slots[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.back = prev,
        }
    }
}

// == Oldest-First Iterator ==
pub(crate) struct OldestFirst<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for OldestFirst<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = self.list.slots[index].as_ref()?;
        self.cursor = node.prev;
        Some((Handle { index, id: node.id }, &node.key, &node.value))
    }
}
