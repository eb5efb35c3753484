//! Bounded key/value cache with insertion-order (FIFO) eviction.
//!
//! Reads never touch the eviction order: the oldest *inserted* entry is the
//! first to go once the cache grows past its capacity. Re-inserting a key
//! that is already present replaces the value in place and keeps its
//! original position.

use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Default size of the whole-document cache.
pub const DOCUMENT_CACHE_CAPACITY: usize = 100;
/// Default size of the per-block HTML cache.
pub const BLOCK_CACHE_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct FifoCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> FifoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// A capacity of zero disables caching: every insert is dropped.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Inserts `value`, evicting the oldest entries while over capacity.
    /// Returns the number of evicted entries.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return 0;
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_first_inserted_key_past_capacity() {
        let mut cache = FifoCache::new(DOCUMENT_CACHE_CAPACITY);
        for i in 0..=DOCUMENT_CACHE_CAPACITY {
            cache.insert(format!("doc-{i}"), i);
        }
        assert_eq!(cache.len(), DOCUMENT_CACHE_CAPACITY);
        assert!(!cache.contains_key("doc-0"));
        assert!(cache.contains_key("doc-1"));
        assert!(cache.contains_key(&format!("doc-{DOCUMENT_CACHE_CAPACITY}")));
    }

    #[test]
    fn reads_do_not_protect_from_eviction() {
        let mut cache = FifoCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        // "a" is hot but still the oldest insert.
        for _ in 0..10 {
            assert_eq!(cache.get("a"), Some(&1));
        }
        assert_eq!(cache.insert("c", 3), 1);
        assert!(!cache.contains_key("a"));
        assert_eq!(cache.get("b"), Some(&2));
        assert_eq!(cache.get("c"), Some(&3));
    }

    #[test]
    fn reinsert_replaces_value_without_moving_it() {
        let mut cache = FifoCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(&10));

        cache.insert("c", 3);
        assert!(!cache.contains_key("a"));
        assert!(cache.contains_key("b"));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = FifoCache::new(0);
        cache.insert("a", 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn clear_resets_order() {
        let mut cache = FifoCache::new(BLOCK_CACHE_CAPACITY);
        cache.insert(1u32, "one");
        cache.clear();
        assert!(cache.is_empty());
        cache.insert(2u32, "two");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), BLOCK_CACHE_CAPACITY);
    }
}
