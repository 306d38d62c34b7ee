//! Hash index from an equality key to a bucket of elements.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexSet;
use tupleflow_core::ConsistencyError;

/// Partitions elements by key.
///
/// The index remembers the key each element was stored under, so removal
/// takes only the element; the caller never recomputes the key from facts
/// that may have changed since.
///
/// Buckets keep insertion order, which makes join output deterministic.
#[derive(Debug)]
pub struct EqualityIndex<K, T> {
    buckets: HashMap<K, IndexSet<T>>,
    keys: HashMap<T, K>,
    empty: IndexSet<T>,
}

impl<K, T> Default for EqualityIndex<K, T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            keys: HashMap::new(),
            empty: IndexSet::new(),
        }
    }
}

impl<K, T> EqualityIndex<K, T>
where
    K: Eq + Hash + Clone + Debug,
    T: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `element` under `key`.
    pub fn put(&mut self, key: K, element: T) -> Result<(), ConsistencyError> {
        if self.keys.contains_key(&element) {
            return Err(ConsistencyError::duplicate("EqualityIndex::put", element));
        }
        self.buckets.entry(key.clone()).or_default().insert(element);
        self.keys.insert(element, key);
        Ok(())
    }

    /// Removes `element`, returning the key it was stored under.
    ///
    /// Emptied buckets are dropped.
    pub fn remove(&mut self, element: T) -> Result<K, ConsistencyError> {
        let key = self
            .keys
            .remove(&element)
            .ok_or_else(|| ConsistencyError::missing("EqualityIndex::remove", element))?;
        let bucket = self
            .buckets
            .get_mut(&key)
            .ok_or_else(|| ConsistencyError::missing("EqualityIndex::remove", &key))?;
        if !bucket.shift_remove(&element) {
            return Err(ConsistencyError::missing("EqualityIndex::remove", element));
        }
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        Ok(key)
    }

    /// Elements stored under `key`; empty if the key was never seen.
    pub fn get(&self, key: &K) -> &IndexSet<T> {
        self.buckets.get(key).unwrap_or(&self.empty)
    }

    /// The key `element` is stored under.
    pub fn key_of(&self, element: T) -> Option<&K> {
        self.keys.get(&element)
    }

    pub fn contains(&self, element: T) -> bool {
        self.keys.contains_key(&element)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.keys.clear();
    }
}
