//! Per-operation node cache used during graph traversal.
//!
//! Layer search revisits the same nodes repeatedly (a candidate is read
//! once to expand its neighbors, then again if one of those neighbors
//! leads back to it). Without a cache, every distance computation would
//! trigger a store read; with one, each node is read from the store at
//! most once per operation. The cache belongs to a single call and is
//! never shared across queries, so it cannot go stale from a concurrent
//! write the way a shared cache would.

use crate::error::StoreError;
use crate::store::{NodeHandle, NodeStore};
use std::cell::RefCell;
use std::collections::HashMap;

/// Wraps a [`NodeStore`] with a read cache scoped to one traversal.
pub struct SearchContext<'a> {
    store: &'a dyn NodeStore,
    cache: RefCell<HashMap<u128, NodeHandle>>,
}

impl<'a> SearchContext<'a> {
    /// Creates a context over `store` with an empty cache.
    pub fn new(store: &'a dyn NodeStore) -> Self {
        SearchContext {
            store,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Reads a node, populating the cache on a miss. Fails with
    /// [`StoreError::NodeNotFound`] if the node is absent from the store.
    pub fn get(&self, id: u128) -> Result<NodeHandle, StoreError> {
        if let Some(handle) = self.cache.borrow().get(&id) {
            return Ok(handle.clone());
        }
        let handle = self.store.get(id)?;
        self.cache.borrow_mut().insert(id, handle.clone());
        Ok(handle)
    }

    /// Reads a node without failing if it's absent, populating the cache
    /// only on a hit.
    pub fn try_get(&self, id: u128) -> Option<NodeHandle> {
        if let Some(handle) = self.cache.borrow().get(&id) {
            return Some(handle.clone());
        }
        let handle = self.store.try_get(id)?;
        self.cache.borrow_mut().insert(id, handle.clone());
        Some(handle)
    }

    /// Reads every id in `ids` not already cached in a single store call,
    /// then returns every present handle (cached or freshly read).
    pub fn get_many(&self, ids: &[u128]) -> Vec<NodeHandle> {
        self.prefetch(ids);
        let cache = self.cache.borrow();
        ids.iter().filter_map(|id| cache.get(id).cloned()).collect()
    }

    /// Ensures every id in `ids` is cached, issuing one batched store read
    /// for whichever ids are currently missing.
    pub fn prefetch(&self, ids: &[u128]) {
        let missing: Vec<u128> = {
            let cache = self.cache.borrow();
            ids.iter().filter(|id| !cache.contains_key(id)).copied().collect()
        };
        if missing.is_empty() {
            return;
        }
        let fetched = self.store.get_many(&missing);
        let mut cache = self.cache.borrow_mut();
        for handle in fetched {
            cache.insert(handle.id, handle);
        }
    }

    /// Number of distinct nodes read through this context so far.
    pub fn cached_count(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryNodeStore;

    #[test]
    fn repeated_get_hits_cache_not_store() {
        let store = InMemoryNodeStore::new();
        store.add(1, vec![1.0]).unwrap();
        let ctx = SearchContext::new(&store);
        ctx.get(1).unwrap();
        store.remove(1);
        // Cached, so still readable even though the backing store no
        // longer has it.
        assert_eq!(ctx.get(1).unwrap().vector, vec![1.0]);
    }

    #[test]
    fn prefetch_populates_multiple_ids_in_one_pass() {
        let store = InMemoryNodeStore::new();
        store.add(1, vec![1.0]).unwrap();
        store.add(2, vec![2.0]).unwrap();
        let ctx = SearchContext::new(&store);
        ctx.prefetch(&[1, 2, 3]);
        assert_eq!(ctx.cached_count(), 2);
    }

    #[test]
    fn try_get_absent_id_returns_none_without_caching() {
        let store = InMemoryNodeStore::new();
        let ctx = SearchContext::new(&store);
        assert!(ctx.try_get(1).is_none());
        assert_eq!(ctx.cached_count(), 0);
    }
}
