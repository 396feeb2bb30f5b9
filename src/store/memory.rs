//! In-process reference implementations of [`super::NodeStore`] and
//! [`super::LayerStore`], backed by a `Mutex`-guarded `HashMap`.
//!
//! This is the default collaborator pair used by [`crate::hnsw::engine`]
//! when a caller doesn't supply its own; it is also what the crate's own
//! tests run against. A disk-backed or networked implementation can be
//! substituted without any change to the engine, since both traits are
//! object-safe.

use super::{LayerStore, NodeHandle, NodeStore};
use crate::error::StoreError;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

struct Node {
    vector: Vec<f32>,
    neighbors: HashMap<u32, HashSet<u128>>,
}

/// A `Mutex<HashMap<..>>`-backed [`NodeStore`].
#[derive(Default)]
pub struct InMemoryNodeStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<u128, Node>,
    entry_point: Option<u128>,
}

impl InMemoryNodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(id: u128, node: &Node) -> NodeHandle {
        NodeHandle {
            id,
            vector: node.vector.clone(),
            neighbors: node.neighbors.clone(),
        }
    }
}

impl NodeStore for InMemoryNodeStore {
    fn add(&self, id: u128, vector: Vec<f32>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        inner.nodes.insert(
            id,
            Node {
                vector,
                neighbors: HashMap::new(),
            },
        );
        Ok(())
    }

    fn add_many(&self, items: Vec<(u128, Vec<f32>)>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        for (id, vector) in items {
            inner.nodes.insert(
                id,
                Node {
                    vector,
                    neighbors: HashMap::new(),
                },
            );
        }
        Ok(())
    }

    fn remove(&self, id: u128) {
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        inner.nodes.remove(&id);
        if inner.entry_point == Some(id) {
            inner.entry_point = None;
        }
    }

    fn remove_many(&self, ids: &[u128]) {
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        for id in ids {
            inner.nodes.remove(id);
            if inner.entry_point == Some(*id) {
                inner.entry_point = None;
            }
        }
    }

    fn get(&self, id: u128) -> Result<NodeHandle, StoreError> {
        let inner = self.inner.lock().expect("node store mutex poisoned");
        inner
            .nodes
            .get(&id)
            .map(|n| Self::snapshot(id, n))
            .ok_or(StoreError::NodeNotFound(id))
    }

    fn try_get(&self, id: u128) -> Option<NodeHandle> {
        let inner = self.inner.lock().expect("node store mutex poisoned");
        inner.nodes.get(&id).map(|n| Self::snapshot(id, n))
    }

    fn get_many(&self, ids: &[u128]) -> Vec<NodeHandle> {
        let inner = self.inner.lock().expect("node store mutex poisoned");
        ids.iter()
            .filter_map(|id| inner.nodes.get(id).map(|n| Self::snapshot(*id, n)))
            .collect()
    }

    fn all_ids(&self) -> Vec<u128> {
        let inner = self.inner.lock().expect("node store mutex poisoned");
        inner.nodes.keys().copied().collect()
    }

    fn count(&self) -> usize {
        let inner = self.inner.lock().expect("node store mutex poisoned");
        inner.nodes.len()
    }

    fn entry_point(&self) -> Option<u128> {
        let inner = self.inner.lock().expect("node store mutex poisoned");
        inner.entry_point
    }

    fn set_entry_point(&self, id: Option<u128>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        if let Some(id) = id {
            if !inner.nodes.contains_key(&id) {
                return Err(StoreError::DanglingEntryPoint(id));
            }
        }
        inner.entry_point = id;
        Ok(())
    }

    fn add_neighbor(&self, id: u128, layer: u32, neighbor: u128) -> Result<(), StoreError> {
        if id == neighbor {
            return Ok(());
        }
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        let node = inner
            .nodes
            .get_mut(&id)
            .ok_or(StoreError::NodeNotFound(id))?;
        node.neighbors.entry(layer).or_default().insert(neighbor);
        Ok(())
    }

    fn remove_neighbor(&self, id: u128, layer: u32, neighbor: u128) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        if let Some(node) = inner.nodes.get_mut(&id) {
            if let Some(set) = node.neighbors.get_mut(&layer) {
                set.remove(&neighbor);
            }
        }
        Ok(())
    }

    fn set_neighbors(
        &self,
        id: u128,
        layer: u32,
        neighbors: HashSet<u128>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("node store mutex poisoned");
        let neighbors: HashSet<u128> = neighbors.into_iter().filter(|n| *n != id).collect();
        let node = inner
            .nodes
            .get_mut(&id)
            .ok_or(StoreError::NodeNotFound(id))?;
        node.neighbors.insert(layer, neighbors);
        Ok(())
    }
}

/// A `Mutex<HashMap<..>>`-backed [`LayerStore`].
#[derive(Default)]
pub struct InMemoryLayerStore {
    inner: Mutex<HashMap<u128, u32>>,
}

impl InMemoryLayerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerStore for InMemoryLayerStore {
    fn get_layer(&self, id: u128) -> u32 {
        let inner = self.inner.lock().expect("layer store mutex poisoned");
        inner.get(&id).copied().unwrap_or(0)
    }

    fn set_layer(&self, id: u128, layer: u32) {
        let mut inner = self.inner.lock().expect("layer store mutex poisoned");
        inner.insert(id, layer);
    }

    fn remove_layer(&self, id: u128) {
        let mut inner = self.inner.lock().expect("layer store mutex poisoned");
        inner.remove(&id);
    }

    fn all_layers(&self) -> HashMap<u128, u32> {
        let inner = self.inner.lock().expect("layer store mutex poisoned");
        inner.clone()
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().expect("layer store mutex poisoned");
        inner.clear();
    }

    fn count(&self) -> usize {
        let inner = self.inner.lock().expect("layer store mutex poisoned");
        inner.len()
    }
}
