//! Pluggable storage collaborators the engine is built against.
//!
//! [`NodeStore`] and [`LayerStore`] are `dyn`-compatible traits so a caller
//! can swap the in-process reference implementation ([`memory`]) for a
//! disk-backed or networked one without touching [`crate::hnsw::engine`].
//! Reads return owned snapshots (a [`NodeHandle`] clones its vector and
//! neighbor map) rather than borrowed references: the store is expected to
//! take its own lock for the duration of a single call, and a snapshot
//! sidesteps aliasing a mutable structure across an `&dyn Trait` boundary.

pub mod memory;

use crate::error::StoreError;
use std::collections::{HashMap, HashSet};

/// An owned snapshot of one node's state at the moment it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHandle {
    /// The node's identifier.
    pub id: u128,
    /// The node's stored vector.
    pub vector: Vec<f32>,
    /// Neighbor ids by layer, at the time of the read.
    pub neighbors: HashMap<u32, HashSet<u128>>,
}

impl NodeHandle {
    /// Neighbor ids at a given layer, or an empty set if the node has none
    /// there.
    pub fn neighbors_at(&self, layer: u32) -> HashSet<u128> {
        self.neighbors.get(&layer).cloned().unwrap_or_default()
    }
}

/// Storage for node vectors and their per-layer neighbor sets.
///
/// Implementations must make mutations visible to subsequent `get` calls
/// from any handle holder (there is no live aliasing, only read-after-write
/// consistency). The engine assumes single-writer access, enforced by its
/// own write guard; a [`NodeStore`] is free to allow concurrent readers.
pub trait NodeStore: Send + Sync {
    /// Creates a node with an empty neighbor set. Overwrites any existing
    /// node with the same id.
    fn add(&self, id: u128, vector: Vec<f32>) -> Result<(), StoreError>;

    /// Creates many nodes atomically with respect to readers: either all
    /// are visible after the call returns, or (on error) none are.
    fn add_many(&self, items: Vec<(u128, Vec<f32>)>) -> Result<(), StoreError>;

    /// Removes a node and its neighbor sets. Idempotent: removing an
    /// absent id is not an error.
    fn remove(&self, id: u128);

    /// Removes many nodes. Idempotent per id.
    fn remove_many(&self, ids: &[u128]);

    /// Reads a node. Fails with [`StoreError::NodeNotFound`] if absent.
    fn get(&self, id: u128) -> Result<NodeHandle, StoreError>;

    /// Reads a node, returning `None` rather than failing if absent.
    fn try_get(&self, id: u128) -> Option<NodeHandle>;

    /// Reads every id in `ids` that is present, in one call. Absent ids are
    /// silently omitted.
    fn get_many(&self, ids: &[u128]) -> Vec<NodeHandle>;

    /// Every id currently present, in unspecified order.
    fn all_ids(&self) -> Vec<u128>;

    /// Number of nodes currently present.
    fn count(&self) -> usize;

    /// The current entry point, if the store is non-empty.
    fn entry_point(&self) -> Option<u128>;

    /// Sets the entry point. Fails with [`StoreError::DanglingEntryPoint`]
    /// if `Some(id)` is given for an id not present in the store.
    fn set_entry_point(&self, id: Option<u128>) -> Result<(), StoreError>;

    /// Adds a directed edge `id -> neighbor` at `layer`. A no-op if
    /// `id == neighbor` (self-loops are never recorded) or if the edge
    /// already exists.
    fn add_neighbor(&self, id: u128, layer: u32, neighbor: u128) -> Result<(), StoreError>;

    /// Removes a directed edge `id -> neighbor` at `layer`. Idempotent.
    fn remove_neighbor(&self, id: u128, layer: u32, neighbor: u128) -> Result<(), StoreError>;

    /// Replaces the full neighbor set at `layer` for `id`. Used after
    /// pruning rebuilds a neighbor list and during import, where the
    /// target set is already known and doesn't need an edge-by-edge diff.
    fn set_neighbors(
        &self,
        id: u128,
        layer: u32,
        neighbors: HashSet<u128>,
    ) -> Result<(), StoreError>;
}

/// Storage for each node's assigned top layer.
pub trait LayerStore: Send + Sync {
    /// The node's top layer, or `0` if it has none recorded.
    fn get_layer(&self, id: u128) -> u32;

    /// Records `id`'s top layer.
    fn set_layer(&self, id: u128, layer: u32);

    /// Forgets `id`'s layer assignment. Idempotent.
    fn remove_layer(&self, id: u128);

    /// Every recorded `(id, layer)` pair.
    fn all_layers(&self) -> HashMap<u128, u32>;

    /// Forgets every layer assignment.
    fn clear(&self);

    /// Number of recorded layer assignments.
    fn count(&self) -> usize;
}
