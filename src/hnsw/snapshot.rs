//! Exported index state, per the state serialization format.
//!
//! Encoding is `serde`/`serde_json`, matching the teacher crate's choice
//! of `serde` as the encoding layer for every on-disk or on-wire
//! structure.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single node's exported state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    /// The node's id.
    pub id: u128,
    /// The node's vector.
    pub vector: Vec<f32>,
    /// The node's top layer.
    pub layer: u32,
    /// Neighbor ids by layer.
    pub neighbors: HashMap<u32, Vec<u128>>,
}

/// The full exported state of an [`crate::hnsw::engine::HnswEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexState {
    /// Vector dimension the index was built for.
    pub vector_dimension: usize,
    /// The index's parameters, serialized via [`crate::hnsw::config::HnswParams`].
    pub parameters: crate::hnsw::config::HnswParams,
    /// The current entry point, if any.
    pub entry_point_id: Option<u128>,
    /// Every node's state. Order is unspecified.
    pub nodes: Vec<NodeState>,
}

impl IndexState {
    /// Serializes to the crate's default JSON encoding.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes from the crate's default JSON encoding.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::config::HnswParams;

    #[test]
    fn json_round_trips() {
        let mut neighbors = HashMap::new();
        neighbors.insert(0, vec![2, 3]);
        let state = IndexState {
            vector_dimension: 2,
            parameters: HnswParams::new(2).unwrap(),
            entry_point_id: Some(1),
            nodes: vec![NodeState {
                id: 1,
                vector: vec![1.0, 2.0],
                layer: 0,
                neighbors,
            }],
        };
        let json = state.to_json().unwrap();
        let back = IndexState::from_json(&json).unwrap();
        assert_eq!(state, back);
    }
}
