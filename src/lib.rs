//! An in-process Hierarchical Navigable Small World (HNSW) graph index for
//! approximate k-nearest-neighbor search over fixed-dimension `f32`
//! vectors.
//!
//! The index is built from a handful of small, independently testable
//! pieces: a closed set of distance functions ([`distance`]), a
//! deterministic priority queue ([`heap`]), a pluggable storage pair
//! ([`store`]) that the engine is written against rather than a concrete
//! data structure, a per-operation traversal cache ([`context`]), and the
//! [`hnsw`] module proper, which wires all of the above into insert,
//! delete, and query.
//!
//! ```
//! use hnsw_graph_engine::cancel::CancellationToken;
//! use hnsw_graph_engine::hnsw::HnswEngine;
//! use hnsw_graph_engine::store::memory::{InMemoryLayerStore, InMemoryNodeStore};
//!
//! let engine = HnswEngine::new(
//!     2,
//!     Box::new(InMemoryNodeStore::new()),
//!     Box::new(InMemoryLayerStore::new()),
//!     Some(42),
//! )
//! .unwrap();
//! let cancel = CancellationToken::never();
//! engine.insert(1, vec![0.0, 0.0], &cancel).unwrap();
//! engine.insert(2, vec![3.0, 4.0], &cancel).unwrap();
//! let results = engine.query(&[3.0, 4.0], 1, None, &cancel).unwrap();
//! assert_eq!(results[0].id, 2);
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

/// Cooperative cancellation for long-running engine calls.
pub mod cancel;
/// Per-operation node read cache used during traversal.
pub mod context;
/// Distance functions over fixed-length vectors.
pub mod distance;
/// The crate's unified error hierarchy.
pub mod error;
/// The bounded, deterministic priority queue used by the search primitives.
pub mod heap;
/// The HNSW graph index itself.
pub mod hnsw;
/// Pluggable node/layer storage collaborators.
pub mod store;

pub use cancel::CancellationToken;
pub use distance::DistanceFunction;
pub use error::{EngineError, Result};
pub use hnsw::{HnswEngine, HnswParams, IndexState, QueryResult};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{InMemoryLayerStore, InMemoryNodeStore};

    #[test]
    fn doctest_shape_also_works_through_the_public_re_exports() {
        let engine = HnswEngine::new(
            1,
            Box::new(InMemoryNodeStore::new()),
            Box::new(InMemoryLayerStore::new()),
            Some(1),
        )
        .unwrap();
        let cancel = CancellationToken::never();
        engine.insert(1, vec![1.0], &cancel).unwrap();
        assert_eq!(engine.len(), 1);
    }
}
