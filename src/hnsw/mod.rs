//! HNSW graph index: configuration, level assignment, neighbor selection,
//! traversal primitives, the engine that ties them together, and state
//! serialization.

/// Index-wide configuration.
pub mod config;
/// The engine: insert/remove/query/export/import.
pub mod engine;
/// Level assignment.
pub mod level;
/// Neighbor selection heuristic.
pub mod neighbor;
/// Greedy descent and `ef`-bounded beam search.
pub mod search;
/// Exported state format.
pub mod snapshot;

pub use config::HnswParams;
pub use engine::{HnswEngine, QueryResult};
pub use snapshot::{IndexState, NodeState};
