//! Unified error hierarchy for the engine.
//!
//! - [`EngineError`] — top-level error wrapping every component error
//! - [`DistanceError`] — raised by the distance functions in [`crate::distance`]
//! - [`HeapError`] — raised by the priority queue in [`crate::heap`]
//! - [`StoreError`] — raised by [`crate::store`] implementations

use thiserror::Error;

/// Errors raised by distance function evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DistanceError {
    /// The two vectors being compared have different lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the first vector.
        expected: usize,
        /// Length of the second vector.
        actual: usize,
    },
    /// One of the two vectors was empty where a value was required.
    #[error("null vector: a required vector argument was empty")]
    NullVector,
}

/// Errors raised by the bounded priority queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    /// Pop or peek was called on an empty heap.
    #[error("heap is empty")]
    EmptyHeap,
    /// A non-finite priority (NaN or +/-Infinity) was pushed.
    #[error("invalid priority: priorities must be finite")]
    InvalidPriority,
}

/// Errors raised by node/layer store implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The requested node id is not present in the store.
    #[error("node {0} not found")]
    NodeNotFound(u128),
    /// The entry point was set to an id not present in the store.
    #[error("entry point {0} is not a present node")]
    DanglingEntryPoint(u128),
    /// A vector with the wrong dimensionality was passed to the store.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured for the store.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
}

/// The unified engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Vector length did not match the configured dimension, or the
    /// configured dimension itself was out of the allowed range.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    /// A required vector or id argument was absent.
    #[error("null argument: {0}")]
    NullArgument(String),

    /// A parameter setter received a value outside its documented range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A node store or layer store collaborator was not supplied.
    #[error("null store: {0}")]
    NullStore(String),

    /// An internal invariant was violated (see the data model invariants).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The operation observed a cancellation signal before completing.
    #[error("operation cancelled")]
    Cancelled,

    /// Propagated from a distance function.
    #[error(transparent)]
    Distance(#[from] DistanceError),

    /// Propagated from the priority queue.
    #[error(transparent)]
    Heap(#[from] HeapError),

    /// Propagated from a node or layer store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Propagated from (de)serializing exported state.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
