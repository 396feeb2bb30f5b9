//! Index-wide parameters.
//!
//! Mirrors the shape of a configuration struct meant to be the
//! deserialization target for an external config loader: plain data,
//! `Clone + Debug + PartialEq + Serialize + Deserialize`, validated either
//! at construction or through setters that reject out-of-range values
//! rather than silently clamping them.

use crate::distance::DistanceFunction;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// 1/ln(2), the level multiplier that reproduces the canonical HNSW level
/// distribution when used with the textbook exponential formula. Kept here
/// as the documented default even though [`crate::hnsw::level::assign_level`]
/// uses the geometric draw described in the module's own docs; see that
/// module for the divergence.
pub const DEFAULT_LEVEL_MULTIPLIER: f32 = 0.693_147_2;

/// Index-wide configuration. Construct with [`HnswParams::new`], then adjust
/// fields through the setters, which validate range before applying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswParams {
    dimension: usize,
    m: u32,
    max_m: u32,
    ef_construction: u32,
    max_layers: u32,
    level_multiplier: f32,
    extend_candidates: bool,
    keep_pruned_connections: bool,
    distance_function: DistanceFunction,
    seed: Option<u64>,
}

impl HnswParams {
    /// Builds a parameter set for vectors of `dimension` with the
    /// documented defaults: `M=12`, `MaxM=24`, `EfConstruction=100`,
    /// `MaxLayers=16`, `LevelMultiplier=1/ln(2)`, both heuristic flags
    /// false, `Euclidean` distance, no fixed seed.
    pub fn new(dimension: usize) -> Result<Self, EngineError> {
        if !(1..=4096).contains(&dimension) {
            return Err(EngineError::InvalidDimension(format!(
                "dimension must be in 1..=4096, got {dimension}"
            )));
        }
        Ok(HnswParams {
            dimension,
            m: 12,
            max_m: 24,
            ef_construction: 100,
            max_layers: 16,
            level_multiplier: DEFAULT_LEVEL_MULTIPLIER,
            extend_candidates: false,
            keep_pruned_connections: false,
            distance_function: DistanceFunction::Euclidean,
            seed: None,
        })
    }

    /// Vector dimension this index was constructed for.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Target degree on layers >= 1.
    pub fn m(&self) -> u32 {
        self.m
    }

    /// Sets `M`. Must be in `2..=100`.
    pub fn set_m(&mut self, m: u32) -> Result<(), EngineError> {
        if !(2..=100).contains(&m) {
            return Err(EngineError::InvalidParameter(format!(
                "M must be in 2..=100, got {m}"
            )));
        }
        self.m = m;
        Ok(())
    }

    /// Target degree on layer 0.
    pub fn max_m(&self) -> u32 {
        self.max_m
    }

    /// Sets `MaxM`. Must be in `1..=200` and at least `M`.
    pub fn set_max_m(&mut self, max_m: u32) -> Result<(), EngineError> {
        if !(1..=200).contains(&max_m) || max_m < self.m {
            return Err(EngineError::InvalidParameter(format!(
                "MaxM must be in 1..=200 and >= M ({}), got {max_m}",
                self.m
            )));
        }
        self.max_m = max_m;
        Ok(())
    }

    /// Beam width during insertion.
    pub fn ef_construction(&self) -> u32 {
        self.ef_construction
    }

    /// Sets `EfConstruction`. Must be in `1..=2000`.
    pub fn set_ef_construction(&mut self, ef: u32) -> Result<(), EngineError> {
        if !(1..=2000).contains(&ef) {
            return Err(EngineError::InvalidParameter(format!(
                "EfConstruction must be in 1..=2000, got {ef}"
            )));
        }
        self.ef_construction = ef;
        Ok(())
    }

    /// Maximum top layer a node may be assigned.
    pub fn max_layers(&self) -> u32 {
        self.max_layers
    }

    /// Sets `MaxLayers`. Must be in `1..=64`.
    pub fn set_max_layers(&mut self, max_layers: u32) -> Result<(), EngineError> {
        if !(1..=64).contains(&max_layers) {
            return Err(EngineError::InvalidParameter(format!(
                "MaxLayers must be in 1..=64, got {max_layers}"
            )));
        }
        self.max_layers = max_layers;
        Ok(())
    }

    /// Coefficient for the level-assignment distribution.
    pub fn level_multiplier(&self) -> f32 {
        self.level_multiplier
    }

    /// Sets `LevelMultiplier`. Must be finite and in `(0.0, 2.0]`.
    pub fn set_level_multiplier(&mut self, level_multiplier: f32) -> Result<(), EngineError> {
        if !level_multiplier.is_finite() || level_multiplier <= 0.0 || level_multiplier > 2.0 {
            return Err(EngineError::InvalidParameter(format!(
                "LevelMultiplier must be finite and in (0.0, 2.0], got {level_multiplier}"
            )));
        }
        self.level_multiplier = level_multiplier;
        Ok(())
    }

    /// Whether neighbor selection extends into discarded candidates when
    /// the primary pass doesn't fill the target degree.
    pub fn extend_candidates(&self) -> bool {
        self.extend_candidates
    }

    /// Sets `ExtendCandidates`.
    pub fn set_extend_candidates(&mut self, extend_candidates: bool) {
        self.extend_candidates = extend_candidates;
    }

    /// Recognized for compatibility with exported state from other
    /// implementations; has no effect on neighbor selection in this crate.
    pub fn keep_pruned_connections(&self) -> bool {
        self.keep_pruned_connections
    }

    /// Sets `KeepPrunedConnections`. See [`Self::keep_pruned_connections`].
    pub fn set_keep_pruned_connections(&mut self, keep_pruned_connections: bool) {
        self.keep_pruned_connections = keep_pruned_connections;
    }

    /// The configured distance function.
    pub fn distance_function(&self) -> DistanceFunction {
        self.distance_function
    }

    /// Sets the distance function.
    pub fn set_distance_function(&mut self, distance_function: DistanceFunction) {
        self.distance_function = distance_function;
    }

    /// The fixed RNG seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Sets the RNG seed. `None` re-seeds from entropy on next engine
    /// construction.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }
}
