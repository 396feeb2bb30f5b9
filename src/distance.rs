//! Distance functions over fixed-length `f32` vectors.
//!
//! Kept as a closed tagged enum rather than a trait object: the engine's
//! hot loop (`ef_search`) dispatches on a [`DistanceFunction`] once per
//! traversal rather than once per comparison, so the match compiles down to
//! a direct call at each call site instead of a vtable indirection.

use crate::error::DistanceError;
use serde::{Deserialize, Serialize};

/// A metric over two equal-length `f32` vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceFunction {
    /// `sqrt(sum((a_i - b_i)^2))`.
    Euclidean,
    /// `1 - (a . b) / (|a| * |b|)`, or `1` if either vector is all-zero.
    Cosine,
    /// `-(a . b)`.
    DotProduct,
}

impl DistanceFunction {
    /// Parses the wire name used in [`crate::hnsw::config::HnswParams`].
    /// An unrecognized name falls back to [`DistanceFunction::Euclidean`],
    /// matching the import behavior documented for engine state.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Cosine" => DistanceFunction::Cosine,
            "DotProduct" => DistanceFunction::DotProduct,
            _ => DistanceFunction::Euclidean,
        }
    }

    /// The canonical wire name, used when exporting state.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceFunction::Euclidean => "Euclidean",
            DistanceFunction::Cosine => "Cosine",
            DistanceFunction::DotProduct => "DotProduct",
        }
    }

    /// Evaluates the metric. Fails with [`DistanceError::DimensionMismatch`]
    /// if `a` and `b` differ in length, or [`DistanceError::NullVector`] if
    /// either is empty.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32, DistanceError> {
        if a.is_empty() || b.is_empty() {
            return Err(DistanceError::NullVector);
        }
        if a.len() != b.len() {
            return Err(DistanceError::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(match self {
            DistanceFunction::Euclidean => euclidean(a, b),
            DistanceFunction::Cosine => cosine(a, b),
            DistanceFunction::DotProduct => -dot(a, b),
        })
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum::<f32>()
        .sqrt()
}

#[inline]
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot(a, b) / (norm_a * norm_b)
}
