//! Neighbor selection heuristic.
//!
//! Picks a diverse subset of up to `m` candidates rather than simply the
//! `m` closest: a candidate is rejected if it is closer to an
//! already-chosen neighbor than it is to the base point, since such a
//! candidate's routing value is already covered by that neighbor.

use crate::distance::DistanceFunction;
use crate::error::EngineError;

/// One candidate under consideration: its id, its vector, and its distance
/// to the base point the selection is being made for.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The candidate's node id.
    pub id: u128,
    /// The candidate's vector.
    pub vector: Vec<f32>,
    /// Distance from the candidate to the base point.
    pub distance_to_base: f32,
}

/// Selects up to `m` diverse neighbors for `base_vector` from `candidates`.
///
/// `candidates` must be sorted ascending by `distance_to_base`; this
/// function does not sort them itself so a caller that already has them in
/// heap-pop order can pass them straight through.
///
/// If `extend_candidates` is set and the primary pass selects fewer than
/// `m`, the closest rejected candidates (in their original order) are
/// appended until `m` is reached or candidates are exhausted.
pub fn select_neighbors_heuristic(
    distance_fn: DistanceFunction,
    base_vector: &[f32],
    candidates: &[Candidate],
    m: usize,
    extend_candidates: bool,
) -> Result<Vec<u128>, EngineError> {
    let _ = base_vector; // distances to base are precomputed in `candidates`
    let mut selected: Vec<(u128, &[f32])> = Vec::with_capacity(m);
    let mut discarded: Vec<&Candidate> = Vec::new();

    for candidate in candidates {
        if selected.len() >= m {
            break;
        }
        let mut accept = true;
        for (_, selected_vector) in &selected {
            let d_to_selected = distance_fn.distance(&candidate.vector, selected_vector)?;
            if d_to_selected < candidate.distance_to_base {
                accept = false;
                break;
            }
        }
        if accept {
            selected.push((candidate.id, candidate.vector.as_slice()));
        } else {
            discarded.push(candidate);
        }
    }

    let mut result: Vec<u128> = selected.into_iter().map(|(id, _)| id).collect();
    if extend_candidates && result.len() < m {
        for candidate in discarded {
            if result.len() >= m {
                break;
            }
            result.push(candidate.id);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceFunction;

    fn cand(id: u128, vector: Vec<f32>, distance_to_base: f32) -> Candidate {
        Candidate {
            id,
            vector,
            distance_to_base,
        }
    }

    #[test]
    fn prefers_diverse_over_merely_closest() {
        // Base at origin. b and c are both close to `a` (already selected)
        // so they add no routing value beyond it, while d is diverse.
        let base = vec![0.0, 0.0];
        let candidates = vec![
            cand(1, vec![1.0, 0.0], 1.0),  // a: closest
            cand(2, vec![1.1, 0.0], 1.1),  // b: near a
            cand(3, vec![1.2, 0.0], 1.2),  // c: near a
            cand(4, vec![0.0, 2.0], 2.0),  // d: diverse direction
        ];
        let selected =
            select_neighbors_heuristic(DistanceFunction::Euclidean, &base, &candidates, 2, false)
                .unwrap();
        assert_eq!(selected, vec![1, 4]);
    }

    #[test]
    fn stops_at_m_even_with_more_candidates() {
        let base = vec![0.0];
        let candidates = vec![
            cand(1, vec![1.0], 1.0),
            cand(2, vec![-1.0], 1.0),
            cand(3, vec![2.0], 2.0),
        ];
        let selected =
            select_neighbors_heuristic(DistanceFunction::Euclidean, &base, &candidates, 1, false)
                .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn extend_candidates_fills_from_discarded_when_short() {
        let base = vec![0.0, 0.0];
        // b and c are both eclipsed by a, so without extension only a is
        // selected; with extension, b is appended next since it was the
        // first discarded.
        let candidates = vec![
            cand(1, vec![1.0, 0.0], 1.0),
            cand(2, vec![1.05, 0.0], 1.05),
            cand(3, vec![1.1, 0.0], 1.1),
        ];
        let without_extend =
            select_neighbors_heuristic(DistanceFunction::Euclidean, &base, &candidates, 3, false)
                .unwrap();
        assert_eq!(without_extend, vec![1]);

        let with_extend =
            select_neighbors_heuristic(DistanceFunction::Euclidean, &base, &candidates, 3, true)
                .unwrap();
        assert_eq!(with_extend, vec![1, 2, 3]);
    }

    #[test]
    fn empty_candidates_yields_empty_selection() {
        let selected =
            select_neighbors_heuristic(DistanceFunction::Euclidean, &[0.0], &[], 5, false)
                .unwrap();
        assert!(selected.is_empty());
    }
}
