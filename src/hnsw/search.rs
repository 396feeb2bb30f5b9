//! The two traversal primitives every engine operation is built from:
//! single-path greedy descent (used on upper layers) and `ef`-bounded beam
//! search (used for both construction and queries at the target layer).

use crate::cancel::CancellationToken;
use crate::context::SearchContext;
use crate::distance::DistanceFunction;
use crate::error::EngineError;
use crate::heap::MinHeap;
use std::collections::HashSet;

/// A traversal explores at most `ef * MAX_TRAVERSAL_MULT` candidates before
/// giving up and returning whatever it has. Graphs built and queried with
/// sane parameters never come close to this; it exists so a malformed or
/// adversarial graph (e.g. imported state with a routing cycle introduced
/// by hand) can't spin a query forever.
const MAX_TRAVERSAL_MULT: usize = 10;

/// Greedily descends from `entry` on `layer`, moving to the neighbor
/// strictly closer to `query` each step until no neighbor improves on the
/// current node. Used on layers above the target layer, where only a
/// single good entry point for the next layer down is needed.
pub fn greedy_search(
    ctx: &SearchContext,
    distance_fn: DistanceFunction,
    query: &[f32],
    entry: u128,
    layer: u32,
) -> Result<u128, EngineError> {
    let mut current = entry;
    let mut current_dist = distance_fn.distance(query, &ctx.get(current)?.vector)?;

    loop {
        let neighbors = ctx.get(current)?.neighbors_at(layer);
        let mut improved = false;
        for neighbor in neighbors {
            let handle = ctx.get(neighbor)?;
            let d = distance_fn.distance(query, &handle.vector)?;
            if d < current_dist {
                current_dist = d;
                current = neighbor;
                improved = true;
            }
        }
        if !improved {
            return Ok(current);
        }
    }
}

/// Runs an `ef`-bounded beam search from `entry` on `layer`, returning up
/// to `ef` results sorted ascending by distance to `query`.
pub fn ef_search(
    ctx: &SearchContext,
    distance_fn: DistanceFunction,
    query: &[f32],
    entry: u128,
    ef: usize,
    layer: u32,
    cancel: &CancellationToken,
) -> Result<Vec<(f32, u128)>, EngineError> {
    let ef = ef.max(1);
    let mut visited: HashSet<u128> = HashSet::new();
    let mut candidates: MinHeap<u128> = MinHeap::new();
    // `results` is a min-heap over negated distance, which makes it behave
    // like a bounded max-heap: the worst (largest-distance) entry is
    // always the one on top, ready to evict.
    let mut results: MinHeap<u128> = MinHeap::new();
    let mut farthest = f32::INFINITY;

    let entry_dist = distance_fn.distance(query, &ctx.get(entry)?.vector)?;
    visited.insert(entry);
    candidates.push(entry_dist, entry)?;
    results.push(-entry_dist, entry)?;
    if results.len() == ef {
        farthest = entry_dist;
    }

    let max_iterations = ef * MAX_TRAVERSAL_MULT;
    let mut iterations = 0usize;

    while !candidates.is_empty() {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        iterations += 1;
        if iterations > max_iterations {
            log::warn!(
                "ef_search exceeded traversal safety limit ({max_iterations} nodes) at layer {layer}; returning best results found so far"
            );
            break;
        }

        let (d_c, c) = candidates.pop()?;
        if d_c > farthest {
            break;
        }

        let neighbors = ctx.get(c)?.neighbors_at(layer);
        for n in neighbors {
            if !visited.insert(n) {
                continue;
            }
            let handle = ctx.get(n)?;
            let d = distance_fn.distance(query, &handle.vector)?;
            if d < farthest || results.len() < ef {
                candidates.push(d, n)?;
                results.push(-d, n)?;
                if results.len() > ef {
                    results.pop()?;
                }
                if results.len() == ef {
                    let (worst_neg, _) = results.peek()?;
                    farthest = -worst_neg;
                }
            }
        }
    }

    let mut out: Vec<(f32, u128)> = results.iter_sorted().map(|(neg_d, id)| (-neg_d, *id)).collect();
    out.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryNodeStore;
    use crate::store::NodeStore;

    fn line_graph(points: &[f32]) -> InMemoryNodeStore {
        let store = InMemoryNodeStore::new();
        for (i, &x) in points.iter().enumerate() {
            store.add(i as u128, vec![x]).unwrap();
        }
        for i in 0..points.len() {
            if i > 0 {
                store.add_neighbor(i as u128, 0, (i - 1) as u128).unwrap();
            }
            if i + 1 < points.len() {
                store.add_neighbor(i as u128, 0, (i + 1) as u128).unwrap();
            }
        }
        store
    }

    #[test]
    fn greedy_search_finds_local_minimum() {
        let store = line_graph(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let ctx = SearchContext::new(&store);
        let found = greedy_search(&ctx, DistanceFunction::Euclidean, &[3.2], 0, 0).unwrap();
        assert_eq!(found, 3);
    }

    #[test]
    fn ef_search_returns_k_nearest_sorted() {
        let store = line_graph(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let ctx = SearchContext::new(&store);
        let cancel = CancellationToken::never();
        let results =
            ef_search(&ctx, DistanceFunction::Euclidean, &[4.2], 4, 3, 0, &cancel).unwrap();
        let ids: Vec<u128> = results.iter().map(|(_, id)| *id).collect();
        assert_eq!(ids, vec![4, 5, 3]);
    }

    #[test]
    fn ef_search_respects_cancellation() {
        let store = line_graph(&(0..200).map(|i| i as f32).collect::<Vec<_>>());
        let ctx = SearchContext::new(&store);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err =
            ef_search(&ctx, DistanceFunction::Euclidean, &[4.2], 4, 3, 0, &cancel).unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[test]
    fn ef_search_on_singleton_graph_returns_the_only_node() {
        let store = InMemoryNodeStore::new();
        store.add(0, vec![0.0]).unwrap();
        let ctx = SearchContext::new(&store);
        let cancel = CancellationToken::never();
        let results =
            ef_search(&ctx, DistanceFunction::Euclidean, &[5.0], 0, 5, 0, &cancel).unwrap();
        assert_eq!(results, vec![(5.0, 0)]);
    }
}
