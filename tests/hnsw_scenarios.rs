//! The concrete worked scenarios from the engine's test plan, run against
//! the public API end to end.

use hnsw_graph_engine::cancel::CancellationToken;
use hnsw_graph_engine::distance::DistanceFunction;
use hnsw_graph_engine::hnsw::HnswEngine;
use hnsw_graph_engine::store::memory::{InMemoryLayerStore, InMemoryNodeStore};

fn fresh_engine(dimension: usize, seed: u64) -> HnswEngine {
    HnswEngine::new(
        dimension,
        Box::new(InMemoryNodeStore::new()),
        Box::new(InMemoryLayerStore::new()),
        Some(seed),
    )
    .unwrap()
}

#[test]
fn query_on_empty_index_is_empty() {
    let engine = fresh_engine(3, 1);
    let cancel = CancellationToken::never();
    let results = engine.query(&[1.0, 2.0, 3.0], 5, None, &cancel).unwrap();
    assert!(results.is_empty());
}

#[test]
fn ef_smaller_than_k_still_returns_k_when_available() {
    let engine = fresh_engine(1, 4);
    let cancel = CancellationToken::never();
    for i in 0..10 {
        engine.insert(i, vec![i as f32], &cancel).unwrap();
    }
    let results = engine.query(&[5.0], 5, Some(1), &cancel).unwrap();
    assert_eq!(results.len(), 5);
}

#[test]
fn entry_point_reassignment_keeps_the_index_queryable() {
    let engine = fresh_engine(1, 9);
    let cancel = CancellationToken::never();
    for i in 0..8 {
        engine.insert(i, vec![i as f32], &cancel).unwrap();
    }
    let first_entry = engine.entry_point().unwrap();
    engine.remove(first_entry, &cancel).unwrap();
    assert!(engine.entry_point().is_some());
    assert_eq!(engine.len(), 7);
    let results = engine.query(&[3.4], 1, None, &cancel).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn insert_then_remove_restores_the_population_size() {
    let engine = fresh_engine(2, 13);
    let cancel = CancellationToken::never();
    for i in 0..10 {
        engine.insert(i, vec![i as f32, -(i as f32)], &cancel).unwrap();
    }
    let before = engine.len();
    engine.insert(99, vec![42.0, -42.0], &cancel).unwrap();
    engine.remove(99, &cancel).unwrap();
    assert_eq!(engine.len(), before);
}

#[test]
fn cancellation_mid_batch_insert_leaves_the_engine_usable() {
    let engine = fresh_engine(1, 21);
    let cancel = CancellationToken::new();
    // A batch large enough that, were cancellation not observed promptly,
    // it would insert many nodes before finishing.
    let items: Vec<(u128, Vec<f32>)> = (0..500).map(|i| (i as u128, vec![i as f32])).collect();
    cancel.cancel();
    let err = engine.insert_many(items, &cancel).unwrap_err();
    assert!(matches!(err, hnsw_graph_engine::EngineError::Cancelled));
    assert_eq!(engine.len(), 0);

    let fresh_cancel = CancellationToken::never();
    engine.insert(1, vec![1.0], &fresh_cancel).unwrap();
    assert_eq!(engine.len(), 1);
}

#[test]
fn export_import_round_trip_preserves_query_answers() {
    let engine = fresh_engine(2, 55);
    let cancel = CancellationToken::never();
    let points: Vec<(u128, Vec<f32>)> = (0..30)
        .map(|i| (i as u128, vec![(i as f32).sin() * 10.0, (i as f32).cos() * 10.0]))
        .collect();
    engine.insert_many(points, &cancel).unwrap();

    let exported = engine.export_state().unwrap();
    let restored = fresh_engine(2, 1);
    restored.import_state(exported, &cancel).unwrap();

    let query = vec![1.0, -2.0];
    let before = engine.query(&query, 5, Some(200), &cancel).unwrap();
    let after = restored.query(&query, 5, Some(200), &cancel).unwrap();
    let before_ids: Vec<u128> = before.iter().map(|r| r.id).collect();
    let after_ids: Vec<u128> = after.iter().map(|r| r.id).collect();
    assert_eq!(before_ids, after_ids);
}

#[test]
fn cosine_distance_treats_zero_vector_as_maximally_distant() {
    let engine = fresh_engine(2, 3);
    engine
        .update_params(|p| {
            p.set_distance_function(DistanceFunction::Cosine);
            Ok(())
        })
        .unwrap();
    let cancel = CancellationToken::never();
    engine.insert(1, vec![0.0, 0.0], &cancel).unwrap();
    engine.insert(2, vec![1.0, 1.0], &cancel).unwrap();
    let results = engine.query(&[0.0, 0.0], 2, None, &cancel).unwrap();
    let zero_result = results.iter().find(|r| r.id == 1).unwrap();
    assert_eq!(zero_result.distance, 1.0);
}
