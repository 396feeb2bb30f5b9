//! The HNSW engine: insert, delete, batch variants, query, and state
//! export/import, all serialized behind a single write guard.

use super::config::HnswParams;
use super::level::assign_level;
use super::neighbor::{select_neighbors_heuristic, Candidate};
use super::search::{ef_search, greedy_search};
use super::snapshot::{IndexState, NodeState};
use crate::cancel::CancellationToken;
use crate::context::SearchContext;
use crate::error::EngineError;
use crate::store::{LayerStore, NodeStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

/// How far below the target degree a node's edge count must fall before
/// the batch-delete repair pass tries to restore it. Exposed as a fixed
/// constant rather than a parameter: the spec treats the repair threshold
/// as an implementation heuristic, not a named tunable.
const REPAIR_DEFICIT_RATIO: u32 = 2;

/// One result row from [`HnswEngine::query`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The matched node's id.
    pub id: u128,
    /// Distance from the query to the matched vector. Always non-negative
    /// (dot-product distances are reported by magnitude).
    pub distance: f32,
    /// A copy of the matched node's vector.
    pub vector: Vec<f32>,
}

/// An in-process HNSW graph index over a [`NodeStore`]/[`LayerStore`] pair.
///
/// Every write path (`insert`, `insert_many`, `remove`, `remove_many`,
/// `import_state`) serializes on a single internal mutex. Queries do not
/// take that guard; they rely on the store to provide a consistent view
/// while no write is in flight.
pub struct HnswEngine {
    node_store: Box<dyn NodeStore>,
    layer_store: Box<dyn LayerStore>,
    params: RwLock<HnswParams>,
    write_guard: Mutex<()>,
    rng: Mutex<ChaCha8Rng>,
}

impl HnswEngine {
    /// Builds an engine over `node_store`/`layer_store` for vectors of
    /// `dimension`. `seed` fixes the level-assignment RNG; `None` seeds
    /// from the process's entropy source.
    pub fn new(
        dimension: usize,
        node_store: Box<dyn NodeStore>,
        layer_store: Box<dyn LayerStore>,
        seed: Option<u64>,
    ) -> Result<Self, EngineError> {
        let mut params = HnswParams::new(dimension)?;
        params.set_seed(seed);
        let seed_value = seed.unwrap_or_else(|| rand::thread_rng().gen());
        Ok(HnswEngine {
            node_store,
            layer_store,
            params: RwLock::new(params),
            write_guard: Mutex::new(()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed_value)),
        })
    }

    /// A copy of the current parameters.
    pub fn params(&self) -> HnswParams {
        self.params.read().expect("params lock poisoned").clone()
    }

    /// Applies a validated mutation to the current parameters. `f` is
    /// given a mutable reference to the live parameter set; any
    /// `InvalidParameter`/`InvalidDimension` error from a setter propagates
    /// without mutating state (the lock is held for the whole closure, so
    /// readers never observe a half-applied change).
    pub fn update_params<F>(&self, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut HnswParams) -> Result<(), EngineError>,
    {
        let mut params = self.params.write().expect("params lock poisoned");
        f(&mut params)
    }

    /// Number of nodes currently indexed.
    pub fn len(&self) -> usize {
        self.node_store.count()
    }

    /// True if the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current entry point, if any.
    pub fn entry_point(&self) -> Option<u128> {
        self.node_store.entry_point()
    }

    fn acquire_write_guard(&self, cancel: &CancellationToken) -> Result<std::sync::MutexGuard<'_, ()>, EngineError> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(self.write_guard.lock().expect("write guard poisoned"))
    }

    fn validate_vector(&self, vector: &[f32]) -> Result<(), EngineError> {
        let dimension = self.params().dimension();
        if vector.len() != dimension {
            return Err(EngineError::InvalidDimension(format!(
                "expected dimension {dimension}, got {}",
                vector.len()
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::NullArgument(
                "vector contains a non-finite value".to_string(),
            ));
        }
        Ok(())
    }

    /// Inserts a single vector under `id`.
    pub fn insert(
        &self,
        id: u128,
        vector: Vec<f32>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        self.validate_vector(&vector)?;
        let _guard = self.acquire_write_guard(cancel)?;
        self.insert_locked(id, vector, cancel)
    }

    /// Inserts many vectors as one logical batch. Every vector is
    /// validated before the write guard is acquired; duplicate ids across
    /// the batch are not specially handled and simply collide in the
    /// store (last write wins), matching single-insert semantics applied
    /// repeatedly.
    pub fn insert_many(
        &self,
        items: Vec<(u128, Vec<f32>)>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if items.is_empty() {
            return Ok(());
        }
        for (_, vector) in &items {
            self.validate_vector(vector)?;
        }
        let _guard = self.acquire_write_guard(cancel)?;
        for (id, vector) in items {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            self.insert_locked(id, vector, cancel)?;
        }
        Ok(())
    }

    fn insert_locked(
        &self,
        id: u128,
        vector: Vec<f32>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if self.node_store.count() == 0 {
            self.node_store.add(id, vector)?;
            self.layer_store.set_layer(id, 0);
            self.node_store.set_entry_point(Some(id))?;
            return Ok(());
        }

        let params = self.params();
        let distance_fn = params.distance_function();
        let level = {
            let mut rng = self.rng.lock().expect("rng lock poisoned");
            assign_level(&mut *rng, params.level_multiplier(), params.max_layers())
        };

        self.node_store.add(id, vector.clone())?;
        self.layer_store.set_layer(id, level);

        let entry_id = self.node_store.entry_point().ok_or_else(|| {
            EngineError::InvariantViolation("entry point missing on a non-empty store".into())
        })?;
        let entry_layer = self.layer_store.get_layer(entry_id);
        let ctx = SearchContext::new(self.node_store.as_ref());

        let mut current = entry_id;
        let mut lc = entry_layer;
        while lc > level {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            current = greedy_search(&ctx, distance_fn, &vector, current, lc)?;
            lc -= 1;
        }

        let top = level.min(entry_layer);
        let mut lc = top as i64;
        while lc >= 0 {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let layer = lc as u32;
            let ef = params.ef_construction() as usize;
            let found = ef_search(&ctx, distance_fn, &vector, current, ef, layer, cancel)?;
            if let Some((_, nearest)) = found.first() {
                current = *nearest;
            }

            let m = if layer == 0 { params.max_m() } else { params.m() } as usize;
            let mut candidates = Vec::with_capacity(found.len());
            for (d, cid) in &found {
                if *cid == id {
                    continue;
                }
                let v = ctx.get(*cid)?.vector;
                candidates.push(Candidate {
                    id: *cid,
                    vector: v,
                    distance_to_base: *d,
                });
            }
            let selected = select_neighbors_heuristic(
                distance_fn,
                &vector,
                &candidates,
                m,
                params.extend_candidates(),
            )?;

            for &n in &selected {
                self.node_store.add_neighbor(id, layer, n)?;
                self.node_store.add_neighbor(n, layer, id)?;
                self.prune_if_over_capacity(n, layer, &params, &ctx)?;
            }

            lc -= 1;
        }

        if level > entry_layer {
            self.node_store.set_entry_point(Some(id))?;
        }
        Ok(())
    }

    /// Rebuilds `node`'s neighbor set at `layer` via the selection
    /// heuristic if it has grown past its target degree, dropping any edge
    /// the rebuild doesn't keep (bidirectionally).
    fn prune_if_over_capacity(
        &self,
        node: u128,
        layer: u32,
        params: &HnswParams,
        ctx: &SearchContext,
    ) -> Result<(), EngineError> {
        let target = if layer == 0 { params.max_m() } else { params.m() } as usize;
        let handle = self.node_store.get(node)?;
        let neighbors = handle.neighbors_at(layer);
        if neighbors.len() <= target {
            return Ok(());
        }
        let node_vector = handle.vector;
        let distance_fn = params.distance_function();
        let mut candidates = Vec::with_capacity(neighbors.len());
        for nb in &neighbors {
            let nb_vector = ctx.get(*nb)?.vector;
            let d = distance_fn.distance(&node_vector, &nb_vector)?;
            candidates.push(Candidate {
                id: *nb,
                vector: nb_vector,
                distance_to_base: d,
            });
        }
        candidates.sort_by(|a, b| a.distance_to_base.total_cmp(&b.distance_to_base));
        let kept = select_neighbors_heuristic(
            distance_fn,
            &node_vector,
            &candidates,
            target,
            params.extend_candidates(),
        )?;
        let kept_set: HashSet<u128> = kept.into_iter().collect();
        for nb in neighbors {
            if !kept_set.contains(&nb) {
                self.node_store.remove_neighbor(node, layer, nb)?;
                self.node_store.remove_neighbor(nb, layer, node)?;
            }
        }
        Ok(())
    }

    /// Removes a single node. A no-op if `id` is absent.
    pub fn remove(&self, id: u128, cancel: &CancellationToken) -> Result<(), EngineError> {
        let _guard = self.acquire_write_guard(cancel)?;
        self.remove_single_locked(id)
    }

    fn remove_single_locked(&self, id: u128) -> Result<(), EngineError> {
        let handle = match self.node_store.try_get(id) {
            Some(h) => h,
            None => return Ok(()),
        };
        let was_entry = self.node_store.entry_point() == Some(id);
        let touched_layers: Vec<u32> = handle.neighbors.keys().copied().collect();

        self.node_store.remove(id);
        self.layer_store.remove_layer(id);

        for n in self.node_store.all_ids() {
            for &layer in &touched_layers {
                self.node_store.remove_neighbor(n, layer, id)?;
            }
        }

        if was_entry {
            self.reassign_entry_point()?;
        }
        Ok(())
    }

    fn reassign_entry_point(&self) -> Result<(), EngineError> {
        let ids = self.node_store.all_ids();
        match ids.iter().copied().max_by_key(|id| self.layer_store.get_layer(*id)) {
            Some(best) => self.node_store.set_entry_point(Some(best)),
            None => self.node_store.set_entry_point(None),
        }
    }

    /// Removes many nodes as one logical batch and repairs connectivity
    /// among their former neighbors afterward.
    pub fn remove_many(&self, ids: &[u128], cancel: &CancellationToken) -> Result<(), EngineError> {
        if ids.is_empty() {
            return Ok(());
        }
        let _guard = self.acquire_write_guard(cancel)?;
        self.remove_many_locked(ids, cancel)
    }

    fn remove_many_locked(&self, ids: &[u128], cancel: &CancellationToken) -> Result<(), EngineError> {
        let r: HashSet<u128> = ids.iter().copied().collect();
        let old_entry = self.node_store.entry_point();

        let mut present: Vec<u128> = Vec::new();
        let mut touched: HashSet<u32> = HashSet::new();
        let mut u: HashSet<u128> = HashSet::new();
        for &id in &r {
            if let Some(handle) = self.node_store.try_get(id) {
                present.push(id);
                for (layer, neighbors) in &handle.neighbors {
                    touched.insert(*layer);
                    for n in neighbors {
                        if !r.contains(n) {
                            u.insert(*n);
                        }
                    }
                }
            }
        }
        if present.is_empty() {
            return Ok(());
        }

        for &n in &u {
            if let Some(handle) = self.node_store.try_get(n) {
                for (layer, neighbors) in &handle.neighbors {
                    for target in neighbors {
                        if r.contains(target) {
                            self.node_store.remove_neighbor(n, *layer, *target)?;
                        }
                    }
                }
            }
        }

        self.node_store.remove_many(&present);
        for &id in &present {
            self.layer_store.remove_layer(id);
        }

        if let Some(old) = old_entry {
            if r.contains(&old) {
                self.reassign_entry_point()?;
            }
        }

        self.repair_locked(&u, &r, cancel)
    }

    fn repair_locked(
        &self,
        u: &HashSet<u128>,
        r: &HashSet<u128>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let entry = match self.node_store.entry_point() {
            Some(e) => e,
            None => return Ok(()),
        };
        let params = self.params();
        let distance_fn = params.distance_function();
        let ctx = SearchContext::new(self.node_store.as_ref());

        for &n in u {
            let handle = match self.node_store.try_get(n) {
                Some(h) => h,
                None => continue,
            };
            let top_layer = self.layer_store.get_layer(n);
            for layer in 0..=top_layer {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                let target = if layer == 0 { params.max_m() } else { params.m() };
                let existing = handle.neighbors_at(layer);
                let current_count = existing.len() as u32;
                if current_count >= target / REPAIR_DEFICIT_RATIO {
                    continue;
                }
                let ef = (2 * target) as usize;
                let found = ef_search(&ctx, distance_fn, &handle.vector, entry, ef, layer, cancel)?;
                let needed = (target - current_count) as usize;
                let mut added = 0usize;
                for (_, cid) in found {
                    if added >= needed {
                        break;
                    }
                    if cid == n || existing.contains(&cid) || r.contains(&cid) {
                        continue;
                    }
                    self.node_store.add_neighbor(n, layer, cid)?;
                    self.node_store.add_neighbor(cid, layer, n)?;
                    self.prune_if_over_capacity(cid, layer, &params, &ctx)?;
                    added += 1;
                }
                log::debug!(
                    "repair pass restored {added} edge(s) for node {n} at layer {layer} (deficit threshold {})",
                    target / REPAIR_DEFICIT_RATIO
                );
            }
        }
        Ok(())
    }

    /// Returns the `k` nearest indexed vectors to `vector`. Allocates a
    /// fresh [`SearchContext`] for this call; see
    /// [`HnswEngine::query_with_context`] to reuse one across repeated
    /// queries.
    pub fn query(
        &self,
        vector: &[f32],
        k: usize,
        ef: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<QueryResult>, EngineError> {
        self.validate_vector(vector)?;
        let ctx = SearchContext::new(self.node_store.as_ref());
        self.query_with_context(vector, k, ef, &ctx, cancel)
    }

    /// Like [`HnswEngine::query`], but reuses a caller-supplied
    /// [`SearchContext`] to amortize allocation across a sequence of
    /// queries. The caller is responsible for not interleaving this with a
    /// concurrent write.
    pub fn query_with_context(
        &self,
        vector: &[f32],
        k: usize,
        ef: Option<usize>,
        ctx: &SearchContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<QueryResult>, EngineError> {
        self.validate_vector(vector)?;
        let entry = match self.node_store.entry_point() {
            Some(e) => e,
            None => return Ok(Vec::new()),
        };
        let params = self.params();
        let distance_fn = params.distance_function();
        let effective_ef = ef
            .unwrap_or_else(|| (params.ef_construction() as usize).max(2 * k))
            .max(k)
            .max(1);

        let entry_handle = ctx.get(entry)?;
        let mut prefetch_ids: Vec<u128> = vec![entry];
        for neighbors in entry_handle.neighbors.values() {
            prefetch_ids.extend(neighbors.iter().copied());
        }
        ctx.prefetch(&prefetch_ids);

        let entry_layer = self.layer_store.get_layer(entry);
        let mut current = entry;
        let mut lc = entry_layer;
        while lc >= 1 {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            current = greedy_search(ctx, distance_fn, vector, current, lc)?;
            lc -= 1;
        }

        let found = ef_search(ctx, distance_fn, vector, current, effective_ef, 0, cancel)?;
        let mut out = Vec::with_capacity(k.min(found.len()));
        for (d, id) in found.into_iter().take(k) {
            let handle = ctx.get(id)?;
            out.push(QueryResult {
                id,
                distance: d.abs(),
                vector: handle.vector,
            });
        }
        Ok(out)
    }

    /// Exports the full index state per the state serialization format.
    pub fn export_state(&self) -> Result<IndexState, EngineError> {
        let params = self.params();
        let mut nodes = Vec::with_capacity(self.node_store.count());
        for id in self.node_store.all_ids() {
            let handle = self.node_store.get(id)?;
            let layer = self.layer_store.get_layer(id);
            let neighbors: HashMap<u32, Vec<u128>> = handle
                .neighbors
                .into_iter()
                .map(|(l, set)| (l, set.into_iter().collect()))
                .collect();
            nodes.push(NodeState {
                id,
                vector: handle.vector,
                layer,
                neighbors,
            });
        }
        Ok(IndexState {
            vector_dimension: params.dimension(),
            parameters: params,
            entry_point_id: self.node_store.entry_point(),
            nodes,
        })
    }

    /// Replaces all index state with `state`. Existing nodes and layer
    /// assignments are dropped first; the importer trusts the snapshot's
    /// invariants and performs no re-validation or pruning of edges.
    pub fn import_state(&self, state: IndexState, cancel: &CancellationToken) -> Result<(), EngineError> {
        let _guard = self.acquire_write_guard(cancel)?;

        for id in self.node_store.all_ids() {
            self.node_store.remove(id);
            self.layer_store.remove_layer(id);
        }
        self.node_store.set_entry_point(None)?;

        for node in &state.nodes {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            self.node_store.add(node.id, node.vector.clone())?;
            self.layer_store.set_layer(node.id, node.layer);
        }
        for node in &state.nodes {
            for (&layer, neighbor_ids) in &node.neighbors {
                for &nb in neighbor_ids {
                    self.node_store.add_neighbor(node.id, layer, nb)?;
                }
            }
        }
        if let Some(ep) = state.entry_point_id {
            self.node_store.set_entry_point(Some(ep))?;
        }

        *self.params.write().expect("params lock poisoned") = state.parameters;
        log::debug!(
            "imported {} node(s), entry point {:?}",
            state.nodes.len(),
            state.entry_point_id
        );
        Ok(())
    }
}
