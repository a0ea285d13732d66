//! In-memory sample store for tests and offline rendering.

use crate::error::SampleError;
use crate::model::{EdgeSample, IdentifierSample, PathSample, TrafficRecord};
use crate::store::{validate_table_name, SampleLimit, SampleStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A fixed set of rows served through the [`SampleStore`] contract.
///
/// Subsets are drawn with a seeded RNG so fixtures are reproducible.
pub struct StaticSampleStore {
    edges: Vec<EdgeSample>,
    paths: BTreeMap<String, Vec<PathSample>>,
    identifiers: Vec<IdentifierSample>,
    traffic: Vec<TrafficRecord>,
    rng: Mutex<StdRng>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl StaticSampleStore {
    pub fn new(seed: u64) -> Self {
        Self {
            edges: Vec::new(),
            paths: BTreeMap::new(),
            identifiers: Vec::new(),
            traffic: Vec::new(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_edges(mut self, edges: Vec<EdgeSample>) -> Self {
        self.edges = edges;
        self
    }

    /// Each path's `depth_floor` stands in for the row's `depth` column;
    /// drawn paths report the requested `min_depth`, as the SQLite store does.
    pub fn with_paths(mut self, table: &str, paths: Vec<PathSample>) -> Self {
        self.paths.insert(table.to_string(), paths);
        self
    }

    pub fn with_identifiers(mut self, identifiers: Vec<IdentifierSample>) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn with_traffic(mut self, traffic: Vec<TrafficRecord>) -> Self {
        self.traffic = traffic;
        self
    }

    /// How many times `close` has been called.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn draw<T: Clone>(&self, table: &str, rows: &[T], limit: SampleLimit) -> Result<Vec<T>, SampleError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SampleError::StoreUnavailable("store already closed".to_string()));
        }
        if limit.is_zero() {
            return Ok(Vec::new());
        }
        if rows.is_empty() {
            return Err(SampleError::EmptyResult {
                table: table.to_string(),
            });
        }
        let picked = match limit {
            SampleLimit::All => rows.to_vec(),
            SampleLimit::Count(n) => {
                let mut rng = self.rng.lock();
                rows.choose_multiple(&mut *rng, n as usize).cloned().collect()
            }
        };
        Ok(picked)
    }
}

#[async_trait]
impl SampleStore for StaticSampleStore {
    async fn sample_edges(&self, limit: SampleLimit) -> Result<Vec<EdgeSample>, SampleError> {
        self.draw("graph_samples", &self.edges, limit)
    }

    async fn sample_paths(
        &self,
        table: &str,
        limit: SampleLimit,
        min_depth: i64,
    ) -> Result<Vec<PathSample>, SampleError> {
        validate_table_name(table)?;
        let rows: Vec<PathSample> = self
            .paths
            .get(table)
            .map(|paths| {
                paths
                    .iter()
                    .filter(|p| p.depth_floor() >= min_depth)
                    .map(|p| p.clone().with_depth_floor(min_depth))
                    .collect()
            })
            .unwrap_or_default();
        self.draw(table, &rows, limit)
    }

    async fn sample_identifiers(
        &self,
        limit: SampleLimit,
    ) -> Result<Vec<IdentifierSample>, SampleError> {
        self.draw("nodenorm_curie", &self.identifiers, limit)
    }

    async fn sample_traffic_records(
        &self,
        limit: SampleLimit,
    ) -> Result<Vec<TrafficRecord>, SampleError> {
        self.draw("curie_traffic", &self.traffic, limit)
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}
