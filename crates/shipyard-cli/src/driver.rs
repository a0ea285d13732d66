//! Run driver: setup, per-iteration request preparation, teardown.
//!
//! The sample store is opened once in [`setup`] and closed once in
//! [`teardown`], which consumes the context. [`run`] always tears down,
//! whether iterations failed or a fatal error ended the run early.

use crate::config::{DataPaths, Knobs, Targets};
use crate::error::DriverError;
use crate::scenario::{Scenario, Sizing, Workload};
use async_trait::async_trait;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shipyard_dialect::{
    normalization_body, Backend, ContentType, DialectRegistry, NormalizationTarget, RequestBody,
    Samples, Shape, SynthesisRequest,
};
use shipyard_sampling::{SampleError, SampleLimit, SampleStore, SqliteSampleStore};
use shipyard_traffic::{build_histogram, SamplerConfig, TrafficSchedule, DEFAULT_CAP, DEFAULT_WINDOW};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_SEARCH_CLUSTER: &str = "su12";
/// Minimum path depth requested from path tables.
pub const DEFAULT_MIN_DEPTH: i64 = 100;

// ============================================================================
// Options and requests
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub targets: Targets,
    pub paths: DataPaths,
    pub knobs: Knobs,
    pub seed: u64,
    pub min_depth: i64,
    pub replay_window: Duration,
    pub traffic_cap: u32,
}

impl RunOptions {
    pub fn new(targets: Targets, paths: DataPaths, knobs: Knobs) -> Self {
        Self {
            targets,
            paths,
            knobs,
            seed: 0,
            min_depth: DEFAULT_MIN_DEPTH,
            replay_window: DEFAULT_WINDOW,
            traffic_cap: DEFAULT_CAP,
        }
    }
}

/// A body ready to hand to the transport, plus where and how to send it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub targets: Vec<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub body: RequestBody,
    /// Number of samples rendered into `body`.
    pub samples: usize,
}

/// Validated location of an embedded engine database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedHandle {
    path: PathBuf,
}

impl EmbeddedHandle {
    pub fn open(path: &Path) -> Result<Self, DriverError> {
        if !path.exists() {
            return Err(DriverError::Embedded(format!(
                "database path {} does not exist",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Target string the transport receives for embedded statements.
    pub fn target(&self) -> String {
        format!("kuzudb://{}", self.path.display())
    }
}

// ============================================================================
// Run context
// ============================================================================

pub struct RunContext {
    scenario: Scenario,
    store: Arc<dyn SampleStore>,
    registry: DialectRegistry,
    headers: Vec<(String, String)>,
    embedded: Option<EmbeddedHandle>,
    targets: Vec<String>,
    schedule: Option<TrafficSchedule>,
    rng: StdRng,
    num_sample: SampleLimit,
    timeout: Duration,
    min_depth: i64,
    started: Instant,
    iterations: u64,
}

fn content_type(workload: &Workload) -> ContentType {
    match workload {
        Workload::Graph {
            backend: Backend::Elasticsearch,
            ..
        } => ContentType::NdJson,
        Workload::Graph {
            backend: Backend::Dgraph,
            ..
        } => ContentType::Dql,
        Workload::Normalization {
            target: NormalizationTarget::SearchBackend { .. },
            ..
        } => ContentType::NdJson,
        _ => ContentType::Json,
    }
}

fn resolve_targets(
    scenario: &Scenario,
    targets: &Targets,
    embedded: Option<&EmbeddedHandle>,
) -> Result<Vec<String>, DriverError> {
    let url = match &scenario.workload {
        Workload::Graph { backend, .. } => match backend {
            Backend::Elasticsearch => targets
                .search_cluster(scenario.cluster.as_deref().unwrap_or(DEFAULT_SEARCH_CLUSTER))?
                .to_string(),
            Backend::Neo4j => targets.neo4j.clone(),
            Backend::Dgraph => targets.dgraph.clone(),
            Backend::JanusGraph => targets.janusgraph.clone(),
            Backend::Trapi => targets.trapi.clone(),
            Backend::KuzuDb => embedded
                .map(EmbeddedHandle::target)
                .unwrap_or_else(|| "kuzudb://embedded".to_string()),
        },
        Workload::Normalization { target, .. } => {
            let alias = match target {
                NormalizationTarget::NodeNormApi => "renci",
                NormalizationTarget::BiothingsApi => "ci",
                NormalizationTarget::SearchBackend { .. } => DEFAULT_SEARCH_CLUSTER,
            };
            targets.nodenorm_cluster(alias)?.to_string()
        }
        Workload::Equality => {
            return Ok(vec![
                targets.nodenorm_cluster("renci")?.to_string(),
                targets.nodenorm_cluster("pending")?.to_string(),
            ])
        }
    };
    Ok(vec![url])
}

fn store_path(scenario: &Scenario, paths: &DataPaths) -> PathBuf {
    match &scenario.workload {
        Workload::Graph {
            shape: Shape::Chain(hops),
            ..
        } => paths.multihop(*hops),
        Workload::Graph { .. } => paths.graph.clone(),
        Workload::Normalization { .. } | Workload::Equality => paths.curies.clone(),
    }
}

impl RunContext {
    /// Assemble a context around an already-open store.
    pub fn new(
        scenario: Scenario,
        options: &RunOptions,
        store: Arc<dyn SampleStore>,
        schedule: Option<TrafficSchedule>,
    ) -> Result<Self, DriverError> {
        let embedded = match (&scenario.workload, &options.knobs.embedded_path) {
            (
                Workload::Graph {
                    backend: Backend::KuzuDb,
                    ..
                },
                Some(path),
            ) => Some(EmbeddedHandle::open(path)?),
            _ => None,
        };
        let targets = resolve_targets(&scenario, &options.targets, embedded.as_ref())?;

        let mut headers = vec![(
            "Content-Type".to_string(),
            content_type(&scenario.workload).mime().to_string(),
        )];
        if let (
            Workload::Graph {
                backend: Backend::Neo4j,
                ..
            },
            Some(credentials),
        ) = (&scenario.workload, &options.knobs.credentials)
        {
            headers.push(("Authorization".to_string(), credentials.basic_auth()));
        }

        Ok(Self {
            scenario,
            store,
            registry: DialectRegistry::with_defaults(),
            headers,
            embedded,
            targets,
            schedule,
            rng: StdRng::seed_from_u64(options.seed),
            num_sample: options.knobs.num_sample,
            timeout: options.knobs.http_timeout,
            min_depth: options.min_depth,
            started: Instant::now(),
            iterations: 0,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn embedded(&self) -> Option<&EmbeddedHandle> {
        self.embedded.as_ref()
    }

    pub fn schedule(&self) -> Option<&TrafficSchedule> {
        self.schedule.as_ref()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

/// Read the whole traffic table once and build the replay schedule.
pub async fn load_schedule(options: &RunOptions) -> Result<TrafficSchedule, DriverError> {
    let store = SqliteSampleStore::open(&options.paths.traffic).await?;
    let records = store.sample_traffic_records(SampleLimit::All).await;
    store.close().await;

    let counts: Vec<u32> = records?.into_iter().map(|r| r.curie_count).collect();
    let histogram = build_histogram(&counts)?;
    let initial = match options.knobs.num_sample {
        SampleLimit::Count(n) => n,
        SampleLimit::All => options.traffic_cap,
    };
    Ok(TrafficSchedule::new(
        histogram,
        SamplerConfig {
            cap: options.traffic_cap,
        },
        options.replay_window,
        initial,
    ))
}

/// Open the scenario's sample store and build the run context.
pub async fn setup(scenario: Scenario, options: &RunOptions) -> Result<RunContext, DriverError> {
    let schedule = match &scenario.workload {
        Workload::Normalization {
            sizing: Sizing::Replayed,
            ..
        } => Some(load_schedule(options).await?),
        _ => None,
    };

    let path = store_path(&scenario, &options.paths);
    let store: Arc<dyn SampleStore> = Arc::new(SqliteSampleStore::open(&path).await?);
    match RunContext::new(scenario, options, Arc::clone(&store), schedule) {
        Ok(ctx) => {
            tracing::info!(
                scenario = %ctx.scenario,
                store = %path.display(),
                targets = ?ctx.targets,
                "run setup complete"
            );
            Ok(ctx)
        }
        Err(e) => {
            store.close().await;
            Err(e)
        }
    }
}

/// An empty table yields an empty batch rather than a failed iteration.
fn or_empty<T>(result: Result<Vec<T>, SampleError>) -> Result<Vec<T>, SampleError> {
    match result {
        Err(SampleError::EmptyResult { table }) => {
            tracing::warn!(table = %table, "sample table is empty, sending an empty batch");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Draw samples and synthesize the next request body.
pub async fn iteration(ctx: &mut RunContext) -> Result<PreparedRequest, DriverError> {
    ctx.iterations += 1;
    let workload = ctx.scenario.workload.clone();

    let (body, samples) = match workload {
        Workload::Graph {
            backend,
            shape: Shape::Single,
            floating,
            index,
        } => {
            let edges = or_empty(ctx.store.sample_edges(ctx.num_sample).await)?;
            let body = ctx.registry.synthesize(&SynthesisRequest {
                backend,
                shape: Shape::Single,
                samples: Samples::Edges(&edges),
                floating,
                index: index.as_ref(),
            })?;
            (body, edges.len())
        }
        Workload::Graph {
            backend,
            shape,
            floating,
            index,
        } => {
            let table = ctx
                .scenario
                .path_table()
                .ok_or_else(|| DriverError::Config(format!("{} has no path table", ctx.scenario)))?;
            let paths = or_empty(
                ctx.store
                    .sample_paths(&table, ctx.num_sample, ctx.min_depth)
                    .await,
            )?;
            let body = ctx.registry.synthesize(&SynthesisRequest {
                backend,
                shape,
                samples: Samples::Paths(&paths),
                floating,
                index: index.as_ref(),
            })?;
            (body, paths.len())
        }
        Workload::Normalization { target, sizing } => {
            let limit = match (sizing, ctx.schedule.as_mut()) {
                (Sizing::Replayed, Some(schedule)) => {
                    SampleLimit::Count(schedule.observe(ctx.started.elapsed(), &mut ctx.rng))
                }
                _ => ctx.num_sample,
            };
            let identifiers = or_empty(ctx.store.sample_identifiers(limit).await)?;
            (normalization_body(&target, &identifiers), identifiers.len())
        }
        Workload::Equality => {
            let identifiers = or_empty(ctx.store.sample_identifiers(ctx.num_sample).await)?;
            (
                normalization_body(&NormalizationTarget::NodeNormApi, &identifiers),
                identifiers.len(),
            )
        }
    };

    tracing::debug!(
        scenario = %ctx.scenario,
        iteration = ctx.iterations,
        samples,
        bytes = body.byte_len(),
        "prepared request"
    );

    Ok(PreparedRequest {
        targets: ctx.targets.clone(),
        headers: ctx.headers.clone(),
        timeout: ctx.timeout,
        body,
        samples,
    })
}

/// Release the sample store. Consumes the context so it runs once.
pub async fn teardown(ctx: RunContext) {
    ctx.store.close().await;
    tracing::info!(
        scenario = %ctx.scenario,
        iterations = ctx.iterations,
        "run teardown complete"
    );
}

// ============================================================================
// Transport and run loop
// ============================================================================

/// Sends a prepared request to one target and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, target: &str, request: &PreparedRequest) -> Result<Bytes, DriverError>;
}

/// Writes request bodies instead of sending them.
///
/// With an output directory each body lands in its own numbered file;
/// otherwise bodies go to stdout. Responses are always empty.
pub struct DryRunTransport {
    out_dir: Option<PathBuf>,
    written: AtomicUsize,
}

impl DryRunTransport {
    pub fn stdout() -> Self {
        Self {
            out_dir: None,
            written: AtomicUsize::new(0),
        }
    }

    pub fn to_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: Some(dir.into()),
            written: AtomicUsize::new(0),
        }
    }

    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }
}

fn extension(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Json => "json",
        ContentType::NdJson => "ndjson",
        ContentType::Dql => "dql",
    }
}

#[async_trait]
impl Transport for DryRunTransport {
    async fn dispatch(&self, target: &str, request: &PreparedRequest) -> Result<Bytes, DriverError> {
        let n = self.written.fetch_add(1, Ordering::Relaxed);
        let bytes = request.body.payload.to_bytes();
        let io_error = |e: std::io::Error| DriverError::Transport {
            target: target.to_string(),
            message: e.to_string(),
        };
        match &self.out_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
                let file = dir.join(format!("{n:05}.{}", extension(request.body.content_type)));
                tokio::fs::write(&file, &bytes).await.map_err(io_error)?;
                tracing::debug!(target_url = target, file = %file.display(), "wrote request body");
            }
            None => {
                println!("# POST {target} ({} bytes)", bytes.len());
                println!("{}", String::from_utf8_lossy(&bytes));
            }
        }
        Ok(Bytes::new())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub iterations: u64,
    pub failed_iterations: u64,
    /// Equality comparisons whose responses differed.
    pub failed_checks: u64,
    pub bytes_sent: u64,
}

async fn execute(ctx: &mut RunContext, transport: &dyn Transport, report: &mut RunReport) -> Result<(), DriverError> {
    let request = iteration(ctx).await?;
    let body_len = request.body.byte_len() as u64;
    let mut responses = Vec::with_capacity(request.targets.len());
    for target in &request.targets {
        responses.push(transport.dispatch(target, &request).await?);
        report.bytes_sent += body_len;
    }

    if ctx.scenario.workload == Workload::Equality {
        if let [first, second] = responses.as_slice() {
            if first != second {
                report.failed_checks += 1;
                tracing::warn!(
                    iteration = ctx.iterations,
                    left = first.len(),
                    right = second.len(),
                    "normalization responses differ"
                );
            }
        }
    }
    Ok(())
}

/// Run `iterations` iterations on an open context, then tear it down.
///
/// Non-fatal failures are counted and the run continues; a fatal error
/// stops the loop and is returned after teardown.
pub async fn run_context(
    mut ctx: RunContext,
    iterations: u64,
    transport: &dyn Transport,
) -> Result<RunReport, DriverError> {
    let mut report = RunReport::default();
    let mut fatal = None;

    for _ in 0..iterations {
        report.iterations += 1;
        match execute(&mut ctx, transport, &mut report).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                tracing::error!(scenario = %ctx.scenario, error = %e, "aborting run");
                fatal = Some(e);
                break;
            }
            Err(e) => {
                report.failed_iterations += 1;
                tracing::warn!(scenario = %ctx.scenario, error = %e, "iteration failed");
            }
        }
    }

    teardown(ctx).await;
    match fatal {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

/// `setup`, `iterations` iterations, `teardown`.
pub async fn run(
    scenario: Scenario,
    options: &RunOptions,
    iterations: u64,
    transport: &dyn Transport,
) -> Result<RunReport, DriverError> {
    let ctx = setup(scenario, options).await?;
    run_context(ctx, iterations, transport).await
}
