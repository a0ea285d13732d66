//! Integration tests for the complete Shipyard pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Sample store → Dialect registry → request bodies
//! - Traffic table → Histogram → Replay schedule
//! - Scenario name → Run driver → Transport
//!
//! Run with: cargo test --test integration_tests

use shipyard_dialect::{Backend, ContentType, DialectRegistry, Payload, Samples, Shape, SynthesisRequest};
use shipyard_sampling::{
    EdgeSample, FloatingSpec, PathSample, SampleLimit, SampleStore, SqliteSampleStore,
    StaticSampleStore, TrafficRecord,
};
use shipyard_traffic::{build_histogram, SamplerConfig, TrafficSchedule};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn edges() -> Vec<EdgeSample> {
    vec![
        EdgeSample::new(
            "CHEBI:6801",
            "biolink:SmallMolecule",
            "MONDO:0005148",
            "biolink:Disease",
            "biolink:treats",
        ),
        EdgeSample::new(
            "NCBIGene:3630",
            "biolink:Gene",
            "MONDO:0005148",
            "biolink:Disease",
            "biolink:gene_associated_with_condition",
        ),
    ]
}

// ============================================================================
// Sample store → dialects
// ============================================================================

#[tokio::test]
async fn test_every_backend_renders_a_sampled_batch() {
    let store = StaticSampleStore::new(3).with_edges(edges());
    let sampled = store.sample_edges(SampleLimit::All).await.unwrap();
    let registry = DialectRegistry::with_defaults();
    let index = shipyard_dialect::IndexHint::edges("rtx_kg2_edges");

    for backend in Backend::ALL {
        for floating in FloatingSpec::ALL {
            let body = registry
                .synthesize(&SynthesisRequest {
                    backend,
                    shape: Shape::Single,
                    samples: Samples::Edges(&sampled),
                    floating,
                    index: Some(&index),
                })
                .unwrap_or_else(|e| panic!("{backend} {floating:?}: {e}"));
            assert!(body.byte_len() > 0, "{backend} produced an empty body");

            match backend {
                Backend::Elasticsearch => assert_eq!(body.content_type, ContentType::NdJson),
                Backend::Dgraph => assert!(matches!(body.payload, Payload::Binary(_))),
                Backend::KuzuDb => {
                    assert!(matches!(&body.payload, Payload::Statements(s) if s.len() == 2))
                }
                _ => assert_eq!(body.content_type, ContentType::Json),
            }
        }
    }
    store.close().await;
    assert_eq!(store.close_calls(), 1);
}

#[tokio::test]
async fn test_chain_bodies_from_path_table() {
    let paths = vec![PathSample::new(
        vec!["A:1".into(), "B:1".into(), "C:1".into(), "D:1".into()],
        100,
    )
    .unwrap()];
    let store = StaticSampleStore::new(1).with_paths("threehop", paths);
    let sampled = store
        .sample_paths("threehop", SampleLimit::Count(10), 100)
        .await
        .unwrap();
    let registry = DialectRegistry::with_defaults();

    for backend in [Backend::Neo4j, Backend::Dgraph, Backend::JanusGraph, Backend::KuzuDb] {
        let body = registry
            .synthesize(&SynthesisRequest {
                backend,
                shape: Shape::Chain(3),
                samples: Samples::Paths(&sampled),
                floating: FloatingSpec::None,
                index: None,
            })
            .unwrap();
        let text = String::from_utf8(body.payload.to_bytes().to_vec()).unwrap();
        assert!(text.contains("D:1"), "{backend} chain misses the last node");
    }
}

// ============================================================================
// Traffic table → histogram → schedule
// ============================================================================

#[tokio::test]
async fn test_traffic_table_drives_schedule() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("traffic.db");
    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    sqlx::query("CREATE TABLE curie_traffic (curie_count INTEGER)")
        .execute(&mut conn)
        .await
        .unwrap();
    sqlx::query("INSERT INTO curie_traffic VALUES (2), (5), (9), (150), (700), (2400)")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();

    let store = SqliteSampleStore::open(&path).await.unwrap();
    let records = store.sample_traffic_records(SampleLimit::All).await.unwrap();
    store.close().await;

    let counts: Vec<u32> = records.iter().map(|r: &TrafficRecord| r.curie_count).collect();
    let histogram = build_histogram(&counts).unwrap();
    assert_eq!(histogram.observations(), 6);

    let config = SamplerConfig::default();
    let mut schedule = TrafficSchedule::new(histogram, config, Duration::from_secs(300), 1000);
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(9);

    assert_eq!(schedule.observe(Duration::from_secs(10), &mut rng), 1000);
    let resampled = schedule.observe(Duration::from_secs(301), &mut rng);
    assert!((1..=config.cap).contains(&resampled));
    assert_eq!(schedule.next_boundary(), Duration::from_secs(600));
}

// ============================================================================
// Scenario → driver
// ============================================================================

#[tokio::test]
async fn test_driver_runs_on_a_fixture_store() {
    use shipyard_cli::config::{DataPaths, EnvironmentConfig, Knobs};
    use shipyard_cli::driver::{run_context, DryRunTransport, RunContext, RunOptions};

    let store = Arc::new(StaticSampleStore::new(5).with_edges(edges()));
    let targets = EnvironmentConfig::builtin().select("prod").unwrap().clone();
    let options = RunOptions::new(targets, DataPaths::default(), Knobs::default());
    let ctx = RunContext::new(
        "floating-predicate.janusgraph".parse().unwrap(),
        &options,
        store.clone(),
        None,
    )
    .unwrap();
    assert_eq!(ctx.targets(), ["http://localhost:8182".to_string()]);

    let out = tempdir().unwrap();
    let transport = DryRunTransport::to_dir(out.path());
    let report = run_context(ctx, 4, &transport).await.unwrap();
    assert_eq!(report.iterations, 4);
    assert_eq!(report.failed_iterations, 0);
    assert_eq!(transport.written(), 4);
    assert_eq!(store.close_calls(), 1);
}
