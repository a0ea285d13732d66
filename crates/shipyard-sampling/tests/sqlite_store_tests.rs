//! SQLite sample store against throw-away databases.

use shipyard_sampling::{SampleError, SampleLimit, SampleStore, SqliteSampleStore};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use tempfile::tempdir;

async fn seed(path: &Path, statements: &[&str]) {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    for sql in statements {
        sqlx::query(sql).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}

async fn seeded_store(dir: &Path) -> SqliteSampleStore {
    let path = dir.join("graph_sample.db");
    seed(
        &path,
        &[
            "CREATE TABLE graph_samples (subject TEXT, subject_type TEXT, object TEXT, object_type TEXT, predicate TEXT)",
            "INSERT INTO graph_samples VALUES ('CHEBI:1', 'SmallMolecule', 'MONDO:2', 'Disease', 'treats')",
            "INSERT INTO graph_samples VALUES ('CHEBI:3', 'SmallMolecule', 'MONDO:4', 'Disease', 'treats')",
            "INSERT INTO graph_samples VALUES ('NCBIGene:5', 'Gene', 'MONDO:6', 'Disease', 'gene_associated_with_condition')",
            "CREATE TABLE nodenorm_curie (curie TEXT)",
            "INSERT INTO nodenorm_curie VALUES ('MESH:D014867'), ('NCIT:C34373'), ('CHEBI:15377')",
            "CREATE TABLE curie_traffic (curie_count INTEGER)",
            "INSERT INTO curie_traffic VALUES (1), (3), (40), (250), (1200)",
            "CREATE TABLE twohop (n0 TEXT, n1 TEXT, n2 TEXT, depth INTEGER)",
            "INSERT INTO twohop VALUES ('A:1', 'B:1', 'C:1', 10), ('A:2', 'B:2', 'C:2', 60)",
            "CREATE TABLE empty_paths (n0 TEXT, n1 TEXT, n2 TEXT, depth INTEGER)",
        ],
    )
    .await;
    SqliteSampleStore::open(&path).await.unwrap()
}

#[tokio::test]
async fn test_edges_are_bounded_by_limit() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path()).await;

    let edges = store.sample_edges(SampleLimit::Count(2)).await.unwrap();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| !e.subject_id().is_empty()));

    let all = store.sample_edges(SampleLimit::All).await.unwrap();
    assert_eq!(all.len(), 3);

    let none = store.sample_edges(SampleLimit::Count(0)).await.unwrap();
    assert!(none.is_empty());

    store.close().await;
}

#[tokio::test]
async fn test_paths_respect_min_depth() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path()).await;

    let paths = store
        .sample_paths("twohop", SampleLimit::All, 50)
        .await
        .unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].nodes(), ["A:2", "B:2", "C:2"]);
    assert_eq!(paths[0].hop_count(), 2);
    assert_eq!(paths[0].depth_floor(), 50);

    let err = store
        .sample_paths("empty_paths", SampleLimit::Count(5), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, SampleError::EmptyResult { .. }));
    assert!(err.is_recoverable());

    let err = store
        .sample_paths("twohop; --", SampleLimit::Count(5), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, SampleError::InvalidTable(_)));

    store.close().await;
}

#[tokio::test]
async fn test_identifiers_and_traffic() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path()).await;

    let curies = store.sample_identifiers(SampleLimit::Count(2)).await.unwrap();
    assert_eq!(curies.len(), 2);

    let traffic = store.sample_traffic_records(SampleLimit::All).await.unwrap();
    let mut counts: Vec<u32> = traffic.iter().map(|r| r.curie_count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 3, 40, 250, 1200]);

    store.close().await;
}

#[tokio::test]
async fn test_missing_database_is_unavailable() {
    let dir = tempdir().unwrap();
    let err = SqliteSampleStore::open(&dir.path().join("missing.db"))
        .await
        .err()
        .unwrap();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_closed_store_is_unavailable() {
    let dir = tempdir().unwrap();
    let store = seeded_store(dir.path()).await;
    store.close().await;
    store.close().await;

    let err = store.sample_edges(SampleLimit::Count(1)).await.unwrap_err();
    assert!(matches!(err, SampleError::StoreUnavailable(_)));
}
