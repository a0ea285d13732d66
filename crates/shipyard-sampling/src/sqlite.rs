//! SQLite-backed sample store.
//!
//! The sample databases are prepared offline; this adapter only ever reads
//! them. Random subsets use the rowid sub-select pattern:
//!
//! ```sql
//! SELECT * FROM graph_samples
//! WHERE rowid IN (SELECT rowid FROM graph_samples ORDER BY random() LIMIT ?1)
//! ```
//!
//! Binding `-1` as the limit returns the whole table.

use crate::error::SampleError;
use crate::model::{EdgeSample, IdentifierSample, PathSample, TrafficRecord, MAX_HOPS};
use crate::store::{validate_table_name, SampleLimit, SampleStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;

/// Table names for the fixed-shape sample tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreTables {
    pub edges: String,
    pub identifiers: String,
    pub traffic: String,
}

impl Default for StoreTables {
    fn default() -> Self {
        Self {
            edges: "graph_samples".to_string(),
            identifiers: "nodenorm_curie".to_string(),
            traffic: "curie_traffic".to_string(),
        }
    }
}

pub struct SqliteSampleStore {
    pool: SqlitePool,
    tables: StoreTables,
}

impl SqliteSampleStore {
    /// Open an existing sample database read-only.
    pub async fn open(path: &Path) -> Result<Self, SampleError> {
        Self::open_with_tables(path, StoreTables::default()).await
    }

    pub async fn open_with_tables(path: &Path, tables: StoreTables) -> Result<Self, SampleError> {
        for table in [&tables.edges, &tables.identifiers, &tables.traffic] {
            validate_table_name(table)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| {
                SampleError::StoreUnavailable(format!("{}: {e}", path.display()))
            })?;

        tracing::info!(path = %path.display(), "opened sample store");
        Ok(Self { pool, tables })
    }

    async fn random_rows(
        &self,
        table: &str,
        filter: Option<(&str, i64)>,
        limit: SampleLimit,
    ) -> Result<Vec<SqliteRow>, SampleError> {
        if self.pool.is_closed() {
            return Err(SampleError::StoreUnavailable("store already closed".to_string()));
        }

        let (sql, filter_value) = match filter {
            Some((column, value)) => (
                format!(
                    "SELECT * FROM {table} WHERE rowid IN \
                     (SELECT rowid FROM {table} WHERE {column} >= ?2 ORDER BY random() LIMIT ?1)"
                ),
                Some(value),
            ),
            None => (
                format!(
                    "SELECT * FROM {table} WHERE rowid IN \
                     (SELECT rowid FROM {table} ORDER BY random() LIMIT ?1)"
                ),
                None,
            ),
        };

        let mut query = sqlx::query(&sql).bind(limit.as_sql_limit());
        if let Some(value) = filter_value {
            query = query.bind(value);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(table, e))?;

        tracing::debug!(table, rows = rows.len(), "sampled rows");

        if rows.is_empty() {
            return Err(SampleError::EmptyResult {
                table: table.to_string(),
            });
        }
        Ok(rows)
    }
}

fn classify(table: &str, err: sqlx::Error) -> SampleError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            SampleError::StoreUnavailable(err.to_string())
        }
        other => SampleError::Query {
            table: table.to_string(),
            message: other.to_string(),
        },
    }
}

fn text_column(table: &str, row: &SqliteRow, column: &str) -> Result<String, SampleError> {
    row.try_get::<String, _>(column)
        .map_err(|e| SampleError::Decode {
            table: table.to_string(),
            message: format!("column `{column}`: {e}"),
        })
}

fn decode_path(table: &str, row: &SqliteRow, depth_floor: i64) -> Result<PathSample, SampleError> {
    let mut nodes = Vec::with_capacity(MAX_HOPS + 1);
    for i in 0..=MAX_HOPS {
        let column = format!("n{i}");
        match row.try_get::<Option<String>, _>(column.as_str()) {
            Ok(Some(node)) => nodes.push(node),
            Ok(None) | Err(sqlx::Error::ColumnNotFound(_)) => break,
            Err(e) => {
                return Err(SampleError::Decode {
                    table: table.to_string(),
                    message: format!("column `{column}`: {e}"),
                })
            }
        }
    }
    PathSample::new(nodes, depth_floor)
}

#[async_trait]
impl SampleStore for SqliteSampleStore {
    async fn sample_edges(&self, limit: SampleLimit) -> Result<Vec<EdgeSample>, SampleError> {
        if limit.is_zero() {
            return Ok(Vec::new());
        }
        let table = self.tables.edges.as_str();
        let rows = self.random_rows(table, None, limit).await?;

        rows.iter()
            .map(|row| {
                Ok(EdgeSample::new(
                    text_column(table, row, "subject")?,
                    text_column(table, row, "subject_type")?,
                    text_column(table, row, "object")?,
                    text_column(table, row, "object_type")?,
                    text_column(table, row, "predicate")?,
                ))
            })
            .collect()
    }

    async fn sample_paths(
        &self,
        table: &str,
        limit: SampleLimit,
        min_depth: i64,
    ) -> Result<Vec<PathSample>, SampleError> {
        validate_table_name(table)?;
        if limit.is_zero() {
            return Ok(Vec::new());
        }
        let rows = self
            .random_rows(table, Some(("depth", min_depth)), limit)
            .await?;

        rows.iter()
            .map(|row| decode_path(table, row, min_depth))
            .collect()
    }

    async fn sample_identifiers(
        &self,
        limit: SampleLimit,
    ) -> Result<Vec<IdentifierSample>, SampleError> {
        if limit.is_zero() {
            return Ok(Vec::new());
        }
        let table = self.tables.identifiers.as_str();
        let rows = self.random_rows(table, None, limit).await?;

        rows.iter()
            .map(|row| text_column(table, row, "curie").map(IdentifierSample))
            .collect()
    }

    async fn sample_traffic_records(
        &self,
        limit: SampleLimit,
    ) -> Result<Vec<TrafficRecord>, SampleError> {
        if limit.is_zero() {
            return Ok(Vec::new());
        }
        let table = self.tables.traffic.as_str();
        let rows = self.random_rows(table, None, limit).await?;

        rows.iter()
            .map(|row| {
                let raw: i64 = row.try_get("curie_count").map_err(|e| SampleError::Decode {
                    table: table.to_string(),
                    message: format!("column `curie_count`: {e}"),
                })?;
                let curie_count = u32::try_from(raw).map_err(|_| SampleError::Decode {
                    table: table.to_string(),
                    message: format!("curie_count {raw} out of range"),
                })?;
                Ok(TrafficRecord { curie_count })
            })
            .collect()
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("closed sample store");
        }
    }
}
