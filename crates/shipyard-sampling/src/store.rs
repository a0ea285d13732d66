//! Read-only sample store contract.

use crate::error::SampleError;
use crate::model::{EdgeSample, IdentifierSample, PathSample, TrafficRecord};
use async_trait::async_trait;

/// How many rows a sampling call may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLimit {
    /// At most `n` rows, uniformly at random without replacement.
    Count(u32),
    /// The entire table.
    All,
}

impl SampleLimit {
    /// Value bound to SQLite's `LIMIT`; `-1` is unbounded.
    pub fn as_sql_limit(self) -> i64 {
        match self {
            SampleLimit::Count(n) => i64::from(n),
            SampleLimit::All => -1,
        }
    }

    /// Parse a row count where any negative value means "all".
    pub fn from_signed(n: i64) -> Self {
        if n < 0 {
            SampleLimit::All
        } else {
            SampleLimit::Count(u32::try_from(n).unwrap_or(u32::MAX))
        }
    }

    pub fn is_zero(self) -> bool {
        self == SampleLimit::Count(0)
    }
}

/// Random-subset access to the four sample tables.
///
/// Every call issues exactly one query (no caching, no retry). An empty
/// table yields [`SampleError::EmptyResult`]; a closed or unreachable store
/// yields [`SampleError::StoreUnavailable`]. A zero-row limit returns an
/// empty vector without touching the store.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn sample_edges(&self, limit: SampleLimit) -> Result<Vec<EdgeSample>, SampleError>;

    async fn sample_paths(
        &self,
        table: &str,
        limit: SampleLimit,
        min_depth: i64,
    ) -> Result<Vec<PathSample>, SampleError>;

    async fn sample_identifiers(
        &self,
        limit: SampleLimit,
    ) -> Result<Vec<IdentifierSample>, SampleError>;

    async fn sample_traffic_records(
        &self,
        limit: SampleLimit,
    ) -> Result<Vec<TrafficRecord>, SampleError>;

    /// Release the underlying handle. Further calls fail with
    /// `StoreUnavailable`.
    async fn close(&self);
}

/// Check that `table` is a plain SQL identifier; table names cannot be
/// bound as parameters.
pub fn validate_table_name(table: &str) -> Result<(), SampleError> {
    let mut chars = table.chars();
    let head_ok = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(SampleError::InvalidTable(table.to_string()))
    }
}
