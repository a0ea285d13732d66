use thiserror::Error;

/// Failures raised while drawing samples.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The backing store could not be opened or has been closed.
    #[error("sample store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("no rows available in `{table}`")]
    EmptyResult { table: String },
    #[error("invalid table name `{0}`")]
    InvalidTable(String),
    #[error("query against `{table}` failed: {message}")]
    Query { table: String, message: String },
    #[error("malformed row in `{table}`: {message}")]
    Decode { table: String, message: String },
    #[error("path sample needs between {min} and {max} nodes, got {actual}")]
    InvalidPath {
        min: usize,
        max: usize,
        actual: usize,
    },
}

impl SampleError {
    /// A fatal error ends the run: nothing can be sampled anymore.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SampleError::StoreUnavailable(_))
    }

    /// Recoverable errors let the caller skip the iteration or continue
    /// with zero-length input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SampleError::EmptyResult { .. })
    }
}
