use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrafficError {
    /// No traffic records to build a distribution from.
    #[error("traffic corpus is empty")]
    EmptyCorpus,
    #[error("invalid histogram bins: {0}")]
    InvalidBins(String),
}

impl TrafficError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TrafficError::InvalidBins(_))
    }

    /// The caller can keep its current sample size and try again later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TrafficError::EmptyCorpus)
    }
}
