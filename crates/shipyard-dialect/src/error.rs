use crate::request::{Backend, Shape};
use shipyard_sampling::FloatingSpec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    /// No dialect is registered for this backend/shape/floating combination.
    #[error("{backend} has no {shape} synthesis with floating={floating}")]
    UnsupportedShape {
        backend: Backend,
        shape: Shape,
        floating: FloatingSpec,
    },
    /// A sample lacks something the active synthesis path needs.
    #[error("sample #{ordinal} is malformed: {reason}")]
    MalformedSample { ordinal: usize, reason: String },
    #[error("{backend} synthesis needs an index hint")]
    MissingIndex { backend: Backend },
}

impl SynthesisError {
    /// Configuration problems: every iteration of the scenario would fail.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SynthesisError::UnsupportedShape { .. } | SynthesisError::MissingIndex { .. }
        )
    }

    /// A bad sample only spoils the batch it was drawn into.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SynthesisError::MalformedSample { .. })
    }

    pub fn malformed(ordinal: usize, reason: impl Into<String>) -> Self {
        SynthesisError::MalformedSample {
            ordinal,
            reason: reason.into(),
        }
    }
}
