use shipyard_dialect::SynthesisError;
use shipyard_sampling::SampleError;
use shipyard_traffic::TrafficError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Traffic(#[from] TrafficError),
    #[error("unknown scenario `{0}`")]
    UnknownScenario(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("embedded engine unavailable: {0}")]
    Embedded(String),
    #[error("transport to {target} failed: {message}")]
    Transport { target: String, message: String },
}

impl DriverError {
    /// Fatal errors abort the run; anything else fails a single iteration.
    pub fn is_fatal(&self) -> bool {
        match self {
            DriverError::Sample(e) => e.is_fatal(),
            DriverError::Synthesis(e) => e.is_fatal(),
            DriverError::Traffic(e) => e.is_fatal(),
            DriverError::UnknownScenario(_) | DriverError::Config(_) | DriverError::Embedded(_) => true,
            DriverError::Transport { .. } => false,
        }
    }
}
