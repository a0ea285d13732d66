//! Shipyard query synthesis
//!
//! Turns sampled graph fragments into request bodies in each backend's own
//! query language:
//!
//! ```text
//!   EdgeSample / PathSample
//!            │
//!            ▼
//!   ┌─────────────────┐  render_single / render_floating / render_chain
//!   │  QueryDialect   │─────────────────────────────────────────────┐
//!   │  (per backend)  │                                             │
//!   └─────────────────┘                                             ▼
//!            │                                                 Fragment × n
//!            │ frame_batch                                          │
//!            ▼                                                      │
//!      RequestBody  ◄───────────────────────────────────────────────┘
//! ```
//!
//! Dialects are looked up in a [`DialectRegistry`] keyed by [`Backend`].
//! Synthesis is pure: identical samples always give identical bodies, and
//! samples are only borrowed.

pub mod backends;
pub mod batch;
pub mod dialect;
pub mod error;
pub mod nodenorm;
pub mod registry;
pub mod request;

pub use dialect::{QueryDialect, RenderContext};
pub use error::SynthesisError;
pub use nodenorm::{normalization_body, NormalizationTarget};
pub use registry::{DialectRegistry, Samples, SynthesisRequest};
pub use request::{Backend, ContentType, Fragment, IndexHint, IndexLayout, Payload, RequestBody, Shape};
