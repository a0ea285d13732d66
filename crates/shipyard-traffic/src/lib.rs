//! Shipyard traffic replay
//!
//! Builds an empirical distribution over historical request sizes and draws
//! new target sizes from it:
//!
//! ```text
//!   curie_count corpus ──► build_histogram ──► Histogram (fixed bins)
//!                                                  │
//!                                  u ~ U[0,1) ─────┤ prefix-sum binary search
//!                                                  ▼
//!                                      bin ──► interpolate ──► round ──► cap
//! ```
//!
//! [`TrafficSchedule`] re-draws on a fixed cadence during a long run without
//! rebuilding the histogram.

pub mod error;
pub mod histogram;
pub mod sampler;
pub mod schedule;

pub use error::TrafficError;
pub use histogram::{build_histogram, Bin, Histogram, DEFAULT_EDGES, MAX_CURIES};
pub use sampler::{sample, SamplerConfig, DEFAULT_CAP};
pub use schedule::{TrafficSchedule, DEFAULT_WINDOW};
