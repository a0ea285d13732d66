//! Shipyard graph samples
//!
//! Typed fragments of a knowledge graph drawn at random from a relational
//! sample store:
//!
//! ```text
//! ┌──────────────────┐   ORDER BY random() LIMIT n   ┌──────────────────┐
//! │  sample store    │──────────────────────────────►│  EdgeSample      │
//! │  (SQLite files)  │                               │  PathSample      │
//! │                  │                               │  IdentifierSample│
//! │                  │                               │  TrafficRecord   │
//! └──────────────────┘                               └──────────────────┘
//! ```
//!
//! Samples are created fresh for every request body and never cached. The
//! store is the only shared resource; it is opened once per run and closed
//! exactly once.

pub mod error;
pub mod fixture;
pub mod model;
pub mod sqlite;
pub mod store;

pub use error::SampleError;
pub use fixture::StaticSampleStore;
pub use model::{
    CurieBatch, EdgeField, EdgeSample, FloatingSpec, IdentifierSample, PathSample, TrafficRecord,
    MAX_HOPS, MIN_HOPS,
};
pub use sqlite::{SqliteSampleStore, StoreTables};
pub use store::{SampleLimit, SampleStore};
