//! Shipyard run driver.
//!
//! Glues the sample store, the query dialects and the traffic model into
//! runnable scenarios:
//!
//! ```text
//! scenario name ──▶ Scenario ──▶ setup ──▶ RunContext
//!                                             │
//!                       iteration ◀───────────┘  (sample → synthesize)
//!                           │
//!                           ▼
//!                     PreparedRequest ──▶ Transport
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod scenario;

pub use config::{Credentials, DataPaths, EnvironmentConfig, Knobs, Targets};
pub use driver::{
    iteration, run, run_context, setup, teardown, DryRunTransport, EmbeddedHandle,
    PreparedRequest, RunContext, RunOptions, RunReport, Transport,
};
pub use error::DriverError;
pub use scenario::{catalogue, Scenario, Sizing, Workload};
