//! Built-in dialects.

mod cypher;
mod dql;
mod gremlin;
mod kuzu;
mod search;
mod trapi;

pub use cypher::CypherDialect;
pub use dql::DqlDialect;
pub use gremlin::GremlinDialect;
pub use kuzu::KuzuDialect;
pub use search::SearchDialect;
pub use trapi::TrapiDialect;
