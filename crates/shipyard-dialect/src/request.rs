//! Backends, pattern shapes and the bodies synthesis produces.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use shipyard_sampling::{MAX_HOPS, MIN_HOPS};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Backends and shapes
// ============================================================================

/// Graph-query backends a workload can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Document search over an edge table or a node adjacency-list index.
    Elasticsearch,
    /// Property graph speaking Cypher over the HTTP transaction endpoint.
    Neo4j,
    /// Declarative graph queries (DQL).
    Dgraph,
    /// Gremlin scripts evaluated server-side.
    JanusGraph,
    /// Embedded Cypher-dialect engine.
    KuzuDb,
    /// TRAPI query-graph service.
    Trapi,
}

impl Backend {
    pub const ALL: [Backend; 6] = [
        Backend::Elasticsearch,
        Backend::Neo4j,
        Backend::Dgraph,
        Backend::JanusGraph,
        Backend::KuzuDb,
        Backend::Trapi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Elasticsearch => "elasticsearch",
            Backend::Neo4j => "neo4j",
            Backend::Dgraph => "dgraph",
            Backend::JanusGraph => "janusgraph",
            Backend::KuzuDb => "kuzudb",
            Backend::Trapi => "trapi",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "elasticsearch" | "es" => Ok(Backend::Elasticsearch),
            "neo4j" => Ok(Backend::Neo4j),
            "dgraph" => Ok(Backend::Dgraph),
            "janusgraph" => Ok(Backend::JanusGraph),
            "kuzudb" | "kuzu" => Ok(Backend::KuzuDb),
            "trapi" | "ploverdb" => Ok(Backend::Trapi),
            other => Err(format!("unknown backend `{other}`")),
        }
    }
}

/// Pattern shape: one edge, or a chain of `k` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Single,
    Chain(usize),
}

impl Shape {
    /// A chain of `hops` edges, if `hops` is within `MIN_HOPS..=MAX_HOPS`.
    pub fn chain(hops: usize) -> Option<Shape> {
        (MIN_HOPS..=MAX_HOPS)
            .contains(&hops)
            .then_some(Shape::Chain(hops))
    }

    pub fn hops(self) -> usize {
        match self {
            Shape::Single => 1,
            Shape::Chain(k) => k,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Single => f.write_str("single"),
            Shape::Chain(k) => write!(f, "{k}-hop chain"),
        }
    }
}

/// Layout of the search index being queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexLayout {
    /// One document per edge with `subject`/`object`/`predicate` keywords.
    EdgeTable,
    /// One document per node with nested `in_edges` / `out_edges` arrays.
    AdjacencyList,
}

/// Which search index a body targets, and how it is laid out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexHint {
    pub name: String,
    pub layout: IndexLayout,
}

impl IndexHint {
    pub fn edges(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: IndexLayout::EdgeTable,
        }
    }

    pub fn adjacency(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: IndexLayout::AdjacencyList,
        }
    }
}

// ============================================================================
// Bodies
// ============================================================================

/// One rendered sample, before bulk framing.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Json(serde_json::Value),
    Text(String),
}

impl Fragment {
    /// Compact text form; JSON fragments are serialized on one line.
    pub fn into_text(self) -> String {
        match self {
            Fragment::Json(value) => value.to_string(),
            Fragment::Text(text) => text,
        }
    }

    pub fn into_json(self) -> serde_json::Value {
        match self {
            Fragment::Json(value) => value,
            Fragment::Text(text) => serde_json::Value::String(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Json,
    NdJson,
    Dql,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::NdJson => "application/x-ndjson",
            ContentType::Dql => "application/dql",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    /// Raw UTF-8 bytes for transports that take a byte buffer.
    Binary(Bytes),
    /// Standalone statements handed to an embedded client one by one.
    Statements(Vec<String>),
}

impl Payload {
    /// Wire bytes. Statements are encoded as a JSON array of strings.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Payload::Text(text) => Bytes::from(text.clone()),
            Payload::Binary(bytes) => bytes.clone(),
            Payload::Statements(statements) => {
                let array = serde_json::Value::from(statements.clone());
                Bytes::from(array.to_string())
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(bytes) => std::str::from_utf8(bytes).ok(),
            Payload::Statements(_) => None,
        }
    }
}

/// A backend-native request body plus its content-type hint.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub content_type: ContentType,
    pub payload: Payload,
}

impl RequestBody {
    pub fn text(content_type: ContentType, text: String) -> Self {
        Self {
            content_type,
            payload: Payload::Text(text),
        }
    }

    pub fn json(value: &serde_json::Value) -> Self {
        Self::text(ContentType::Json, value.to_string())
    }

    pub fn byte_len(&self) -> usize {
        self.payload.to_bytes().len()
    }
}
