//! Typed graph samples.
//!
//! Every sample is immutable once drawn: synthesizers only ever see `&`
//! references to them.

use crate::error::SampleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fewest hops a chain sample may span.
pub const MIN_HOPS: usize = 2;
/// Most hops a chain sample may span.
pub const MAX_HOPS: usize = 5;

// ============================================================================
// Edges
// ============================================================================

/// One directed, typed, predicate-labelled edge.
///
/// Serialized with the column names of the `graph_samples` table
/// (`subject`, `subject_type`, `object`, `object_type`, `predicate`).
/// Fields are read through accessors; a sample never changes once drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSample {
    #[serde(rename = "subject")]
    subject_id: String,
    subject_type: String,
    #[serde(rename = "object")]
    object_id: String,
    object_type: String,
    predicate: String,
}

impl EdgeSample {
    pub fn new(
        subject_id: impl Into<String>,
        subject_type: impl Into<String>,
        object_id: impl Into<String>,
        object_type: impl Into<String>,
        predicate: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_type: subject_type.into(),
            object_id: object_id.into(),
            object_type: object_type.into(),
            predicate: predicate.into(),
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// The constrained value of one pattern element.
    pub fn value(&self, field: EdgeField) -> &str {
        match field {
            EdgeField::Subject => &self.subject_id,
            EdgeField::Object => &self.object_id,
            EdgeField::Predicate => &self.predicate,
        }
    }

    /// Predicate with any `biolink:` namespace prefix removed.
    pub fn bare_predicate(&self) -> &str {
        self.predicate
            .strip_prefix("biolink:")
            .unwrap_or(&self.predicate)
    }
}

/// The three constrainable elements of an edge pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeField {
    Subject,
    Object,
    Predicate,
}

impl EdgeField {
    pub const ALL: [EdgeField; 3] = [EdgeField::Subject, EdgeField::Object, EdgeField::Predicate];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeField::Subject => "subject",
            EdgeField::Object => "object",
            EdgeField::Predicate => "predicate",
        }
    }
}

/// Which element of an edge pattern is left unconstrained.
///
/// At most one element floats per query; `None` is a fully fixed pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatingSpec {
    #[default]
    None,
    Subject,
    Object,
    Predicate,
}

impl FloatingSpec {
    pub const ALL: [FloatingSpec; 4] = [
        FloatingSpec::None,
        FloatingSpec::Subject,
        FloatingSpec::Object,
        FloatingSpec::Predicate,
    ];

    /// The floating pattern element, if any.
    pub fn field(self) -> Option<EdgeField> {
        match self {
            FloatingSpec::None => None,
            FloatingSpec::Subject => Some(EdgeField::Subject),
            FloatingSpec::Object => Some(EdgeField::Object),
            FloatingSpec::Predicate => Some(EdgeField::Predicate),
        }
    }

    pub fn floats(self, field: EdgeField) -> bool {
        self.field() == Some(field)
    }

    pub fn is_fixed(self) -> bool {
        self == FloatingSpec::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FloatingSpec::None => "none",
            FloatingSpec::Subject => "subject",
            FloatingSpec::Object => "object",
            FloatingSpec::Predicate => "predicate",
        }
    }
}

impl fmt::Display for FloatingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FloatingSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "fixed" => Ok(FloatingSpec::None),
            "subject" => Ok(FloatingSpec::Subject),
            "object" => Ok(FloatingSpec::Object),
            "predicate" => Ok(FloatingSpec::Predicate),
            other => Err(format!("unknown floating field `{other}`")),
        }
    }
}

// ============================================================================
// Paths
// ============================================================================

/// A chain `n0 — n1 — … — nk` where consecutive nodes share some edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSample {
    nodes: Vec<String>,
    depth_floor: i64,
}

impl PathSample {
    /// Build a chain of `MIN_HOPS..=MAX_HOPS` hops (`nodes.len() == hops + 1`).
    pub fn new(nodes: Vec<String>, depth_floor: i64) -> Result<Self, SampleError> {
        let (min, max) = (MIN_HOPS + 1, MAX_HOPS + 1);
        if nodes.len() < min || nodes.len() > max {
            return Err(SampleError::InvalidPath {
                min,
                max,
                actual: nodes.len(),
            });
        }
        Ok(Self { nodes, depth_floor })
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn hop_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Minimum path length the source table guarantees.
    pub fn depth_floor(&self) -> i64 {
        self.depth_floor
    }

    /// Same chain, relabelled with the floor a query guaranteed.
    pub(crate) fn with_depth_floor(mut self, depth_floor: i64) -> Self {
        self.depth_floor = depth_floor;
        self
    }

    /// The first `hops + 1` nodes, or `None` when the chain is too short.
    pub fn prefix(&self, hops: usize) -> Option<&[String]> {
        self.nodes.get(..=hops)
    }
}

// ============================================================================
// Identifiers and traffic
// ============================================================================

/// A single curie used for identifier-normalization traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierSample(pub String);

impl IdentifierSample {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdentifierSample {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Ordered batch of curies; duplicates are kept.
pub type CurieBatch = Vec<IdentifierSample>;

/// One historical normalization request, reduced to its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub curie_count: u32,
}
