//! Scenario names and the built-in catalogue.
//!
//! Names read `<pattern>.<backend>[.<variant>]`:
//!
//! | pattern | meaning |
//! |---|---|
//! | `fixed` | single edge, every element constrained |
//! | `floating-subject` / `-object` / `-predicate` | single edge, one element left open |
//! | `2hop` … `5hop` | chain of k edges from a path table |
//! | `stress` | identifier batches of `NUM_SAMPLE` against a normalization backend |
//! | `traffic` | identifier batches sized by the replayed traffic histogram |
//! | `equality` | the same batch against two normalization deployments, responses compared |
//!
//! Graph variants select a search index layout (`adjacency-list`) or a
//! search cluster; normalization variants select the body format
//! (`redis`, `elasticsearch`, `backend`).

use crate::error::DriverError;
use shipyard_dialect::{Backend, IndexHint, NormalizationTarget, Shape};
use shipyard_sampling::{FloatingSpec, MAX_HOPS, MIN_HOPS};
use std::fmt;
use std::str::FromStr;

pub const EDGE_INDEX: &str = "rtx_kg2_edges";
pub const ADJACENCY_INDEX: &str = "rtx_kg2_nodes_adjacency_list";
pub const NODENORM_INDEX: &str = "nodenorm";

/// How identifier batches are sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// `NUM_SAMPLE` every iteration.
    Fixed,
    /// Re-drawn from the traffic histogram every replay window.
    Replayed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workload {
    Graph {
        backend: Backend,
        shape: Shape,
        floating: FloatingSpec,
        index: Option<IndexHint>,
    },
    Normalization {
        target: NormalizationTarget,
        sizing: Sizing,
    },
    /// Same normalization request sent to two deployments.
    Equality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    pub workload: Workload,
    /// Cluster alias for multi-cluster backends.
    pub cluster: Option<String>,
}

impl Scenario {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path table for chain workloads (`twohop`, `threehop`, …).
    pub fn path_table(&self) -> Option<String> {
        match self.workload {
            Workload::Graph {
                shape: Shape::Chain(hops),
                ..
            } => Some(format!("{}hop", hop_word(hops))),
            _ => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub(crate) fn hop_word(hops: usize) -> &'static str {
    match hops {
        2 => "two",
        3 => "three",
        4 => "four",
        5 => "five",
        _ => "multi",
    }
}

fn parse_pattern(pattern: &str) -> Option<(Shape, FloatingSpec)> {
    match pattern {
        "fixed" => Some((Shape::Single, FloatingSpec::None)),
        "floating-subject" => Some((Shape::Single, FloatingSpec::Subject)),
        "floating-object" => Some((Shape::Single, FloatingSpec::Object)),
        "floating-predicate" => Some((Shape::Single, FloatingSpec::Predicate)),
        other => {
            let hops: usize = other.strip_suffix("hop")?.parse().ok()?;
            Shape::chain(hops).map(|shape| (shape, FloatingSpec::None))
        }
    }
}

fn normalization_target(variant: Option<&str>) -> Option<NormalizationTarget> {
    match variant {
        None | Some("redis") => Some(NormalizationTarget::NodeNormApi),
        Some("elasticsearch") | Some("biothings") => Some(NormalizationTarget::BiothingsApi),
        Some("backend") => Some(NormalizationTarget::SearchBackend {
            index: NODENORM_INDEX.to_string(),
        }),
        Some(_) => None,
    }
}

impl FromStr for Scenario {
    type Err = DriverError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let unknown = || DriverError::UnknownScenario(name.to_string());
        let mut parts = name.splitn(3, '.');
        let pattern = parts.next().ok_or_else(unknown)?;
        let backend = parts.next().ok_or_else(unknown)?;
        let variant = parts.next();

        let (workload, cluster) = match (pattern, backend) {
            ("stress", "nodenorm") | ("traffic", "nodenorm") => {
                let sizing = if pattern == "traffic" {
                    Sizing::Replayed
                } else {
                    Sizing::Fixed
                };
                let target = normalization_target(variant).ok_or_else(unknown)?;
                (Workload::Normalization { target, sizing }, None)
            }
            ("equality", "nodenorm") => (Workload::Equality, None),
            _ => {
                let (shape, floating) = parse_pattern(pattern).ok_or_else(unknown)?;
                let backend: Backend = backend.parse().map_err(|_| unknown())?;
                let (index, cluster) = match (backend, variant) {
                    (Backend::Elasticsearch, Some("adjacency-list")) => {
                        (Some(IndexHint::adjacency(ADJACENCY_INDEX)), None)
                    }
                    (Backend::Elasticsearch, cluster) => {
                        (Some(IndexHint::edges(EDGE_INDEX)), cluster.map(str::to_string))
                    }
                    (_, None) => (None, None),
                    (_, Some(_)) => return Err(unknown()),
                };
                (
                    Workload::Graph {
                        backend,
                        shape,
                        floating,
                        index,
                    },
                    cluster,
                )
            }
        };

        Ok(Scenario {
            name: name.to_string(),
            workload,
            cluster,
        })
    }
}

/// Every built-in scenario, in display order.
pub fn catalogue() -> Vec<Scenario> {
    let mut names: Vec<String> = Vec::new();
    let floating_patterns = ["fixed", "floating-subject", "floating-object", "floating-predicate"];

    for pattern in floating_patterns {
        for backend in Backend::ALL {
            names.push(format!("{pattern}.{backend}"));
        }
        names.push(format!("{pattern}.elasticsearch.adjacency-list"));
    }
    for hops in MIN_HOPS..=MAX_HOPS {
        for backend in [Backend::Neo4j, Backend::Dgraph, Backend::JanusGraph, Backend::KuzuDb] {
            names.push(format!("{hops}hop.{backend}"));
        }
    }
    for variant in ["redis", "elasticsearch", "backend"] {
        names.push(format!("stress.nodenorm.{variant}"));
    }
    names.push("traffic.nodenorm.elasticsearch".to_string());
    names.push("equality.nodenorm".to_string());

    names
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect()
}

impl Workload {
    /// One-line human description.
    pub fn describe(&self) -> String {
        match self {
            Workload::Graph {
                backend,
                shape,
                floating,
                index,
            } => {
                let mut text = format!("{backend} {shape}");
                if let Some(field) = floating.field() {
                    text.push_str(&format!(", {} floating", field.as_str()));
                }
                if let Some(index) = index {
                    text.push_str(&format!(", index {}", index.name));
                }
                text
            }
            Workload::Normalization { target, sizing } => match sizing {
                Sizing::Fixed => format!("{} normalization, NUM_SAMPLE identifiers", target.label()),
                Sizing::Replayed => format!("{} normalization, replayed traffic sizes", target.label()),
            },
            Workload::Equality => "normalization response equality across deployments".to_string(),
        }
    }
}
