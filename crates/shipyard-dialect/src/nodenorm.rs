//! Identifier-normalization request bodies.

use crate::batch::ndjson_pairs;
use crate::request::RequestBody;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shipyard_sampling::IdentifierSample;

/// Where a batch of identifiers is sent for normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizationTarget {
    /// The normalization service's `get_normalized_nodes` endpoint.
    NodeNormApi,
    /// A BioThings-style query endpoint resolving ids through the
    /// `identifiers.i` scope.
    BiothingsApi,
    /// The search index backing the service, queried with one keyword
    /// `term` per identifier.
    SearchBackend { index: String },
}

impl NormalizationTarget {
    pub fn label(&self) -> &str {
        match self {
            NormalizationTarget::NodeNormApi => "nodenorm-api",
            NormalizationTarget::BiothingsApi => "biothings-api",
            NormalizationTarget::SearchBackend { .. } => "search-backend",
        }
    }
}

pub fn normalization_body(target: &NormalizationTarget, identifiers: &[IdentifierSample]) -> RequestBody {
    let curies: Vec<&str> = identifiers.iter().map(IdentifierSample::as_str).collect();
    match target {
        NormalizationTarget::NodeNormApi => RequestBody::json(&json!({
            "curies": curies,
            "conflate": false,
            "description": false,
            "drug_chemical_conflate": false,
        })),
        NormalizationTarget::BiothingsApi => RequestBody::json(&json!({
            "ids": curies,
            "scopes": ["identifiers.i"],
            "fields": ["identifiers", "type"],
        })),
        NormalizationTarget::SearchBackend { index } => ndjson_pairs(
            &json!({ "index": index }),
            curies.iter().map(|curie| {
                json!({ "query": { "bool": { "filter": [ { "term": { "identifiers.i": curie } } ] } } })
                    .to_string()
            }),
        ),
    }
}
