//! TRAPI query-graph dialect.
//!
//! Every sample contributes edge `e{i}` between nodes `n0-e{i}` and
//! `n1-e{i}`; the batch is one message whose query graph holds them all.

use crate::dialect::{require, QueryDialect, RenderContext};
use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, RequestBody};
use serde_json::{json, Map, Value};
use shipyard_sampling::{EdgeField, EdgeSample};

pub struct TrapiDialect;

fn query_node(id: Option<&str>, category: &str) -> Value {
    match id {
        Some(id) => json!({ "ids": [id], "categories": [category] }),
        None => json!({ "categories": [category] }),
    }
}

impl TrapiDialect {
    fn single(
        &self,
        ordinal: usize,
        sample: &EdgeSample,
        floating: Option<EdgeField>,
    ) -> Result<Fragment, SynthesisError> {
        let edge_key = format!("e{ordinal}");
        let subject_key = format!("n0-{edge_key}");
        let object_key = format!("n1-{edge_key}");

        let subject_id = match floating {
            Some(EdgeField::Subject) => None,
            _ => Some(require(ordinal, "subject", sample.subject_id())?),
        };
        let object_id = match floating {
            Some(EdgeField::Object) => None,
            _ => Some(require(ordinal, "object", sample.object_id())?),
        };

        let mut edge = Map::new();
        edge.insert("subject".into(), Value::String(subject_key.clone()));
        edge.insert("object".into(), Value::String(object_key.clone()));
        if floating != Some(EdgeField::Predicate) {
            let predicate = require(ordinal, "predicate", sample.predicate())?;
            edge.insert("predicates".into(), json!([predicate]));
        }

        let subject_node = query_node(subject_id, require(ordinal, "subject_type", sample.subject_type())?);
        let object_node = query_node(object_id, require(ordinal, "object_type", sample.object_type())?);

        Ok(Fragment::Json(json!({
            "edges": { edge_key: edge },
            "nodes": { subject_key: subject_node, object_key: object_node },
        })))
    }
}

impl QueryDialect for TrapiDialect {
    fn backend(&self) -> Backend {
        Backend::Trapi
    }

    fn render_single(
        &self,
        _ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
    ) -> Result<Fragment, SynthesisError> {
        self.single(ordinal, sample, None)
    }

    fn render_floating(
        &self,
        _ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
        field: EdgeField,
    ) -> Result<Fragment, SynthesisError> {
        self.single(ordinal, sample, Some(field))
    }

    fn frame_batch(
        &self,
        _ctx: &RenderContext<'_>,
        fragments: Vec<Fragment>,
    ) -> Result<RequestBody, SynthesisError> {
        let mut edges = Map::new();
        let mut nodes = Map::new();
        for fragment in fragments {
            if let Value::Object(mut part) = fragment.into_json() {
                if let Some(Value::Object(e)) = part.remove("edges") {
                    edges.extend(e);
                }
                if let Some(Value::Object(n)) = part.remove("nodes") {
                    nodes.extend(n);
                }
            }
        }
        Ok(RequestBody::json(&json!({
            "message": { "query_graph": { "nodes": nodes, "edges": edges } }
        })))
    }
}
