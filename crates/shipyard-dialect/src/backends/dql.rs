//! Declarative graph dialect (DQL).
//!
//! Each sample becomes one named block rooted at the object node, walking the
//! reverse `source` edge to the subject. Chains root at `n0` and nest one
//! `in_edges` block per hop. The document is shipped as raw bytes.

use crate::batch::dql_document;
use crate::dialect::{quote_literal, require, require_nodes, QueryDialect, RenderContext};
use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, RequestBody};
use shipyard_sampling::{EdgeField, EdgeSample};

pub struct DqlDialect;

const NODE_FIELDS: &str = "id name category";
const EDGE_FIELDS: &str = "predicate primary_knowledge_source";

fn eq(predicate: &str, value: &str) -> String {
    format!("eq({predicate}, {})", quote_literal(value))
}

fn hop_word(hops: usize) -> &'static str {
    match hops {
        2 => "two",
        3 => "three",
        4 => "four",
        5 => "five",
        _ => "multi",
    }
}

impl DqlDialect {
    fn single(
        &self,
        ordinal: usize,
        sample: &EdgeSample,
        floating: Option<EdgeField>,
    ) -> Result<Fragment, SynthesisError> {
        let root = match floating {
            Some(EdgeField::Object) => eq("category", require(ordinal, "object_type", sample.object_type())?),
            _ => eq("id", require(ordinal, "object", sample.object_id())?),
        };
        let target = match floating {
            Some(EdgeField::Subject) => eq("category", require(ordinal, "subject_type", sample.subject_type())?),
            _ => eq("id", require(ordinal, "subject", sample.subject_id())?),
        };
        let edge_filter = match floating {
            Some(EdgeField::Predicate) => String::new(),
            _ => {
                let predicate = require(ordinal, "predicate", sample.bare_predicate())?;
                format!(" @filter({})", eq("predicate", predicate))
            }
        };

        Ok(Fragment::Text(format!(
            "node{ordinal}(func: {root}) @cascade {{ {NODE_FIELDS} \
             in_edges: ~source{edge_filter} {{ {EDGE_FIELDS} \
             node: target @filter({target}) {{ {NODE_FIELDS} }} }} }}"
        )))
    }
}

impl QueryDialect for DqlDialect {
    fn backend(&self) -> Backend {
        Backend::Dgraph
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

    fn supports_chain(&self) -> bool {
        true
    }

    fn render_chain(
        &self,
        _ctx: &RenderContext<'_>,
        ordinal: usize,
        nodes: &[String],
    ) -> Result<Fragment, SynthesisError> {
        require_nodes(ordinal, nodes)?;
        let Some((first, rest)) = nodes.split_first() else {
            return Err(SynthesisError::malformed(ordinal, "empty path"));
        };

        let mut block = format!(
            "{}hoplookup{ordinal}(func: {}) @cascade {{ {NODE_FIELDS}",
            hop_word(rest.len()),
            eq("id", first)
        );
        for node in rest {
            block.push_str(&format!(
                " in_edges: ~source {{ {EDGE_FIELDS} target @filter({}) {{ {NODE_FIELDS}",
                eq("id", node)
            ));
        }
        for _ in rest {
            block.push_str(" } }");
        }
        block.push_str(" }");
        Ok(Fragment::Text(block))
    }

    fn frame_batch(
        &self,
        _ctx: &RenderContext<'_>,
        fragments: Vec<Fragment>,
    ) -> Result<RequestBody, SynthesisError> {
        Ok(dql_document(fragments.into_iter().map(Fragment::into_text)))
    }
}
