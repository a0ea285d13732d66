//! Embedded-engine dialect: standalone Cypher statements with inlined
//! string literals, one per sample.

use crate::batch::statement_list;
use crate::dialect::{edge_variable, quote_literal, require, require_nodes, QueryDialect, RenderContext};
use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, RequestBody};
use shipyard_sampling::{EdgeField, EdgeSample};

pub struct KuzuDialect;

/// `{key: "value", ...}`, or empty when no constraint survives.
fn properties(pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let inner: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{key}: {}", quote_literal(value)))
        .collect();
    format!(" {{{}}}", inner.join(", "))
}

fn return_clause(node_count: usize) -> String {
    let mut columns: Vec<String> = (0..node_count)
        .flat_map(|i| [format!("n{i}.id"), format!("n{i}.name"), format!("n{i}.category")])
        .collect();
    for i in 0..node_count.saturating_sub(1) {
        let edge = edge_variable(i);
        columns.push(format!("{edge}.predicate"));
        columns.push(format!("{edge}.primary_knowledge_source"));
    }
    format!("RETURN {};", columns.join(", "))
}

impl KuzuDialect {
    fn single(
        &self,
        ordinal: usize,
        sample: &EdgeSample,
        floating: Option<EdgeField>,
    ) -> Result<Fragment, SynthesisError> {
        let mut subject = Vec::with_capacity(2);
        if floating != Some(EdgeField::Subject) {
            subject.push(("id", require(ordinal, "subject", sample.subject_id())?));
        }
        subject.push(("category", require(ordinal, "subject_type", sample.subject_type())?));

        let mut object = Vec::with_capacity(2);
        if floating != Some(EdgeField::Object) {
            object.push(("id", require(ordinal, "object", sample.object_id())?));
        }
        object.push(("category", require(ordinal, "object_type", sample.object_type())?));

        let mut edge = Vec::with_capacity(1);
        if floating != Some(EdgeField::Predicate) {
            edge.push(("predicate", require(ordinal, "predicate", sample.predicate())?));
        }

        Ok(Fragment::Text(format!(
            "MATCH (n0:Node{})-[{}:Edge{}]-(n1:Node{}) {}",
            properties(&subject),
            edge_variable(0),
            properties(&edge),
            properties(&object),
            return_clause(2),
        )))
    }
}

impl QueryDialect for KuzuDialect {
    fn backend(&self) -> Backend {
        Backend::KuzuDb
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
        let mut pattern = String::from("MATCH ");
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                pattern.push_str(&format!("-[{}:Edge]-", edge_variable(i - 1)));
            }
            pattern.push_str(&format!("(n{i}:Node{})", properties(&[("id", node.as_str())])));
        }
        Ok(Fragment::Text(format!("{pattern} {}", return_clause(nodes.len()))))
    }

    fn frame_batch(
        &self,
        _ctx: &RenderContext<'_>,
        fragments: Vec<Fragment>,
    ) -> Result<RequestBody, SynthesisError> {
        Ok(statement_list(
            fragments.into_iter().map(Fragment::into_text).collect(),
        ))
    }
}
