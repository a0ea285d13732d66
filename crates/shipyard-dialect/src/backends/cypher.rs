//! Property-graph dialect: Cypher statements in the HTTP transaction envelope.
//!
//! Type labels and the predicate are schema identifiers and are interpolated
//! with backtick quoting. Node ids always travel in `parameters`.

use crate::batch::statements_envelope;
use crate::dialect::{edge_variable, quote_identifier, require, require_nodes, QueryDialect, RenderContext};
use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, RequestBody};
use serde_json::{json, Map, Value};
use shipyard_sampling::{EdgeField, EdgeSample};

pub struct CypherDialect;

/// `(var:`Label` {id: $param})`, or without the id when `param` is `None`.
fn node_pattern(var: &str, label: &str, param: Option<&str>) -> String {
    match param {
        Some(param) => format!("({var}:{} {{id: ${param}}})", quote_identifier(label)),
        None => format!("({var}:{})", quote_identifier(label)),
    }
}

fn statement(text: String, parameters: Map<String, Value>) -> Fragment {
    Fragment::Json(json!({
        "statement": text,
        "parameters": parameters,
    }))
}

impl CypherDialect {
    fn single(
        &self,
        ordinal: usize,
        sample: &EdgeSample,
        floating: Option<EdgeField>,
    ) -> Result<Fragment, SynthesisError> {
        let subject_type = require(ordinal, "subject_type", sample.subject_type())?;
        let object_type = require(ordinal, "object_type", sample.object_type())?;

        let mut parameters = Map::new();
        let mut bind = |field: EdgeField, value: &str| -> Result<Option<&'static str>, SynthesisError> {
            if floating == Some(field) {
                return Ok(None);
            }
            let name = field.as_str();
            parameters.insert(name.to_string(), Value::String(require(ordinal, name, value)?.to_string()));
            Ok(Some(name))
        };
        let subject_param = bind(EdgeField::Subject, sample.subject_id())?;
        let object_param = bind(EdgeField::Object, sample.object_id())?;

        let relationship = if floating == Some(EdgeField::Predicate) {
            "--".to_string()
        } else {
            let predicate = require(ordinal, "predicate", sample.predicate())?;
            format!("-[{}:{}]->", edge_variable(0), quote_identifier(predicate))
        };

        let text = format!(
            "MATCH {}{}{} RETURN *;",
            node_pattern("n0", subject_type, subject_param),
            relationship,
            node_pattern("n1", object_type, object_param),
        );
        Ok(statement(text, parameters))
    }
}

impl QueryDialect for CypherDialect {
    fn backend(&self) -> Backend {
        Backend::Neo4j
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

    /// Untyped, undirected hops between id-pinned nodes.
    fn render_chain(
        &self,
        _ctx: &RenderContext<'_>,
        ordinal: usize,
        nodes: &[String],
    ) -> Result<Fragment, SynthesisError> {
        require_nodes(ordinal, nodes)?;
        let mut text = String::from("MATCH ");
        let mut parameters = Map::new();
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                text.push_str(&format!("-[{}]-", edge_variable(i - 1)));
            }
            text.push_str(&format!("(n{i} {{id: $n{i}}})"));
            parameters.insert(format!("n{i}"), Value::String(node.clone()));
        }
        text.push_str(" RETURN *;");
        Ok(statement(text, parameters))
    }

    fn frame_batch(
        &self,
        _ctx: &RenderContext<'_>,
        fragments: Vec<Fragment>,
    ) -> Result<RequestBody, SynthesisError> {
        Ok(statements_envelope(
            fragments.into_iter().map(Fragment::into_json).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Shape;
    use shipyard_sampling::FloatingSpec;

    fn ctx() -> RenderContext<'static> {
        RenderContext::new(Shape::Single, FloatingSpec::None, None)
    }

    fn sample() -> EdgeSample {
        EdgeSample::new("CHEBI:1", "SmallMolecule", "MONDO:2", "Disease", "treats")
    }

    #[test]
    fn test_fixed_statement() {
        let stmt = CypherDialect.render_single(&ctx(), 0, &sample()).unwrap().into_json();
        assert_eq!(
            stmt["statement"].as_str().unwrap().replace('`', ""),
            "MATCH (n0:SmallMolecule {id: $subject})-[e01:treats]->(n1:Disease {id: $object}) RETURN *;"
        );
        assert_eq!(stmt["parameters"], json!({"subject": "CHEBI:1", "object": "MONDO:2"}));
    }

    #[test]
    fn test_floating_subject_drops_parameter() {
        let stmt = CypherDialect
            .render_floating(&ctx(), 0, &sample(), EdgeField::Subject)
            .unwrap()
            .into_json();
        let text = stmt["statement"].as_str().unwrap();
        assert!(text.starts_with("MATCH (n0:`SmallMolecule`)-"));
        assert!(!text.contains("$subject"));
        assert_eq!(stmt["parameters"], json!({"object": "MONDO:2"}));
    }

    #[test]
    fn test_floating_predicate_is_untyped() {
        let stmt = CypherDialect
            .render_floating(&ctx(), 0, &sample(), EdgeField::Predicate)
            .unwrap()
            .into_json();
        let text = stmt["statement"].as_str().unwrap();
        assert!(text.contains(")--(n1:"));
        assert!(!text.contains("treats"));
    }

    #[test]
    fn test_chain_parameters() {
        let nodes: Vec<String> = ["A:1", "B:2", "C:3"].iter().map(|s| s.to_string()).collect();
        let stmt = CypherDialect.render_chain(&ctx(), 0, &nodes).unwrap().into_json();
        assert_eq!(
            stmt["statement"],
            "MATCH (n0 {id: $n0})-[e01]-(n1 {id: $n1})-[e12]-(n2 {id: $n2}) RETURN *;"
        );
        assert_eq!(stmt["parameters"]["n2"], "C:3");
    }

    #[test]
    fn test_label_quoting_escapes_backticks() {
        let odd = EdgeSample::new("CHEBI:1", "Small`Molecule", "MONDO:2", "Disease", "biolink:treats");
        let stmt = CypherDialect.render_single(&ctx(), 0, &odd).unwrap().into_json();
        assert!(stmt["statement"].as_str().unwrap().contains("`Small``Molecule`"));
    }
}
