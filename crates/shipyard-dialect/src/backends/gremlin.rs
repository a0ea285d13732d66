//! Scripted-traversal dialect: one Gremlin script per batch, samples bound as
//! a list.
//!
//! Fragments are the binding entries; the script is chosen at framing time
//! from the shape and floating field. Single-edge scripts loop over
//! `samples`, chain scripts over `nodes`.

use crate::batch::gremlin_envelope;
use crate::dialect::{require, require_nodes, QueryDialect, RenderContext};
use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, RequestBody, Shape};
use serde_json::{Map, Value};
use shipyard_sampling::{EdgeField, EdgeSample, FloatingSpec};

pub struct GremlinDialect;

const VERTEX_PROPERTIES: &str = "valueMap('id', 'name', 'category')";
const EDGE_PROJECTION: &str = "project('edge_label', 'primary_knowledge_source').by(label()).by(values('primary_knowledge_source'))";

const FIXED_SCRIPT: &str = r#"def out = []
for (sample in samples) {
  out.addAll(
    g.V().has('id', sample.subject).as('subject')
      .outE(sample.predicate).as('edge')
      .inV().has('id', sample.object).limit(1).as('object')
      .project('subject', 'edges', 'object')
      .by(select('subject').by(VERTEX))
      .by(select('subject').outE(sample.predicate).where(inV().has('id', sample.object)).EDGE.fold())
      .by(select('object').by(VERTEX))
  )
}
return out"#;

const FLOATING_SUBJECT_SCRIPT: &str = r#"def out = []
for (sample in samples) {
  out.addAll(
    g.V().has('id', sample.object).limit(1).as('object')
      .project('object', 'pairs')
      .by(VERTEX)
      .by(
        __.inE(sample.predicate).as('edge')
          .outV().hasLabel(sample.subject_type).as('subject')
          .project('edge', 'subject')
          .by(select('edge').EDGE)
          .by(VERTEX).fold()
      )
  )
}
return out"#;

const FLOATING_OBJECT_SCRIPT: &str = r#"def out = []
for (sample in samples) {
  out.addAll(
    g.V().has('id', sample.subject).limit(1).as('subject')
      .project('subject', 'pairs')
      .by(VERTEX)
      .by(
        __.outE(sample.predicate).as('edge')
          .inV().hasLabel(sample.object_type).as('object')
          .project('edge', 'object')
          .by(select('edge').EDGE)
          .by(VERTEX).fold()
      )
  )
}
return out"#;

const FLOATING_PREDICATE_SCRIPT: &str = r#"def out = []
for (sample in samples) {
  out.addAll(
    g.V().has('id', sample.subject).as('subject')
      .outE().as('edge')
      .inV().has('id', sample.object).limit(1).as('object')
      .project('nodes', 'edges')
      .by(select('subject', 'object').by(VERTEX).by(VERTEX))
      .by(select('subject').outE().where(inV().has('id', sample.object)).EDGE.fold())
  )
}
return out"#;

fn expand(template: &str) -> String {
    template
        .replace("VERTEX", VERTEX_PROPERTIES)
        .replace("EDGE", EDGE_PROJECTION)
}

fn strip_biolink(value: &str) -> &str {
    value.strip_prefix("biolink:").unwrap_or(value)
}

/// Loop over `nodes`, walking `hops` outgoing edges and projecting every
/// vertex and every hop's edges into one record per path.
fn chain_script(hops: usize) -> String {
    let mut traversal = String::from("g.V().has('id', n.n0).as('v0')");
    for i in 0..hops {
        traversal.push_str(&format!(
            "\n      .outE().as('e{i}').inV().has('id', n.n{next}).limit(1).as('v{next}')",
            next = i + 1
        ));
    }

    let labels: Vec<String> = (0..=hops).map(|i| format!("'v{i}'")).collect();
    let vertex_bys = format!(".by({VERTEX_PROPERTIES})").repeat(hops + 1);
    let edge_keys: Vec<String> = (0..hops).map(|i| format!("'all_e{i}'")).collect();
    let edge_bys: String = (0..hops)
        .map(|i| {
            format!(
                "\n        .by(select('v{i}').outE().where(inV().has('id', n.n{next})).{EDGE_PROJECTION}.fold())",
                next = i + 1
            )
        })
        .collect();

    format!(
        "def out = []\nfor (n in nodes) {{\n  out.addAll(\n    {traversal}\n      .project('nodes', 'edges')\n      .by(select({}){vertex_bys})\n      .by(project({}){edge_bys})\n  )\n}}\nreturn out",
        labels.join(", "),
        edge_keys.join(", "),
    )
}

impl GremlinDialect {
    /// Binding entry for one sample; the floating field's value is left out.
    fn binding(
        &self,
        ordinal: usize,
        sample: &EdgeSample,
        floating: Option<EdgeField>,
    ) -> Result<Fragment, SynthesisError> {
        let mut entry = Map::new();
        let mut put = |key: &str, value: &str| -> Result<(), SynthesisError> {
            entry.insert(key.to_string(), Value::String(require(ordinal, key, value)?.to_string()));
            Ok(())
        };
        match floating {
            Some(EdgeField::Subject) => put("subject_type", strip_biolink(sample.subject_type()))?,
            _ => put("subject", sample.subject_id())?,
        }
        match floating {
            Some(EdgeField::Object) => put("object_type", strip_biolink(sample.object_type()))?,
            _ => put("object", sample.object_id())?,
        }
        if floating != Some(EdgeField::Predicate) {
            put("predicate", sample.bare_predicate())?;
        }
        Ok(Fragment::Json(Value::Object(entry)))
    }

    fn script(&self, ctx: &RenderContext<'_>) -> (String, &'static str) {
        match ctx.shape {
            Shape::Chain(hops) => (chain_script(hops), "nodes"),
            Shape::Single => {
                let template = match ctx.floating {
                    FloatingSpec::None => FIXED_SCRIPT,
                    FloatingSpec::Subject => FLOATING_SUBJECT_SCRIPT,
                    FloatingSpec::Object => FLOATING_OBJECT_SCRIPT,
                    FloatingSpec::Predicate => FLOATING_PREDICATE_SCRIPT,
                };
                (expand(template), "samples")
            }
        }
    }
}

impl QueryDialect for GremlinDialect {
    fn backend(&self) -> Backend {
        Backend::JanusGraph
    }

    fn render_single(
        &self,
        _ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
    ) -> Result<Fragment, SynthesisError> {
        self.binding(ordinal, sample, None)
    }

    fn render_floating(
        &self,
        _ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
        field: EdgeField,
    ) -> Result<Fragment, SynthesisError> {
        self.binding(ordinal, sample, Some(field))
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
        let entry: Map<String, Value> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (format!("n{i}"), Value::String(node.clone())))
            .collect();
        Ok(Fragment::Json(Value::Object(entry)))
    }

    fn frame_batch(
        &self,
        ctx: &RenderContext<'_>,
        fragments: Vec<Fragment>,
    ) -> Result<RequestBody, SynthesisError> {
        let (script, binding) = self.script(ctx);
        Ok(gremlin_envelope(
            script,
            binding,
            fragments.into_iter().map(Fragment::into_json).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> EdgeSample {
        EdgeSample::new("CHEBI:1", "biolink:SmallMolecule", "MONDO:2", "biolink:Disease", "biolink:treats")
    }

    #[test]
    fn test_fixed_binding_and_script() {
        let ctx = RenderContext::new(Shape::Single, FloatingSpec::None, None);
        let fragment = GremlinDialect.render_single(&ctx, 0, &sample()).unwrap();
        let body = GremlinDialect.frame_batch(&ctx, vec![fragment]).unwrap();
        let value: Value = serde_json::from_str(body.payload.as_text().unwrap()).unwrap();
        assert_eq!(
            value["bindings"]["samples"],
            json!([{"subject": "CHEBI:1", "object": "MONDO:2", "predicate": "treats"}])
        );
        let script = value["gremlin"].as_str().unwrap();
        assert!(script.contains("for (sample in samples)"));
        assert!(!script.contains("VERTEX"));
    }

    #[test]
    fn test_floating_subject_binds_category() {
        let ctx = RenderContext::new(Shape::Single, FloatingSpec::Subject, None);
        let entry = GremlinDialect
            .render_floating(&ctx, 0, &sample(), EdgeField::Subject)
            .unwrap()
            .into_json();
        assert_eq!(entry, json!({"subject_type": "SmallMolecule", "object": "MONDO:2", "predicate": "treats"}));
        assert!(GremlinDialect.script(&ctx).0.contains("hasLabel(sample.subject_type)"));
    }

    #[test]
    fn test_chain_script_walks_every_hop() {
        let script = chain_script(3);
        assert_eq!(script.matches(".outE().as('e").count(), 3);
        assert!(script.contains("has('id', n.n3)"));
        assert!(script.contains("select('v0', 'v1', 'v2', 'v3')"));
        assert!(script.contains("project('all_e0', 'all_e1', 'all_e2')"));
    }

    #[test]
    fn test_chain_binding_keys() {
        let ctx = RenderContext::new(Shape::Chain(2), FloatingSpec::None, None);
        let nodes: Vec<String> = ["A:0", "A:1", "A:2"].iter().map(|s| s.to_string()).collect();
        let entry = GremlinDialect.render_chain(&ctx, 0, &nodes).unwrap().into_json();
        assert_eq!(entry, json!({"n0": "A:0", "n1": "A:1", "n2": "A:2"}));
    }
}
