//! Document-search dialect (multi-search bulk bodies).
//!
//! Two index layouts are supported:
//!
//! - **edge table**: one document per edge, filtered with keyword `term`s on
//!   `subject.keyword`, `object.keyword` and `predicate.keyword`. A floating
//!   field simply loses its `term`.
//! - **adjacency list**: one document per node with nested `in_edges` /
//!   `out_edges`. The query pins the surviving endpoint by `_id` and matches
//!   the edge through a `nested` filter with `inner_hits` capped at one; the
//!   adjacency arrays are excluded from `_source`.

use crate::batch::ndjson_pairs;
use crate::dialect::{require, QueryDialect, RenderContext};
use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, IndexHint, IndexLayout, RequestBody};
use serde_json::{json, Value};
use shipyard_sampling::{EdgeField, EdgeSample};

pub struct SearchDialect;

fn term(field: &str, value: &str) -> Value {
    json!({ "term": { field: value } })
}

fn bool_filter(source: Value, filter: Vec<Value>) -> Value {
    json!({
        "_source": source,
        "query": { "bool": { "filter": filter } },
    })
}

fn excluded_adjacency() -> Value {
    json!({ "excludes": ["in_edges", "out_edges"] })
}

fn nested(path: &str, filter: Vec<Value>) -> Value {
    json!({
        "nested": {
            "path": path,
            "query": { "bool": { "filter": filter } },
            "inner_hits": { "size": 1 },
        }
    })
}

fn edge_term(ordinal: usize, sample: &EdgeSample, field: EdgeField) -> Result<Value, SynthesisError> {
    let value = require(ordinal, field.as_str(), sample.value(field))?;
    Ok(term(&format!("{}.keyword", field.as_str()), value))
}

impl SearchDialect {
    fn index<'a>(&self, ctx: &RenderContext<'a>) -> Result<&'a IndexHint, SynthesisError> {
        ctx.index.ok_or(SynthesisError::MissingIndex {
            backend: Backend::Elasticsearch,
        })
    }

    fn edge_table(
        &self,
        ordinal: usize,
        sample: &EdgeSample,
        floating: Option<EdgeField>,
    ) -> Result<Value, SynthesisError> {
        let filter = EdgeField::ALL
            .iter()
            .filter(|field| Some(**field) != floating)
            .map(|field| edge_term(ordinal, sample, *field))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bool_filter(Value::Bool(true), filter))
    }

    fn adjacency_fixed(&self, ordinal: usize, sample: &EdgeSample) -> Result<Value, SynthesisError> {
        let subject = require(ordinal, "subject", sample.subject_id())?;
        let object = require(ordinal, "object", sample.object_id())?;
        let predicate = require(ordinal, "predicate", sample.predicate())?;
        Ok(bool_filter(
            excluded_adjacency(),
            vec![
                term("_id", subject),
                nested(
                    "out_edges",
                    vec![
                        term("out_edges.object.keyword", object),
                        term("out_edges.predicate.keyword", predicate),
                    ],
                ),
            ],
        ))
    }

    /// Floating subject walks `in_edges` from the object; otherwise the
    /// subject document's `out_edges` are searched.
    fn adjacency_floating(
        &self,
        ordinal: usize,
        sample: &EdgeSample,
        field: EdgeField,
    ) -> Result<Value, SynthesisError> {
        let (origin, edge_class) = match field {
            EdgeField::Subject => (EdgeField::Object, "in_edges"),
            EdgeField::Object | EdgeField::Predicate => (EdgeField::Subject, "out_edges"),
        };
        let origin_id = require(ordinal, origin.as_str(), sample.value(origin))?;

        let inner = match field {
            EdgeField::Predicate => term(
                &format!("{edge_class}.object.keyword"),
                require(ordinal, "object", sample.object_id())?,
            ),
            EdgeField::Subject | EdgeField::Object => term(
                &format!("{edge_class}.predicate.keyword"),
                require(ordinal, "predicate", sample.predicate())?,
            ),
        };

        Ok(bool_filter(
            excluded_adjacency(),
            vec![term("_id", origin_id), nested(edge_class, vec![inner])],
        ))
    }
}

impl QueryDialect for SearchDialect {
    fn backend(&self) -> Backend {
        Backend::Elasticsearch
    }

    fn render_single(
        &self,
        ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
    ) -> Result<Fragment, SynthesisError> {
        let query = match self.index(ctx)?.layout {
            IndexLayout::EdgeTable => self.edge_table(ordinal, sample, None)?,
            IndexLayout::AdjacencyList => self.adjacency_fixed(ordinal, sample)?,
        };
        Ok(Fragment::Json(query))
    }

    fn render_floating(
        &self,
        ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
        field: EdgeField,
    ) -> Result<Fragment, SynthesisError> {
        let query = match self.index(ctx)?.layout {
            IndexLayout::EdgeTable => self.edge_table(ordinal, sample, Some(field))?,
            IndexLayout::AdjacencyList => self.adjacency_floating(ordinal, sample, field)?,
        };
        Ok(Fragment::Json(query))
    }

    fn frame_batch(
        &self,
        ctx: &RenderContext<'_>,
        fragments: Vec<Fragment>,
    ) -> Result<RequestBody, SynthesisError> {
        let index = self.index(ctx)?;
        Ok(ndjson_pairs(
            &json!({ "index": index.name }),
            fragments.into_iter().map(Fragment::into_text),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Shape;
    use shipyard_sampling::FloatingSpec;

    fn sample() -> EdgeSample {
        EdgeSample::new("CHEBI:1", "SmallMolecule", "MONDO:2", "Disease", "biolink:treats")
    }

    fn render(hint: &IndexHint, floating: FloatingSpec) -> Value {
        let ctx = RenderContext::new(Shape::Single, floating, Some(hint));
        let fragment = match floating.field() {
            None => SearchDialect.render_single(&ctx, 0, &sample()),
            Some(field) => SearchDialect.render_floating(&ctx, 0, &sample(), field),
        };
        fragment.unwrap().into_json()
    }

    #[test]
    fn test_edge_table_fixed_terms() {
        let query = render(&IndexHint::edges("edges_v1"), FloatingSpec::None);
        let filter = query["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filter.len(), 3);
        assert_eq!(filter[0]["term"]["subject.keyword"], "CHEBI:1");
        assert_eq!(filter[2]["term"]["predicate.keyword"], "biolink:treats");
        assert_eq!(query["_source"], true);
    }

    #[test]
    fn test_adjacency_floating_subject_walks_in_edges() {
        let query = render(&IndexHint::adjacency("nodes_adj"), FloatingSpec::Subject);
        let filter = query["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filter[0]["term"]["_id"], "MONDO:2");
        assert_eq!(filter[1]["nested"]["path"], "in_edges");
        assert_eq!(filter[1]["nested"]["inner_hits"]["size"], 1);
        assert_eq!(
            filter[1]["nested"]["query"]["bool"]["filter"][0]["term"]["in_edges.predicate.keyword"],
            "biolink:treats"
        );
        assert_eq!(query["_source"]["excludes"], json!(["in_edges", "out_edges"]));
    }

    #[test]
    fn test_adjacency_floating_predicate_matches_object() {
        let query = render(&IndexHint::adjacency("nodes_adj"), FloatingSpec::Predicate);
        let filter = query["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filter[0]["term"]["_id"], "CHEBI:1");
        assert_eq!(
            filter[1]["nested"]["query"]["bool"]["filter"][0]["term"]["out_edges.object.keyword"],
            "MONDO:2"
        );
    }

    #[test]
    fn test_missing_index_hint() {
        let ctx = RenderContext::new(Shape::Single, FloatingSpec::None, None);
        assert!(matches!(
            SearchDialect.render_single(&ctx, 0, &sample()),
            Err(SynthesisError::MissingIndex { .. })
        ));
    }
}
