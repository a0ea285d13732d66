use proptest::prelude::*;
use serde_json::Value;
use shipyard_dialect::{
    Backend, DialectRegistry, IndexHint, Payload, RequestBody, Samples, Shape, SynthesisRequest,
};
use shipyard_sampling::{EdgeField, EdgeSample, FloatingSpec, PathSample};

fn token() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z0-9]{1,8}").unwrap()
}

// Distinct prefixes keep the three constrained values from colliding with
// each other or with the query keywords around them.
fn edge_sample() -> impl Strategy<Value = EdgeSample> {
    (token(), token(), token(), token(), token()).prop_map(|(s, st, o, ot, p)| {
        EdgeSample::new(
            format!("SUBJ:{s}"),
            format!("biolink:Kind{st}"),
            format!("OBJ:{o}"),
            format!("biolink:Kind{ot}"),
            format!("biolink:rel_{p}"),
        )
    })
}

fn path_sample(hops: usize) -> impl Strategy<Value = PathSample> {
    proptest::collection::vec(token(), hops + 1).prop_map(|ids| {
        let nodes = ids.into_iter().enumerate().map(|(i, id)| format!("NODE{i}:{id}")).collect();
        PathSample::new(nodes, 0).unwrap()
    })
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

fn text(body: &RequestBody) -> String {
    String::from_utf8(body.payload.to_bytes().to_vec()).unwrap()
}

/// Every backend/index combination that renders single edges.
fn single_targets() -> Vec<(Backend, Option<IndexHint>)> {
    vec![
        (Backend::Elasticsearch, Some(IndexHint::edges("edges_v1"))),
        (Backend::Elasticsearch, Some(IndexHint::adjacency("nodes_v1"))),
        (Backend::Neo4j, None),
        (Backend::Dgraph, None),
        (Backend::JanusGraph, None),
        (Backend::KuzuDb, None),
        (Backend::Trapi, None),
    ]
}

fn synthesize(
    registry: &DialectRegistry,
    backend: Backend,
    index: Option<&IndexHint>,
    samples: &[EdgeSample],
    floating: FloatingSpec,
) -> String {
    let request = SynthesisRequest {
        backend,
        shape: Shape::Single,
        samples: Samples::Edges(samples),
        floating,
        index,
    };
    text(&registry.synthesize(&request).unwrap())
}

fn marker(sample: &EdgeSample, field: EdgeField) -> String {
    match field {
        EdgeField::Predicate => sample.bare_predicate().to_string(),
        other => sample.value(other).to_string(),
    }
}

proptest! {
    #[test]
    fn floating_drops_exactly_one_constraint(sample in edge_sample()) {
        let registry = DialectRegistry::with_defaults();
        let samples = vec![sample.clone()];
        for (backend, index) in single_targets() {
            let fixed = synthesize(&registry, backend, index.as_ref(), &samples, FloatingSpec::None);
            for field in EdgeField::ALL {
                prop_assert!(fixed.contains(&marker(&sample, field)), "{backend} fixed lacks {field:?}");
            }
            for floating in [FloatingSpec::Subject, FloatingSpec::Object, FloatingSpec::Predicate] {
                let body = synthesize(&registry, backend, index.as_ref(), &samples, floating);
                for field in EdgeField::ALL {
                    let present = body.contains(&marker(&sample, field));
                    prop_assert_eq!(
                        present,
                        !floating.floats(field),
                        "{} floating={} field={:?}",
                        backend,
                        floating,
                        field
                    );
                }
            }
        }
    }

    #[test]
    fn synthesis_is_deterministic(samples in proptest::collection::vec(edge_sample(), 0..6)) {
        let registry = DialectRegistry::with_defaults();
        for (backend, index) in single_targets() {
            for floating in FloatingSpec::ALL {
                let first = synthesize(&registry, backend, index.as_ref(), &samples, floating);
                let second = synthesize(&registry, backend, index.as_ref(), &samples, floating);
                prop_assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn chain_structure_matches_hop_count(hops in 2usize..=5, seed in token()) {
        let registry = DialectRegistry::with_defaults();
        let paths: Vec<PathSample> = (0..2)
            .map(|p| {
                let nodes = (0..=hops).map(|i| format!("P{p}N{i}:{seed}")).collect();
                PathSample::new(nodes, 0).unwrap()
            })
            .collect();
        let chain = |backend| {
            registry
                .synthesize(&SynthesisRequest {
                    backend,
                    shape: Shape::Chain(hops),
                    samples: Samples::Paths(&paths),
                    floating: FloatingSpec::None,
                    index: None,
                })
                .unwrap()
        };

        // Cypher: one statement per path, ids only in the parameter map.
        let body: Value = serde_json::from_str(&text(&chain(Backend::Neo4j))).unwrap();
        let statements = body["statements"].as_array().unwrap();
        prop_assert_eq!(statements.len(), paths.len());
        for (statement, path) in statements.iter().zip(&paths) {
            let cypher = statement["statement"].as_str().unwrap();
            prop_assert_eq!(count(cypher, "-[e"), hops);
            prop_assert_eq!(count(cypher, "(n"), hops + 1);
            let parameters = statement["parameters"].as_object().unwrap();
            prop_assert_eq!(parameters.len(), hops + 1);
            for (i, node) in path.nodes().iter().enumerate() {
                prop_assert_eq!(count(cypher, &format!("$n{i}}}")), 1);
                prop_assert_eq!(parameters[&format!("n{i}")].as_str(), Some(node.as_str()));
            }
        }

        // Kuzu: one statement per path with literal ids.
        let Payload::Statements(statements) = chain(Backend::KuzuDb).payload else {
            panic!("kuzu chains render statement lists");
        };
        prop_assert_eq!(statements.len(), paths.len());
        for (statement, path) in statements.iter().zip(&paths) {
            prop_assert_eq!(count(statement, ":Edge]-"), hops);
            prop_assert_eq!(count(statement, ":Node"), hops + 1);
            for node in path.nodes() {
                prop_assert_eq!(count(statement, node), 1);
            }
        }

        // DQL: one lookup block per path, one nested traversal per hop.
        let dql = text(&chain(Backend::Dgraph));
        prop_assert_eq!(count(&dql, "hoplookup"), paths.len());
        for (block, path) in dql.split("hoplookup").skip(1).zip(&paths) {
            prop_assert_eq!(count(block, "in_edges:"), hops);
            prop_assert_eq!(count(block, "eq(id, "), hops + 1);
            for node in path.nodes() {
                prop_assert_eq!(count(block, node), 1);
            }
        }

        // Gremlin: the script walks k edges; bindings carry n0..nk per path.
        let body: Value = serde_json::from_str(&text(&chain(Backend::JanusGraph))).unwrap();
        let script = body["gremlin"].as_str().unwrap();
        prop_assert_eq!(count(script, ".outE().as('e"), hops);
        prop_assert_eq!(count(script, ".as('v"), hops + 1);
        prop_assert_eq!(count(script, "'all_e"), hops);
        let bindings = body["bindings"]["nodes"].as_array().unwrap();
        prop_assert_eq!(bindings.len(), paths.len());
        for (entry, path) in bindings.iter().zip(&paths) {
            let entry = entry.as_object().unwrap();
            prop_assert_eq!(entry.len(), hops + 1);
            for (i, node) in path.nodes().iter().enumerate() {
                prop_assert_eq!(entry[&format!("n{i}")].as_str(), Some(node.as_str()));
            }
        }
    }

    #[test]
    fn longer_paths_use_their_prefix(path in path_sample(5)) {
        let registry = DialectRegistry::with_defaults();
        let request = SynthesisRequest {
            backend: Backend::KuzuDb,
            shape: Shape::Chain(2),
            samples: Samples::Paths(std::slice::from_ref(&path)),
            floating: FloatingSpec::None,
            index: None,
        };
        let body = text(&registry.synthesize(&request).unwrap());
        prop_assert!(body.contains(path.nodes()[2].as_str()));
        prop_assert!(!body.contains(path.nodes()[3].as_str()));
    }
}
