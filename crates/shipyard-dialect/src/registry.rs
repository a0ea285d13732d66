//! Dialect lookup and the `synthesize` entry point.

use crate::backends::{
    CypherDialect, DqlDialect, GremlinDialect, KuzuDialect, SearchDialect, TrapiDialect,
};
use crate::dialect::{QueryDialect, RenderContext};
use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, IndexHint, RequestBody, Shape};
use shipyard_sampling::{EdgeSample, FloatingSpec, PathSample};
use std::collections::BTreeMap;

/// Samples handed to synthesis; the variant must match the shape.
#[derive(Debug, Clone, Copy)]
pub enum Samples<'a> {
    Edges(&'a [EdgeSample]),
    Paths(&'a [PathSample]),
}

impl Samples<'_> {
    pub fn len(&self) -> usize {
        match self {
            Samples::Edges(edges) => edges.len(),
            Samples::Paths(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub backend: Backend,
    pub shape: Shape,
    pub samples: Samples<'a>,
    pub floating: FloatingSpec,
    pub index: Option<&'a IndexHint>,
}

/// Dialects keyed by backend.
pub struct DialectRegistry {
    dialects: BTreeMap<Backend, Box<dyn QueryDialect>>,
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DialectRegistry {
    pub fn empty() -> Self {
        Self {
            dialects: BTreeMap::new(),
        }
    }

    /// Registry with every built-in dialect.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(SearchDialect));
        registry.register(Box::new(CypherDialect));
        registry.register(Box::new(DqlDialect));
        registry.register(Box::new(GremlinDialect));
        registry.register(Box::new(KuzuDialect));
        registry.register(Box::new(TrapiDialect));
        registry
    }

    pub fn register(&mut self, dialect: Box<dyn QueryDialect>) {
        self.dialects.insert(dialect.backend(), dialect);
    }

    pub fn get(&self, backend: Backend) -> Option<&dyn QueryDialect> {
        self.dialects.get(&backend).map(|d| d.as_ref())
    }

    pub fn backends(&self) -> impl Iterator<Item = Backend> + '_ {
        self.dialects.keys().copied()
    }

    /// Build one bulk request body for `request.samples`.
    ///
    /// Shape support is checked before any sample is looked at, so an
    /// unsupported combination fails even for an empty batch.
    pub fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<RequestBody, SynthesisError> {
        let unsupported = || SynthesisError::UnsupportedShape {
            backend: request.backend,
            shape: request.shape,
            floating: request.floating,
        };

        let dialect = self.get(request.backend).ok_or_else(unsupported)?;
        let ctx = RenderContext::new(request.shape, request.floating, request.index);

        let fragments: Vec<Fragment> = match (request.shape, request.samples) {
            (Shape::Single, Samples::Edges(edges)) => edges
                .iter()
                .enumerate()
                .map(|(ordinal, edge)| match request.floating.field() {
                    None => dialect.render_single(&ctx, ordinal, edge),
                    Some(field) => dialect.render_floating(&ctx, ordinal, edge, field),
                })
                .collect::<Result<Vec<_>, _>>()?,
            (Shape::Chain(hops), Samples::Paths(paths)) => {
                if Shape::chain(hops).is_none()
                    || !request.floating.is_fixed()
                    || !dialect.supports_chain()
                {
                    return Err(unsupported());
                }
                paths
                    .iter()
                    .enumerate()
                    .map(|(ordinal, path)| {
                        let nodes = path.prefix(hops).ok_or_else(|| {
                            SynthesisError::malformed(
                                ordinal,
                                format!(
                                    "{hops}-hop chain needs {} nodes, sample has {}",
                                    hops + 1,
                                    path.nodes().len()
                                ),
                            )
                        })?;
                        dialect.render_chain(&ctx, ordinal, nodes)
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            (Shape::Single, Samples::Paths(_)) => {
                return Err(SynthesisError::malformed(
                    0,
                    "single-edge synthesis was given path samples",
                ))
            }
            (Shape::Chain(_), Samples::Edges(_)) => {
                return Err(SynthesisError::malformed(
                    0,
                    "chain synthesis was given edge samples",
                ))
            }
        };

        let body = dialect.frame_batch(&ctx, fragments)?;
        tracing::debug!(
            backend = %request.backend,
            shape = %request.shape,
            floating = %request.floating,
            samples = request.samples.len(),
            bytes = body.byte_len(),
            "synthesized request body"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_backend_is_unsupported() {
        let registry = DialectRegistry::empty();
        let request = SynthesisRequest {
            backend: Backend::Neo4j,
            shape: Shape::Single,
            samples: Samples::Edges(&[]),
            floating: FloatingSpec::None,
            index: None,
        };
        assert!(matches!(
            registry.synthesize(&request),
            Err(SynthesisError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_defaults_cover_every_backend() {
        let registry = DialectRegistry::with_defaults();
        let registered: Vec<Backend> = registry.backends().collect();
        assert_eq!(registered.len(), Backend::ALL.len());
    }

    #[test]
    fn test_chain_with_floating_is_unsupported() {
        let registry = DialectRegistry::with_defaults();
        let request = SynthesisRequest {
            backend: Backend::Dgraph,
            shape: Shape::Chain(2),
            samples: Samples::Paths(&[]),
            floating: FloatingSpec::Object,
            index: None,
        };
        assert!(matches!(
            registry.synthesize(&request),
            Err(SynthesisError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_short_chain_sample_is_malformed() {
        let registry = DialectRegistry::with_defaults();
        let path = PathSample::new(vec!["A:1".into(), "B:1".into(), "C:1".into()], 1).unwrap();
        let request = SynthesisRequest {
            backend: Backend::KuzuDb,
            shape: Shape::Chain(4),
            samples: Samples::Paths(std::slice::from_ref(&path)),
            floating: FloatingSpec::None,
            index: None,
        };
        assert!(matches!(
            registry.synthesize(&request),
            Err(SynthesisError::MalformedSample { ordinal: 0, .. })
        ));
    }
}
