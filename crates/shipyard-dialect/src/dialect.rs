//! The capability every backend dialect implements.

use crate::error::SynthesisError;
use crate::request::{Backend, Fragment, IndexHint, RequestBody, Shape};
use shipyard_sampling::{EdgeField, EdgeSample, FloatingSpec};

/// Everything a dialect may consult besides the sample itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub shape: Shape,
    pub floating: FloatingSpec,
    pub index: Option<&'a IndexHint>,
}

impl<'a> RenderContext<'a> {
    pub fn new(shape: Shape, floating: FloatingSpec, index: Option<&'a IndexHint>) -> Self {
        Self {
            shape,
            floating,
            index,
        }
    }
}

/// A backend's query language.
///
/// `render_*` turn one sample into one [`Fragment`]; `frame_batch` packs the
/// fragments into the backend's bulk body. `ordinal` is the sample's position
/// in the batch and is used for block names and error reports.
pub trait QueryDialect: Send + Sync {
    fn backend(&self) -> Backend;

    /// Fully fixed single-edge pattern.
    fn render_single(
        &self,
        ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
    ) -> Result<Fragment, SynthesisError>;

    /// Single-edge pattern with `field` left unconstrained.
    fn render_floating(
        &self,
        ctx: &RenderContext<'_>,
        ordinal: usize,
        sample: &EdgeSample,
        field: EdgeField,
    ) -> Result<Fragment, SynthesisError>;

    fn supports_chain(&self) -> bool {
        false
    }

    /// Chain over `nodes` (`hops + 1` node ids).
    fn render_chain(
        &self,
        ctx: &RenderContext<'_>,
        ordinal: usize,
        nodes: &[String],
    ) -> Result<Fragment, SynthesisError> {
        let _ = (ordinal, nodes);
        Err(SynthesisError::UnsupportedShape {
            backend: self.backend(),
            shape: ctx.shape,
            floating: ctx.floating,
        })
    }

    fn frame_batch(
        &self,
        ctx: &RenderContext<'_>,
        fragments: Vec<Fragment>,
    ) -> Result<RequestBody, SynthesisError>;
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Reject empty values the active path needs.
pub(crate) fn require<'s>(
    ordinal: usize,
    name: &str,
    value: &'s str,
) -> Result<&'s str, SynthesisError> {
    if value.trim().is_empty() {
        Err(SynthesisError::malformed(ordinal, format!("missing {name}")))
    } else {
        Ok(value)
    }
}

pub(crate) fn require_nodes(ordinal: usize, nodes: &[String]) -> Result<(), SynthesisError> {
    for (i, node) in nodes.iter().enumerate() {
        require(ordinal, &format!("node n{i}"), node)?;
    }
    Ok(())
}

/// Variable naming the edge between `n{i}` and `n{i+1}`.
pub(crate) fn edge_variable(i: usize) -> String {
    format!("e{}{}", i, i + 1)
}

/// Backtick-quoted schema identifier; embedded backticks are doubled.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Double-quoted string literal with `\` and `"` escaped.
pub(crate) fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
