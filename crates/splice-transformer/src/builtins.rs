//! Transformations available in every registry built with
//! [`TransformationRegistry::with_builtins`].

use crate::error::BoxError;
use crate::registry::{Transformation, TransformationRegistry};
use splice_parser::{NodeKind, SyntaxNode};

/// Removes its target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strip;

impl Strip {
    /// The name `Strip` is registered under.
    pub const NAME: &'static str = "Splice::Strip";
}

impl Transformation for Strip {
    fn apply(&self, _node: &SyntaxNode) -> Result<SyntaxNode, BoxError> {
        Ok(SyntaxNode::new(NodeKind::Begin, []))
    }
}

/// Replaces a `class`, `module` or `do` block with the statements of its body.
///
/// Anything else is returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwrap;

impl Unwrap {
    /// The name `Unwrap` is registered under.
    pub const NAME: &'static str = "Splice::Unwrap";
}

impl Transformation for Unwrap {
    fn apply(&self, node: &SyntaxNode) -> Result<SyntaxNode, BoxError> {
        let body_slot = match node.kind() {
            NodeKind::Class | NodeKind::Block => 2,
            NodeKind::Module => 1,
            _ => return Ok(node.clone()),
        };
        Ok(node
            .node_at(body_slot)
            .cloned()
            .unwrap_or_else(|| SyntaxNode::new(NodeKind::Begin, [])))
    }
}

pub(crate) fn register_all(registry: &mut TransformationRegistry) {
    registry.register(Strip::NAME, Strip);
    registry.register(Unwrap::NAME, Unwrap);
}
