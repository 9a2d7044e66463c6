//! The rewrite entry point.

use crate::error::RewriteError;
use crate::registry::{Transformation, TransformationRegistry};
use crate::rewriter::{Pass, Rewriter};
use source_map::{LineMap, SourceMapStore};
use splice_parser::{SyntaxNode, SyntaxTree};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One step of a [`Transformer`].
#[derive(Clone)]
pub enum Step {
    /// Apply the transformations named by directives, resolved in this registry.
    Directives(Arc<TransformationRegistry>),
    /// Apply one transformation to the whole tree.
    Direct(Arc<dyn Transformation>),
}

impl Step {
    /// A directive step over `registry`.
    pub fn directives(registry: TransformationRegistry) -> Self {
        Step::Directives(Arc::new(registry))
    }

    /// A step applying `transformation` to the root.
    pub fn direct(transformation: impl Transformation + 'static) -> Self {
        Step::Direct(Arc::new(transformation))
    }

    fn pass(&self) -> Pass<'_> {
        match self {
            Step::Directives(registry) => Pass::Directives(registry),
            Step::Direct(transformation) => Pass::Direct(transformation.as_ref()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Directives(registry) => f.debug_tuple("Directives").field(registry).finish(),
            Step::Direct(_) => f.write_str("Direct"),
        }
    }
}

/// A sequence of rewrite steps; each step sees the previous step's output.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    steps: Vec<Step>,
}

impl Transformer {
    /// Creates a transformer running `steps` in order.
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// A transformer with a single directive step.
    pub fn with_registry(registry: TransformationRegistry) -> Self {
        Self::new(vec![Step::directives(registry)])
    }

    /// Returns the steps.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Runs every step over `tree`, returning the new root.
    ///
    /// Returns the original root (same node) when no step changed anything.
    pub fn transform_tree(&self, tree: &SyntaxTree) -> Result<SyntaxNode, RewriteError> {
        let mut root = tree.root().clone();
        for step in &self.steps {
            let mut rewriter = Rewriter::new(step.pass());
            root = rewriter.run(&root)?;
            debug!(applied = rewriter.applied(), "finished rewrite step");
        }
        Ok(root)
    }
}

/// A rewritten document.
#[derive(Debug, Clone)]
pub struct Rewritten {
    /// The output text.
    pub text: String,
    /// Maps output lines to input lines.
    pub line_map: Arc<LineMap>,
    /// Whether the output differs from the input.
    pub changed: bool,
}

/// Parses `text`, applies `transformer`, renders the result, and stores its
/// line map under `output_id`, replacing any earlier map for that id.
///
/// The store is only updated when the rewrite succeeds.
pub fn rewrite(
    text: &str,
    output_id: &str,
    transformer: &Transformer,
    store: &SourceMapStore,
) -> Result<String, RewriteError> {
    rewrite_document(text, output_id, transformer, store).map(|rewritten| rewritten.text)
}

/// Like [`rewrite`], also returning the line map and whether anything changed.
pub fn rewrite_document(
    text: &str,
    output_id: &str,
    transformer: &Transformer,
    store: &SourceMapStore,
) -> Result<Rewritten, RewriteError> {
    let tree = splice_parser::parse(text)?;
    let root = transformer.transform_tree(&tree)?;
    let rendered = tree.with_root(root).render();

    let line_map = Arc::new(rendered.line_map);
    store.insert_shared(output_id, Arc::clone(&line_map));
    debug!(output_id, lines = line_map.len(), "stored line map");

    Ok(Rewritten {
        changed: rendered.text != text,
        text: rendered.text,
        line_map,
    })
}
