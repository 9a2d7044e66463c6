//! Tree rewriting.
//!
//! The directive pass walks the tree in pre-order. In every statement
//! sequence it finds directives, removes them, and splices the result of
//! applying the named transformation in place of their targets. Everything
//! the pass does not touch is shared with the input tree.

use crate::directive::{self, DirectiveMatch};
use crate::error::{RewriteError, TransformationError};
use crate::registry::{Transformation, TransformationRegistry};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::Location;
use splice_parser::{Child, NodeKind, SyntaxNode};
use std::sync::Arc;
use tracing::{debug, trace};

/// The name reported for failures of a [`Pass::Direct`] transformation.
pub const DIRECT_PASS_NAME: &str = "<direct>";

/// What a [`Rewriter`] does to a tree.
#[derive(Clone, Copy)]
pub enum Pass<'a> {
    /// Apply the transformations named by `transform!` directives.
    Directives(&'a TransformationRegistry),
    /// Apply one transformation to the root, ignoring directives.
    Direct(&'a dyn Transformation),
}

/// Runs one pass over a tree.
///
/// Transformations are resolved at most once per rewriter.
pub struct Rewriter<'a> {
    pass: Pass<'a>,
    resolved: FxHashMap<SmolStr, Arc<dyn Transformation>>,
    applied: usize,
}

impl<'a> Rewriter<'a> {
    /// Creates a rewriter for `pass`.
    pub fn new(pass: Pass<'a>) -> Self {
        Self {
            pass,
            resolved: FxHashMap::default(),
            applied: 0,
        }
    }

    /// Returns how many transformations this rewriter has applied so far.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Rewrites the tree rooted at `root`.
    ///
    /// Returns `root` itself (same node) when nothing changed. On error no
    /// partial tree is produced.
    pub fn run(&mut self, root: &SyntaxNode) -> Result<SyntaxNode, RewriteError> {
        match self.pass {
            Pass::Direct(transformation) => {
                self.applied += 1;
                transformation.apply(root).map_err(|source| {
                    TransformationError {
                        name: SmolStr::new_static(DIRECT_PASS_NAME),
                        location: root.location(),
                        source,
                    }
                    .into()
                })
            }
            Pass::Directives(registry) => {
                self.resolve_present(registry, root)?;
                self.process(registry, root)
            }
        }
    }

    /// Resolves every directive already in the tree, so an unknown name fails
    /// the rewrite before any transformation runs.
    fn resolve_present(
        &mut self,
        registry: &TransformationRegistry,
        node: &SyntaxNode,
    ) -> Result<(), RewriteError> {
        if node.is_sequence() {
            let statements: Vec<SyntaxNode> = node.child_nodes().cloned().collect();
            for found in directive::scan(&statements) {
                let location = statements[found.directive_index].location();
                self.resolve(registry, &found.name, location)?;
            }
        }
        for child in node.child_nodes() {
            self.resolve_present(registry, child)?;
        }
        Ok(())
    }

    fn resolve(
        &mut self,
        registry: &TransformationRegistry,
        name: &SmolStr,
        location: Option<Location>,
    ) -> Result<Arc<dyn Transformation>, RewriteError> {
        if let Some(transformation) = self.resolved.get(name) {
            return Ok(Arc::clone(transformation));
        }
        let transformation = registry.resolve(name, location)?;
        self.resolved.insert(name.clone(), Arc::clone(&transformation));
        Ok(transformation)
    }

    fn process(
        &mut self,
        registry: &TransformationRegistry,
        node: &SyntaxNode,
    ) -> Result<SyntaxNode, RewriteError> {
        if node.is_sequence() {
            return self.process_sequence(registry, node);
        }

        let mut changed = false;
        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            match child {
                Child::Node(inner) => {
                    let rewritten = self.process(registry, inner)?;
                    changed |= !SyntaxNode::ptr_eq(&rewritten, inner);
                    children.push(Child::Node(rewritten));
                }
                scalar => children.push(scalar.clone()),
            }
        }

        if changed {
            Ok(node.updated(node.kind(), children))
        } else {
            Ok(node.clone())
        }
    }

    fn process_sequence(
        &mut self,
        registry: &TransformationRegistry,
        node: &SyntaxNode,
    ) -> Result<SyntaxNode, RewriteError> {
        let statements: Vec<SyntaxNode> = node.child_nodes().cloned().collect();
        let found = directive::scan(&statements);
        trace!(statements = statements.len(), directives = found.len(), "scanned sequence");

        let mut output = Vec::with_capacity(statements.len());
        let mut pending = found.iter().peekable();
        let mut index = 0;
        while index < statements.len() {
            if let Some(found) = pending.next_if(|found| found.directive_index == index) {
                let replacement = self.apply_directive(
                    registry,
                    found,
                    &statements[found.directive_index],
                    &statements[found.target_index],
                )?;
                // Directives the transformation introduced are honored too.
                let replacement = self.process(registry, &replacement)?;
                splice_into(&mut output, replacement);
                index = found.target_index + 1;
                continue;
            }

            output.push(self.process(registry, &statements[index])?);
            index += 1;
        }

        let unchanged = output.len() == node.children().len()
            && output
                .iter()
                .zip(&statements)
                .all(|(after, before)| SyntaxNode::ptr_eq(after, before));
        if unchanged {
            return Ok(node.clone());
        }

        Ok(match output.len() {
            1 => output.swap_remove(0),
            _ => SyntaxNode::new(NodeKind::Begin, output.into_iter().map(Child::Node)),
        })
    }

    fn apply_directive(
        &mut self,
        registry: &TransformationRegistry,
        found: &DirectiveMatch,
        directive: &SyntaxNode,
        target: &SyntaxNode,
    ) -> Result<SyntaxNode, RewriteError> {
        let location = directive.location();
        let transformation = self.resolve(registry, &found.name, location)?;
        debug!(
            name = %found.name,
            line = location.map(|location| location.start_line()),
            target = %target.kind(),
            "applying transformation"
        );

        self.applied += 1;
        transformation.apply(target).map_err(|source| {
            TransformationError {
                name: found.name.clone(),
                location,
                source,
            }
            .into()
        })
    }
}

/// Appends `node` to a statement list, flattening a sequence into its statements.
fn splice_into(output: &mut Vec<SyntaxNode>, node: SyntaxNode) {
    if node.is_sequence() {
        output.extend(node.child_nodes().cloned());
    } else {
        output.push(node);
    }
}
