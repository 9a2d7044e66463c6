//! Parser and renderer for splice source files.
//!
//! This crate provides:
//! - A lexer using `logos`
//! - A recursive descent parser producing immutable s-expression trees
//! - A renderer that reproduces untouched code byte for byte and records,
//!   for every output line, the input line it came from
//!
//! # Example
//!
//! ```
//! use splice_parser::{parse, render};
//!
//! let tree = parse("class Foo\n  bar\nend\n").unwrap();
//! assert_eq!(tree.root().to_sexp(), "(class (const nil :Foo) nil (send nil :bar))");
//!
//! let rendered = render(&tree);
//! assert_eq!(rendered.text, "class Foo\n  bar\nend\n");
//! assert_eq!(rendered.line_map.line(2), Some(2));
//! ```

mod ast;
mod error;
mod lexer;
mod parser;
mod render;

pub use ast::{build, Child, NodeKind, SyntaxNode};
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{operator_precedence, Lexer, Token, TokenKind};
pub use render::{render_node, Rendered};
pub use source_map::{LineMap, Location, Span};

use std::sync::Arc;

/// A parsed program: the input text and the tree describing it.
///
/// Rewriting swaps the root with [`with_root`](Self::with_root); the source
/// stays attached so untouched nodes can still be copied from it.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: Arc<str>,
    root: SyntaxNode,
    /// From the first statement to the end of the last one.
    program: Span,
}

impl SyntaxTree {
    pub(crate) fn new(source: Arc<str>, root: SyntaxNode, program: Span) -> Self {
        Self {
            source,
            root,
            program,
        }
    }

    /// Returns the input text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the shared input text that parsed nodes point into.
    pub fn shared_source(&self) -> &Arc<str> {
        &self.source
    }

    /// Returns the root node.
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Returns the span from the first statement to the end of the last one.
    ///
    /// For a program without statements this is the whole input.
    pub fn program_span(&self) -> Span {
        self.program
    }

    /// Returns a tree over the same source with a different root.
    pub fn with_root(&self, root: SyntaxNode) -> SyntaxTree {
        Self {
            source: Arc::clone(&self.source),
            root,
            program: self.program,
        }
    }

    /// Renders this tree.
    pub fn render(&self) -> Rendered {
        render::render(self)
    }
}

/// Parses source text into a syntax tree.
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    parser::Parser::new(source).parse()
}

/// Renders a tree to text along with its line map.
pub fn render(tree: &SyntaxTree) -> Rendered {
    render::render(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let tree = parse("").unwrap();
        assert!(tree.root().is_sequence());
        assert_eq!(render(&tree).text, "");
    }

    #[test]
    fn test_with_root_keeps_source() {
        let tree = parse("a\n").unwrap();
        let other = tree.with_root(build::int(1));
        assert!(Arc::ptr_eq(tree.shared_source(), other.shared_source()));
        assert_eq!(other.render().text, "1\n");
    }

    #[test]
    fn test_foreign_nodes_render_canonically() {
        let first = parse("foo(  1 )\n").unwrap();
        let second = parse("bar\n").unwrap();
        let rendered = render(&second.with_root(first.root().clone()));
        assert_eq!(rendered.text, "foo(1)\n");
        assert_eq!(rendered.line_map.line(1), None);
    }
}
