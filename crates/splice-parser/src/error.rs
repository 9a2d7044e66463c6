//! Parse error types.

use source_map::{LineCol, Span};
use thiserror::Error;

/// An error that occurred during parsing.
#[derive(Debug, Clone, Error)]
#[error("{kind} at line {}, column {}", .position.line + 1, .position.col + 1)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
    /// The line/column of `span.start` (0-indexed).
    pub position: LineCol,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, position: LineCol) -> Self {
        Self {
            kind,
            span,
            position,
        }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// An unexpected token was encountered.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },

    /// An unexpected end of file was encountered.
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof {
        /// What was expected.
        expected: String,
    },

    /// Text that does not form any token.
    #[error("invalid token: {text}")]
    InvalidToken {
        /// The offending text.
        text: String,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string literal")]
    UnterminatedString,

    /// An integer literal that does not fit in 64 bits.
    #[error("integer literal out of range: {text}")]
    IntegerOverflow {
        /// The literal as written.
        text: String,
    },

    /// The left-hand side of `=` cannot be assigned to.
    #[error("cannot assign to {target}")]
    InvalidAssignment {
        /// The kind of node on the left-hand side.
        target: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: "'end'".to_string(),
                found: "end of file".to_string(),
            },
            Span::from_usize(12, 12),
            LineCol::new(2, 0),
        );
        assert_eq!(
            error.to_string(),
            "unexpected token: expected 'end', found end of file at line 3, column 1"
        );
    }
}
