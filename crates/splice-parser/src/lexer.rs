//! Lexer using logos.
//!
//! Spaces, tabs, line continuations, and `#` comments are skipped. Newlines
//! are kept because they terminate statements.

use logos::Logos;
use source_map::Span;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"\\\r?\n")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
pub enum TokenKind {
    // === Keywords ===
    /// `class`
    #[token("class")]
    Class,

    /// `module`
    #[token("module")]
    Module,

    /// `def`
    #[token("def")]
    Def,

    /// `do`
    #[token("do")]
    Do,

    /// `end`
    #[token("end")]
    End,

    /// `if`
    #[token("if")]
    If,

    /// `else`
    #[token("else")]
    Else,

    /// `then`
    #[token("then")]
    Then,

    /// `nil`
    #[token("nil")]
    Nil,

    /// `true`
    #[token("true")]
    True,

    /// `false`
    #[token("false")]
    False,

    /// `self`
    #[token("self")]
    SelfKw,

    // === Punctuation ===
    /// `(`
    #[token("(")]
    LParen,

    /// `)`
    #[token(")")]
    RParen,

    /// `[`
    #[token("[")]
    LBracket,

    /// `]`
    #[token("]")]
    RBracket,

    /// `,`
    #[token(",")]
    Comma,

    /// `.`
    #[token(".")]
    Dot,

    /// `::`
    #[token("::")]
    ColonColon,

    /// `|`
    #[token("|")]
    Pipe,

    /// `;`
    #[token(";")]
    Semicolon,

    /// Newline
    #[token("\n")]
    Newline,

    // === Operators ===
    /// `=`
    #[token("=")]
    Assign,

    /// `+`
    #[token("+")]
    Plus,

    /// `-`
    #[token("-")]
    Minus,

    /// `*`
    #[token("*")]
    Star,

    /// `/`
    #[token("/")]
    Slash,

    /// `==`
    #[token("==")]
    EqEq,

    /// `!=`
    #[token("!=")]
    NotEq,

    /// `<`
    #[token("<")]
    Lt,

    /// `>`
    #[token(">")]
    Gt,

    /// `<=`
    #[token("<=")]
    LtEq,

    /// `>=`
    #[token(">=")]
    GtEq,

    // === Names and literals ===
    /// A method or local variable name, optionally ending in `!` or `?`.
    #[regex(r"[a-z_][A-Za-z0-9_]*[!?]?")]
    Ident,

    /// A constant name.
    #[regex(r"[A-Z][A-Za-z0-9_]*")]
    Constant,

    /// An instance variable such as `@name`.
    #[regex(r"@[a-z_][A-Za-z0-9_]*")]
    IVar,

    /// An integer literal, with optional `_` separators.
    #[regex(r"[0-9][0-9_]*")]
    Integer,

    /// A single- or double-quoted string literal.
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    /// End of file
    Eof,

    /// Invalid/unknown token
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Class => "'class'",
            TokenKind::Module => "'module'",
            TokenKind::Def => "'def'",
            TokenKind::Do => "'do'",
            TokenKind::End => "'end'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Then => "'then'",
            TokenKind::Nil => "'nil'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::SelfKw => "'self'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::ColonColon => "'::'",
            TokenKind::Pipe => "'|'",
            TokenKind::Semicolon => "';'",
            TokenKind::Newline => "newline",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::Ident => "identifier",
            TokenKind::Constant => "constant",
            TokenKind::IVar => "instance variable",
            TokenKind::Integer => "integer",
            TokenKind::String => "string",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }

    /// Returns true if this token ends a statement.
    pub fn is_separator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semicolon)
    }

    /// Returns the binding power and method name of a binary operator token.
    pub fn binary_operator(&self) -> Option<(u8, &'static str)> {
        match self {
            TokenKind::EqEq => Some((1, "==")),
            TokenKind::NotEq => Some((1, "!=")),
            TokenKind::Lt => Some((2, "<")),
            TokenKind::Gt => Some((2, ">")),
            TokenKind::LtEq => Some((2, "<=")),
            TokenKind::GtEq => Some((2, ">=")),
            TokenKind::Plus => Some((3, "+")),
            TokenKind::Minus => Some((3, "-")),
            TokenKind::Star => Some((4, "*")),
            TokenKind::Slash => Some((4, "/")),
            _ => None,
        }
    }
}

/// Returns the binding power of a binary operator method name.
pub fn operator_precedence(method: &str) -> Option<u8> {
    match method {
        "==" | "!=" => Some(1),
        "<" | ">" | "<=" | ">=" => Some(2),
        "+" | "-" => Some(3),
        "*" | "/" => Some(4),
        _ => None,
    }
}

/// A lexer for splice source code.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            finished: false,
        }
    }

    /// Returns the source string being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(result) => {
                let range = self.inner.span();
                Some(Token {
                    kind: result.unwrap_or(TokenKind::Error),
                    span: Span::from_usize(range.start, range.end),
                })
            }
            None => {
                self.finished = true;
                let end = self.source.len();
                Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::from_usize(end, end),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn test_directive_tokens() {
        assert_eq!(
            tokenize("transform!(Foo::Bar)"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Constant,
                TokenKind::ColonColon,
                TokenKind::Constant,
                TokenKind::RParen
            ]
        );
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        assert_eq!(
            tokenize("class Potato\nend"),
            vec![
                TokenKind::Class,
                TokenKind::Constant,
                TokenKind::Newline,
                TokenKind::End
            ]
        );
        assert_eq!(tokenize("ending"), vec![TokenKind::Ident]);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokenize("# café résumé\nx = 1 # trailing"),
            vec![
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Integer
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokenize("a + b == c"),
            vec![
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::EqEq,
                TokenKind::Ident
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokenize(r#""a \"b\"" 'c'"#),
            vec![TokenKind::String, TokenKind::String]
        );
        assert_eq!(tokenize("\"open").first(), Some(&TokenKind::Error));
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(
            tokenize("a +\\\n b"),
            vec![TokenKind::Ident, TokenKind::Plus, TokenKind::Ident]
        );
    }
}
