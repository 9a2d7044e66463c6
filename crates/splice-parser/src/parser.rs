//! Recursive descent parser.

use crate::ast::{Child, NodeKind, SyntaxNode};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::SyntaxTree;
use source_map::{LineIndex, Location, Span};
use std::sync::Arc;
use text_size::TextSize;

type ParseResult<T> = Result<T, ParseError>;

/// The parser.
pub struct Parser<'src> {
    /// The source being parsed.
    source: &'src str,
    /// Shared copy of the source that parsed nodes point into.
    shared: Arc<str>,
    line_index: LineIndex,
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// End of the last consumed token.
    prev_end: TextSize,
    /// EOF token for when we're past the end
    eof_token: Token,
}

impl<'src> Parser<'src> {
    /// Creates a new parser.
    pub fn new(source: &'src str) -> Self {
        let tokens: Vec<Token> = Lexer::new(source).collect();
        let eof_token = Token {
            kind: TokenKind::Eof,
            span: Span::from_usize(source.len(), source.len()),
        };
        Self {
            source,
            shared: Arc::from(source),
            line_index: LineIndex::new(source),
            tokens,
            pos: 0,
            prev_end: TextSize::from(0),
            eof_token,
        }
    }

    /// Parses the whole source.
    ///
    /// A program with a single statement has that statement as its root; any
    /// other program is rooted at a `begin` sequence.
    pub fn parse(mut self) -> ParseResult<SyntaxTree> {
        let statements = self.parse_statements(&[])?;
        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected("end of file"));
        }

        let program = match (statements.first(), statements.last()) {
            (Some(first), Some(last)) => match (first.location(), last.location()) {
                (Some(first), Some(last)) => first.span.cover(last.span),
                _ => Span::from_usize(0, self.source.len()),
            },
            _ => Span::from_usize(0, self.source.len()),
        };

        let root = if statements.len() == 1 {
            statements.into_iter().next().unwrap_or_else(|| {
                SyntaxNode::parsed(NodeKind::Begin, Vec::new(), self.location(program), &self.shared)
            })
        } else {
            let children = statements.into_iter().map(Child::Node).collect();
            SyntaxNode::parsed(NodeKind::Begin, children, self.location(program), &self.shared)
        };

        Ok(SyntaxTree::new(self.shared, root, program))
    }

    // === Token helpers ===

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof_token)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    fn current_text(&self) -> &'src str {
        self.current().span.text(self.source).unwrap_or("")
    }

    /// Returns true if the current token starts right where the previous one ended.
    fn current_is_adjacent(&self) -> bool {
        self.pos > 0 && self.current().span.start == self.prev_end
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.prev_end = self.current().span.end;
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            let token = self.current().clone();
            self.advance();
            Ok(token)
        } else {
            Err(self.unexpected(kind.name()))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while self.current_kind().is_separator() {
            self.advance();
        }
    }

    // === Errors and nodes ===

    fn error_at(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        let position = self.line_index.line_col(span.start).unwrap_or_default();
        ParseError::new(kind, span, position)
    }

    /// Builds the error for finding something other than `expected`.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        let kind = match token.kind {
            TokenKind::Eof => ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            },
            TokenKind::Error => {
                let text = self.current_text();
                if text.starts_with('"') || text.starts_with('\'') {
                    ParseErrorKind::UnterminatedString
                } else {
                    ParseErrorKind::InvalidToken {
                        text: text.to_string(),
                    }
                }
            }
            found => ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: found.name().to_string(),
            },
        };
        self.error_at(kind, token.span)
    }

    fn location(&self, span: Span) -> Location {
        self.line_index.location(span).unwrap_or_default()
    }

    /// Creates a node spanning from `start` to the end of the last consumed token.
    fn node(&self, kind: NodeKind, children: Vec<Child>, start: TextSize) -> SyntaxNode {
        let location = self.location(Span::new(start, self.prev_end));
        SyntaxNode::parsed(kind, children, location, &self.shared)
    }

    /// Turns a parsed statement list into a body slot: absent, the single
    /// statement, or a `begin` sequence.
    fn body(&self, statements: Vec<SyntaxNode>) -> Child {
        if statements.len() <= 1 {
            return statements.into_iter().next().into();
        }
        let span = statements
            .iter()
            .filter_map(SyntaxNode::location)
            .map(|location| location.span)
            .reduce(Span::cover)
            .unwrap_or_default();
        let children = statements.into_iter().map(Child::Node).collect();
        Child::Node(SyntaxNode::parsed(
            NodeKind::Begin,
            children,
            self.location(span),
            &self.shared,
        ))
    }

    // === Statements ===

    /// Parses statements until end of file or one of `terminators`, which is
    /// left unconsumed.
    fn parse_statements(&mut self, terminators: &[TokenKind]) -> ParseResult<Vec<SyntaxNode>> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            let kind = self.current_kind();
            if kind == TokenKind::Eof || terminators.contains(&kind) {
                break;
            }

            statements.push(self.parse_expression()?);

            let next = self.current_kind();
            if !(next.is_separator() || next == TokenKind::Eof || terminators.contains(&next)) {
                return Err(self.unexpected("newline"));
            }
        }
        Ok(statements)
    }

    // === Expressions ===

    fn parse_expression(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.current().span.start;
        let target = self.parse_binary(0)?;
        if !self.check(TokenKind::Assign) {
            return Ok(target);
        }

        let slot = |index: usize| target.child(index).cloned().unwrap_or(Child::Absent);
        let (kind, mut children) = match target.kind() {
            NodeKind::Send if target.children().len() == 2 && target.node_at(0).is_none() => {
                (NodeKind::Lvasgn, vec![slot(1)])
            }
            NodeKind::Ivar => (NodeKind::Ivasgn, vec![slot(0)]),
            NodeKind::Const => (NodeKind::Casgn, vec![slot(0), slot(1)]),
            other => {
                return Err(self.error_at(
                    ParseErrorKind::InvalidAssignment {
                        target: other.name().to_string(),
                    },
                    self.current().span,
                ))
            }
        };

        self.advance();
        self.skip_newlines();
        children.push(Child::Node(self.parse_expression()?));
        Ok(self.node(kind, children, start))
    }

    /// Precedence climbing over the binary operators.
    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<SyntaxNode> {
        let start = self.current().span.start;
        let mut lhs = self.parse_postfix()?;

        while let Some((precedence, operator)) = self.current_kind().binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = self.node(
                NodeKind::Send,
                vec![Child::Node(lhs), Child::sym(operator), Child::Node(rhs)],
                start,
            );
        }

        Ok(lhs)
    }

    fn parse_postfix(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.current().span.start;
        let mut node = self.parse_primary()?;

        while self.eat(TokenKind::Dot) {
            self.skip_newlines();
            if !matches!(self.current_kind(), TokenKind::Ident | TokenKind::Constant) {
                return Err(self.unexpected("method name"));
            }
            let method = self.current_text();
            self.advance();

            let mut children = vec![Child::Node(node), Child::sym(method)];
            children.extend(self.parse_call_arguments()?);
            let call = self.node(NodeKind::Send, children, start);
            node = self.parse_block(call, start)?;
        }

        Ok(node)
    }

    fn parse_primary(&mut self) -> ParseResult<SyntaxNode> {
        let start = self.current().span.start;
        match self.current_kind() {
            TokenKind::Integer => self.parse_integer(start),
            TokenKind::Minus if self.peek_kind(1) == TokenKind::Integer => {
                self.advance();
                if !self.current_is_adjacent() {
                    return Err(self.unexpected("integer"));
                }
                self.parse_integer(start)
            }
            TokenKind::String => {
                let value = unescape(self.current_text());
                self.advance();
                Ok(self.node(NodeKind::Str, vec![Child::Str(value)], start))
            }
            TokenKind::Nil => self.parse_keyword_literal(NodeKind::Nil, start),
            TokenKind::True => self.parse_keyword_literal(NodeKind::True, start),
            TokenKind::False => self.parse_keyword_literal(NodeKind::False, start),
            TokenKind::SelfKw => self.parse_keyword_literal(NodeKind::SelfRef, start),
            TokenKind::IVar => {
                let name = self.current_text();
                self.advance();
                Ok(self.node(NodeKind::Ivar, vec![Child::sym(name)], start))
            }
            TokenKind::Ident => {
                let name = self.current_text();
                self.advance();
                let mut children = vec![Child::Absent, Child::sym(name)];
                children.extend(self.parse_call_arguments()?);
                let call = self.node(NodeKind::Send, children, start);
                self.parse_block(call, start)
            }
            TokenKind::Constant | TokenKind::ColonColon => self.parse_constant(start),
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expression()?;
                self.skip_newlines();
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array(start),
            TokenKind::Class => self.parse_class(start),
            TokenKind::Module => self.parse_module(start),
            TokenKind::Def => self.parse_def(start),
            TokenKind::If => self.parse_if(start),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_keyword_literal(&mut self, kind: NodeKind, start: TextSize) -> ParseResult<SyntaxNode> {
        self.advance();
        Ok(self.node(kind, Vec::new(), start))
    }

    /// Parses an integer literal; `start` may point at a leading `-`.
    fn parse_integer(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        let span = Span::new(start, self.current().span.end);
        let text = span.text(self.source).unwrap_or("");
        let value = text.replace('_', "").parse::<i64>().map_err(|_| {
            self.error_at(
                ParseErrorKind::IntegerOverflow {
                    text: text.to_string(),
                },
                span,
            )
        })?;
        self.advance();
        Ok(self.node(NodeKind::Int, vec![Child::Int(value)], start))
    }

    /// Parses `(arg, ...)` when the parenthesis directly follows the method name.
    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Child>> {
        if !(self.check(TokenKind::LParen) && self.current_is_adjacent()) {
            return Ok(Vec::new());
        }
        self.advance();
        self.skip_newlines();

        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(Child::Node(self.parse_expression()?));
            self.skip_newlines();
            if self.eat(TokenKind::Comma) {
                self.skip_newlines();
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    /// Wraps `call` in a block node if a `do ... end` block follows it.
    fn parse_block(&mut self, call: SyntaxNode, start: TextSize) -> ParseResult<SyntaxNode> {
        if !self.eat(TokenKind::Do) {
            return Ok(call);
        }

        let params = if self.check(TokenKind::Pipe) {
            let params_start = self.current().span.start;
            self.advance();
            let names = self.parse_parameter_names(TokenKind::Pipe)?;
            self.node(NodeKind::Args, names, params_start)
        } else {
            SyntaxNode::new(NodeKind::Args, [])
        };

        let statements = self.parse_statements(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        let body = self.body(statements);
        Ok(self.node(
            NodeKind::Block,
            vec![Child::Node(call), Child::Node(params), body],
            start,
        ))
    }

    /// Parses `name, name...` up to and including `close`, as `arg` nodes.
    fn parse_parameter_names(&mut self, close: TokenKind) -> ParseResult<Vec<Child>> {
        let mut params = Vec::new();
        if self.eat(close) {
            return Ok(params);
        }
        loop {
            let start = self.current().span.start;
            let name = self.current_text();
            self.expect(TokenKind::Ident)?;
            params.push(Child::Node(self.node(
                NodeKind::Arg,
                vec![Child::sym(name)],
                start,
            )));
            if !self.eat(TokenKind::Comma) {
                self.expect(close)?;
                return Ok(params);
            }
        }
    }

    /// Parses `Foo`, `Foo::Bar`, `::Foo`, or a constant-named call like `Integer(x)`.
    fn parse_constant(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        let path = self.parse_constant_path(start)?;

        if self.check(TokenKind::LParen) && self.current_is_adjacent() && path.node_at(0).is_none()
        {
            let name = path.symbol_at(1).unwrap_or_default().to_string();
            let mut children = vec![Child::Absent, Child::sym(name)];
            children.extend(self.parse_call_arguments()?);
            return Ok(self.node(NodeKind::Send, children, start));
        }

        Ok(path)
    }

    fn parse_constant_path(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        let mut scope = Child::Absent;
        if self.eat(TokenKind::ColonColon) {
            scope = Child::Node(self.node(NodeKind::Cbase, Vec::new(), start));
        }

        let name = self.current_text();
        self.expect(TokenKind::Constant)?;
        let mut path = self.node(NodeKind::Const, vec![scope, Child::sym(name)], start);

        while self.check(TokenKind::ColonColon) && self.peek_kind(1) == TokenKind::Constant {
            self.advance();
            let name = self.current_text();
            self.advance();
            path = self.node(
                NodeKind::Const,
                vec![Child::Node(path), Child::sym(name)],
                start,
            );
        }

        Ok(path)
    }

    fn parse_array(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        self.advance();
        self.skip_newlines();

        let mut elements = Vec::new();
        if !self.eat(TokenKind::RBracket) {
            loop {
                elements.push(Child::Node(self.parse_expression()?));
                self.skip_newlines();
                if self.eat(TokenKind::Comma) {
                    self.skip_newlines();
                    continue;
                }
                self.expect(TokenKind::RBracket)?;
                break;
            }
        }

        Ok(self.node(NodeKind::Array, elements, start))
    }

    fn parse_class(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        self.advance();
        let name_start = self.current().span.start;
        let name = self.parse_constant_path(name_start)?;
        let superclass = if self.eat(TokenKind::Lt) {
            Child::Node(self.parse_expression()?)
        } else {
            Child::Absent
        };

        let statements = self.parse_statements(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        let body = self.body(statements);
        Ok(self.node(
            NodeKind::Class,
            vec![Child::Node(name), superclass, body],
            start,
        ))
    }

    fn parse_module(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        self.advance();
        let name_start = self.current().span.start;
        let name = self.parse_constant_path(name_start)?;

        let statements = self.parse_statements(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        let body = self.body(statements);
        Ok(self.node(NodeKind::Module, vec![Child::Node(name), body], start))
    }

    fn parse_def(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        self.advance();
        if !matches!(self.current_kind(), TokenKind::Ident | TokenKind::Constant) {
            return Err(self.unexpected("method name"));
        }
        let name = self.current_text();
        self.advance();

        let params = if self.check(TokenKind::LParen) && self.current_is_adjacent() {
            let params_start = self.current().span.start;
            self.advance();
            let names = self.parse_parameter_names(TokenKind::RParen)?;
            self.node(NodeKind::Args, names, params_start)
        } else {
            SyntaxNode::new(NodeKind::Args, [])
        };

        let statements = self.parse_statements(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        let body = self.body(statements);
        Ok(self.node(
            NodeKind::Def,
            vec![Child::sym(name), Child::Node(params), body],
            start,
        ))
    }

    fn parse_if(&mut self, start: TextSize) -> ParseResult<SyntaxNode> {
        self.advance();
        let condition = self.parse_expression()?;
        self.eat(TokenKind::Then);

        let then_statements = self.parse_statements(&[TokenKind::Else, TokenKind::End])?;
        let then_body = self.body(then_statements);
        let else_body = if self.eat(TokenKind::Else) {
            let statements = self.parse_statements(&[TokenKind::End])?;
            self.body(statements)
        } else {
            Child::Absent
        };
        self.expect(TokenKind::End)?;

        Ok(self.node(
            NodeKind::If,
            vec![Child::Node(condition), then_body, else_body],
            start,
        ))
    }
}

/// Decodes a quoted string literal, including its quotes.
fn unescape(literal: &str) -> String {
    let double = literal.starts_with('"');
    let inner = literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default();

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') if double => out.push('\n'),
            Some('t') if double => out.push('\t'),
            Some('"') if double => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
