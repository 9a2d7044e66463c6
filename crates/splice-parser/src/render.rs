//! Rendering syntax trees back to source text.
//!
//! A node that is still exactly as parsed is copied from the original source,
//! so untouched code keeps its formatting byte for byte. Everything else is
//! printed canonically: two-space indentation, `end`-terminated bodies, and
//! only the parentheses operator precedence requires.

use crate::ast::{Child, NodeKind, SyntaxNode};
use crate::lexer::{operator_precedence, Lexer, TokenKind};
use crate::SyntaxTree;
use source_map::{LineMap, LineMapBuilder, Span};
use std::sync::Arc;

/// Rendered text together with its provenance.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The output text.
    pub text: String,
    /// Maps each output line to the input line it derives from.
    pub line_map: LineMap,
}

/// Renders a tree to text, recording which input line each output line came from.
///
/// When the root is unchanged the whole source is reproduced exactly.
/// Otherwise comment lines before the first statement and the final newline
/// of the source are kept around the re-rendered program.
pub fn render(tree: &SyntaxTree) -> Rendered {
    let mut renderer = Renderer::new(tree.shared_source());
    renderer.render_program(tree);
    let (text, line_map) = renderer.builder.finish();
    Rendered { text, line_map }
}

/// Renders a single node; verbatim copies are taken from `tree`'s source.
pub fn render_node(tree: &SyntaxTree, node: &SyntaxNode) -> Rendered {
    let mut renderer = Renderer::new(tree.shared_source());
    renderer.render_node(node, 0);
    let (text, line_map) = renderer.builder.finish();
    Rendered { text, line_map }
}

struct Renderer<'a> {
    source: &'a Arc<str>,
    builder: LineMapBuilder,
}

impl<'a> Renderer<'a> {
    fn new(source: &'a Arc<str>) -> Self {
        Self {
            source,
            builder: LineMapBuilder::new(),
        }
    }

    fn render_program(&mut self, tree: &SyntaxTree) {
        let source: &'a str = self.source;
        let root = tree.root();
        let program = tree.program_span();

        let untouched = root.is_verbatim()
            && root.location_in(self.source).map(|location| location.span) == Some(program);
        if untouched {
            self.builder.push_verbatim(0, source);
            return;
        }

        let leading = Span::new(0u32, program.start)
            .text(source)
            .and_then(|text| text.rfind('\n').map(|newline| &text[..=newline]))
            .unwrap_or_default();
        if !leading.is_empty() {
            self.builder.push_verbatim(0, leading);
        }

        self.render_node(root, 0);

        if source.ends_with('\n') && !self.builder.at_line_start() {
            self.builder.push_str("\n");
        }
    }

    fn render_node(&mut self, node: &SyntaxNode, indent: usize) {
        let source: &'a str = self.source;
        let location = node.location_in(self.source);

        if node.is_verbatim() {
            if let Some((location, text)) =
                location.and_then(|location| Some((location, location.span.text(source)?)))
            {
                let column = self.builder.current_column();
                let text = reindent(text, location.start.col as usize, column);
                self.builder.push_verbatim(location.start.line, &text);
                return;
            }
        }

        let segment = location.map(|location| self.builder.enter(location.start.line));
        self.render_canonical(node, indent);
        if let Some(segment) = segment {
            self.builder.exit(segment);
        }
    }

    fn render_canonical(&mut self, node: &SyntaxNode, indent: usize) {
        match node.kind() {
            NodeKind::Begin => self.render_sequence(node, indent),
            NodeKind::Int | NodeKind::Str | NodeKind::Ivar | NodeKind::Arg => {
                self.render_children(node, 0, ", ", indent)
            }
            NodeKind::Nil => self.push("nil"),
            NodeKind::True => self.push("true"),
            NodeKind::False => self.push("false"),
            NodeKind::SelfRef => self.push("self"),
            NodeKind::Cbase => {}
            NodeKind::Send => self.render_send(node, indent),
            NodeKind::Const => {
                self.render_scope(node.child(0), indent);
                self.render_slot(node.child(1), indent);
            }
            NodeKind::Lvasgn | NodeKind::Ivasgn => {
                self.render_slot(node.child(0), indent);
                self.push(" = ");
                self.render_slot(node.child(1), indent);
            }
            NodeKind::Casgn => {
                self.render_scope(node.child(0), indent);
                self.render_slot(node.child(1), indent);
                self.push(" = ");
                self.render_slot(node.child(2), indent);
            }
            NodeKind::Array => {
                self.push("[");
                self.render_children(node, 0, ", ", indent);
                self.push("]");
            }
            NodeKind::Args => self.render_children(node, 0, ", ", indent),
            NodeKind::Class => {
                self.push("class ");
                self.render_slot(node.child(0), indent);
                if let Some(superclass) = node.node_at(1) {
                    self.push(" < ");
                    self.render_node(superclass, indent);
                }
                self.render_body(node.node_at(2), indent);
            }
            NodeKind::Module => {
                self.push("module ");
                self.render_slot(node.child(0), indent);
                self.render_body(node.node_at(1), indent);
            }
            NodeKind::Def => {
                self.push("def ");
                self.render_slot(node.child(0), indent);
                if let Some(params) = node.node_at(1).filter(|params| has_children(params)) {
                    self.push("(");
                    self.render_node(params, indent);
                    self.push(")");
                }
                self.render_body(node.node_at(2), indent);
            }
            NodeKind::Block => {
                self.render_slot(node.child(0), indent);
                self.push(" do");
                if let Some(params) = node.node_at(1).filter(|params| has_children(params)) {
                    self.push(" |");
                    self.render_node(params, indent);
                    self.push("|");
                }
                self.render_body(node.node_at(2), indent);
            }
            NodeKind::If => {
                self.push("if ");
                self.render_slot(node.child(0), indent);
                if let Some(then_body) = node.node_at(1).filter(|body| !is_empty_sequence(body)) {
                    self.newline(indent + 2);
                    self.render_node(then_body, indent + 2);
                }
                if let Some(else_body) = node.node_at(2).filter(|body| !is_empty_sequence(body)) {
                    self.newline(indent);
                    self.push("else");
                    self.newline(indent + 2);
                    self.render_node(else_body, indent + 2);
                }
                self.newline(indent);
                self.push("end");
            }
        }
    }

    fn render_sequence(&mut self, node: &SyntaxNode, indent: usize) {
        let mut previous: Option<&SyntaxNode> = None;
        for child in node.child_nodes() {
            if let Some(previous) = previous {
                self.render_separator(previous, child, indent);
            }
            self.render_node(child, indent);
            previous = Some(child);
        }
    }

    /// Separates two statements, keeping the blank and comment lines that
    /// stood between them when both still come from this source in this order.
    fn render_separator(&mut self, previous: &SyntaxNode, next: &SyntaxNode, indent: usize) {
        let source: &'a str = self.source;
        let gap = match (previous.location_in(self.source), next.location_in(self.source)) {
            (Some(before), Some(after)) if before.span.end <= after.span.start => {
                Span::new(before.span.end, after.span.start)
                    .text(source)
                    .map(|gap| (before.end.line, gap))
            }
            _ => None,
        };

        if let Some((gap_line, gap)) = gap.filter(|(_, gap)| is_trivia(gap)) {
            let lines: Vec<&str> = gap.split('\n').collect();
            if lines.len() >= 2 {
                self.push("\n");
                let middle = lines.iter().enumerate().skip(1).take(lines.len() - 2);
                for (offset, line) in middle {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        self.push_indent(indent);
                    }
                    self.builder.push_verbatim(gap_line + offset as u32, trimmed);
                    self.push("\n");
                }
                self.push_indent(indent);
                return;
            }
        }

        self.newline(indent);
    }

    fn render_send(&mut self, node: &SyntaxNode, indent: usize) {
        let receiver = node.node_at(0);
        let method = node.symbol_at(1).unwrap_or_default();
        let args = node.children().get(2..).unwrap_or_default();

        if let (Some(receiver), Some(precedence), [Child::Node(operand)]) =
            (receiver, operator_precedence(method), args)
        {
            self.render_operand(receiver, precedence, false, indent);
            self.push(" ");
            self.push(method);
            self.push(" ");
            self.render_operand(operand, precedence, true, indent);
            return;
        }

        if let Some(receiver) = receiver {
            self.render_operand(receiver, u8::MAX, false, indent);
            self.push(".");
        }
        self.push(method);
        if !args.is_empty() {
            self.push("(");
            self.render_children(node, 2, ", ", indent);
            self.push(")");
        }
    }

    /// Renders `node` as an operand of an operator binding at `precedence`,
    /// parenthesised if it binds more loosely.
    fn render_operand(&mut self, node: &SyntaxNode, precedence: u8, right: bool, indent: usize) {
        let wrap = binding_power(node).is_some_and(|own| {
            if right {
                own <= precedence
            } else {
                own < precedence
            }
        });
        if wrap {
            self.push("(");
        }
        self.render_node(node, indent);
        if wrap {
            self.push(")");
        }
    }

    fn render_scope(&mut self, scope: Option<&Child>, indent: usize) {
        match scope {
            Some(Child::Node(scope)) if scope.kind() == NodeKind::Cbase => self.push("::"),
            Some(Child::Node(scope)) => {
                self.render_node(scope, indent);
                self.push("::");
            }
            _ => {}
        }
    }

    /// Renders an `end`-terminated body on its own indented lines.
    fn render_body(&mut self, body: Option<&SyntaxNode>, indent: usize) {
        if let Some(body) = body.filter(|body| !is_empty_sequence(body)) {
            self.newline(indent + 2);
            self.render_node(body, indent + 2);
        }
        self.newline(indent);
        self.push("end");
    }

    fn render_children(&mut self, node: &SyntaxNode, skip: usize, separator: &str, indent: usize) {
        for (index, child) in node.children().iter().skip(skip).enumerate() {
            if index > 0 {
                self.push(separator);
            }
            self.render_slot(Some(child), indent);
        }
    }

    fn render_slot(&mut self, child: Option<&Child>, indent: usize) {
        match child {
            Some(Child::Node(node)) => self.render_node(node, indent),
            Some(Child::Symbol(name)) => self.push(name),
            Some(Child::Int(value)) => self.push(&value.to_string()),
            Some(Child::Str(value)) => self.push(&quote(value)),
            Some(Child::Absent) | None => self.push("nil"),
        }
    }

    fn push(&mut self, text: &str) {
        self.builder.push_str(text);
    }

    fn push_indent(&mut self, indent: usize) {
        self.builder.push_str(&" ".repeat(indent));
    }

    fn newline(&mut self, indent: usize) {
        self.push("\n");
        self.push_indent(indent);
    }
}

/// Binding power of a node used as an operand; `None` never needs parentheses.
fn binding_power(node: &SyntaxNode) -> Option<u8> {
    match node.kind() {
        NodeKind::Send => {
            let method = node.symbol_at(1)?;
            let is_binary = node.node_at(0).is_some() && node.children().len() == 3;
            if is_binary {
                operator_precedence(method)
            } else {
                None
            }
        }
        NodeKind::Lvasgn | NodeKind::Ivasgn | NodeKind::Casgn => Some(0),
        _ => None,
    }
}

fn has_children(node: &SyntaxNode) -> bool {
    !node.children().is_empty()
}

fn is_empty_sequence(node: &SyntaxNode) -> bool {
    node.is_sequence() && node.children().is_empty()
}

/// True if `gap` holds only whitespace, semicolons, and comments.
fn is_trivia(gap: &str) -> bool {
    gap.split('\n').all(|line| {
        let line = line.trim_matches(|c: char| c.is_whitespace() || c == ';');
        line.is_empty() || line.starts_with('#')
    })
}

/// Shifts every line after the first from column `from` to column `to`.
///
/// Only leading spaces and tabs are ever removed, never code. Lines that
/// begin inside a string literal belong to the literal and are left alone.
fn reindent(text: &str, from: usize, to: usize) -> String {
    if from == to || !text.contains('\n') {
        return text.to_string();
    }

    let literals = multiline_literals(text);
    let mut out = String::with_capacity(text.len());
    let mut offset = 0;
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
            let in_literal = literals.iter().any(|span| span.start < offset && offset < span.end);
            if in_literal {
                out.push_str(line);
            } else if to > from {
                if !line.is_empty() {
                    out.push_str(&" ".repeat(to - from));
                }
                out.push_str(line);
            } else {
                let removable = line
                    .bytes()
                    .take_while(|byte| matches!(byte, b' ' | b'\t'))
                    .count();
                out.push_str(&line[removable.min(from - to)..]);
            }
        } else {
            out.push_str(line);
        }
        offset += line.len() + 1;
    }
    out
}

/// Byte ranges of the string literals in `text` that span several lines.
fn multiline_literals(text: &str) -> Vec<std::ops::Range<usize>> {
    Lexer::new(text)
        .filter(|token| token.kind == TokenKind::String)
        .map(|token| usize::from(token.span.start)..usize::from(token.span.end))
        .filter(|range| text[range.clone()].contains('\n'))
        .collect()
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
