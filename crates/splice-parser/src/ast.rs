//! Syntax tree types.
//!
//! Nodes are s-expressions: a [`NodeKind`] tag plus an ordered list of
//! [`Child`] slots. They are immutable and cheap to clone; unchanged subtrees
//! are shared between a tree and its rewritten versions.

use smol_str::SmolStr;
use source_map::Location;
use std::fmt;
use std::sync::Arc;

/// The type tag of a [`SyntaxNode`].
///
/// The child layout of each kind is documented on its variant; `?` marks a
/// slot that may be [`Child::Absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeKind {
    /// A statement sequence: `[stmt...]`.
    Begin,
    /// Integer literal: `[Int]`.
    Int,
    /// String literal: `[Str]`.
    Str,
    /// `nil`: `[]`.
    Nil,
    /// `true`: `[]`.
    True,
    /// `false`: `[]`.
    False,
    /// `self`: `[]`.
    SelfRef,
    /// Method call: `[receiver?, Symbol method, arg...]`.
    Send,
    /// Constant reference: `[scope?, Symbol name]`.
    Const,
    /// The top-level scope in `::Foo`: `[]`.
    Cbase,
    /// Local variable assignment: `[Symbol name, value]`.
    Lvasgn,
    /// Instance variable assignment: `[Symbol name, value]`.
    Ivasgn,
    /// Constant assignment: `[scope?, Symbol name, value]`.
    Casgn,
    /// Instance variable read: `[Symbol name]`.
    Ivar,
    /// Array literal: `[element...]`.
    Array,
    /// Class definition: `[Const name, superclass?, body?]`.
    Class,
    /// Module definition: `[Const name, body?]`.
    Module,
    /// Method definition: `[Symbol name, Args, body?]`.
    Def,
    /// Parameter list: `[Arg...]`.
    Args,
    /// A single parameter: `[Symbol name]`.
    Arg,
    /// Call with a `do ... end` block: `[Send call, Args, body?]`.
    Block,
    /// Conditional: `[condition, then?, else?]`.
    If,
}

impl NodeKind {
    /// Returns the s-expression name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Begin => "begin",
            NodeKind::Int => "int",
            NodeKind::Str => "str",
            NodeKind::Nil => "nil",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::SelfRef => "self",
            NodeKind::Send => "send",
            NodeKind::Const => "const",
            NodeKind::Cbase => "cbase",
            NodeKind::Lvasgn => "lvasgn",
            NodeKind::Ivasgn => "ivasgn",
            NodeKind::Casgn => "casgn",
            NodeKind::Ivar => "ivar",
            NodeKind::Array => "array",
            NodeKind::Class => "class",
            NodeKind::Module => "module",
            NodeKind::Def => "def",
            NodeKind::Args => "args",
            NodeKind::Arg => "arg",
            NodeKind::Block => "block",
            NodeKind::If => "if",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One slot of a node.
#[derive(Debug, Clone)]
pub enum Child {
    /// A nested node.
    Node(SyntaxNode),
    /// A name: method, variable, or constant.
    Symbol(SmolStr),
    /// An integer value.
    Int(i64),
    /// A decoded string value.
    Str(String),
    /// An empty optional slot.
    Absent,
}

impl Child {
    /// Creates a symbol child.
    pub fn sym(name: impl Into<SmolStr>) -> Self {
        Child::Symbol(name.into())
    }

    /// Returns the node in this slot, if any.
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the symbol in this slot, if any.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Child::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl From<SyntaxNode> for Child {
    fn from(node: SyntaxNode) -> Self {
        Child::Node(node)
    }
}

impl From<Option<SyntaxNode>> for Child {
    fn from(node: Option<SyntaxNode>) -> Self {
        node.map_or(Child::Absent, Child::Node)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Int(value)
    }
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    children: Vec<Child>,
    location: Option<Location>,
    /// The text `location` points into.
    source: Option<Arc<str>>,
    /// Set only on nodes produced by the parser and never updated since.
    verbatim: bool,
}

/// An immutable syntax tree node.
///
/// A node with a [`Location`] can be traced back to the input it was parsed
/// from; a node without one is *synthesized*. Cloning is cheap and shares the
/// whole subtree.
#[derive(Clone)]
pub struct SyntaxNode(Arc<NodeData>);

impl SyntaxNode {
    /// Creates a synthesized node.
    pub fn new(kind: NodeKind, children: impl IntoIterator<Item = Child>) -> Self {
        Self(Arc::new(NodeData {
            kind,
            children: children.into_iter().collect(),
            location: None,
            source: None,
            verbatim: false,
        }))
    }

    pub(crate) fn parsed(
        kind: NodeKind,
        children: Vec<Child>,
        location: Location,
        source: &Arc<str>,
    ) -> Self {
        Self(Arc::new(NodeData {
            kind,
            children,
            location: Some(location),
            source: Some(Arc::clone(source)),
            verbatim: true,
        }))
    }

    /// Returns the kind of this node.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    /// Returns all child slots.
    #[inline]
    pub fn children(&self) -> &[Child] {
        &self.0.children
    }

    /// Returns the child slot at `index`.
    pub fn child(&self, index: usize) -> Option<&Child> {
        self.0.children.get(index)
    }

    /// Returns the node in slot `index`, if that slot holds a node.
    pub fn node_at(&self, index: usize) -> Option<&SyntaxNode> {
        self.child(index).and_then(Child::as_node)
    }

    /// Returns the symbol in slot `index`, if that slot holds a symbol.
    pub fn symbol_at(&self, index: usize) -> Option<&str> {
        self.child(index).and_then(Child::as_symbol)
    }

    /// Iterates over the nodes among the children, skipping scalar slots.
    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.0.children.iter().filter_map(Child::as_node)
    }

    /// Returns where this node came from, or `None` if it was synthesized.
    #[inline]
    pub fn location(&self) -> Option<Location> {
        self.0.location
    }

    /// Returns true if this node has no provenance.
    #[inline]
    pub fn is_synthesized(&self) -> bool {
        self.0.location.is_none()
    }

    /// Returns true if this node is exactly as parsed, so it can be rendered
    /// by copying its original text.
    #[inline]
    pub fn is_verbatim(&self) -> bool {
        self.0.verbatim
    }

    /// Returns true if this node is a statement sequence.
    #[inline]
    pub fn is_sequence(&self) -> bool {
        self.0.kind == NodeKind::Begin
    }

    /// Returns the location of this node if it points into `source`.
    pub fn location_in(&self, source: &Arc<str>) -> Option<Location> {
        let own = self.0.source.as_ref()?;
        if Arc::ptr_eq(own, source) {
            self.0.location
        } else {
            None
        }
    }

    /// Returns a copy with a new kind and children that keeps this node's location.
    ///
    /// The copy no longer renders verbatim.
    pub fn updated(&self, kind: NodeKind, children: impl IntoIterator<Item = Child>) -> Self {
        Self(Arc::new(NodeData {
            kind,
            children: children.into_iter().collect(),
            location: self.0.location,
            source: self.0.source.clone(),
            verbatim: false,
        }))
    }

    /// Returns a copy with new children that keeps this node's kind and location.
    pub fn with_children(&self, children: impl IntoIterator<Item = Child>) -> Self {
        self.updated(self.kind(), children)
    }

    /// Returns a synthesized copy of this node (same kind and children, no location).
    pub fn without_location(&self) -> Self {
        Self::new(self.kind(), self.0.children.iter().cloned())
    }

    /// Returns true if both handles point at the same node.
    #[inline]
    pub fn ptr_eq(a: &SyntaxNode, b: &SyntaxNode) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Renders this node as an s-expression, e.g. `(send nil :foo (int 1))`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(self, &mut out);
        out
    }
}

fn write_sexp(node: &SyntaxNode, out: &mut String) {
    out.push('(');
    out.push_str(node.kind().name());
    for child in node.children() {
        out.push(' ');
        match child {
            Child::Node(inner) => write_sexp(inner, out),
            Child::Symbol(name) => {
                out.push(':');
                out.push_str(name);
            }
            Child::Int(value) => out.push_str(&value.to_string()),
            Child::Str(value) => out.push_str(&format!("{value:?}")),
            Child::Absent => out.push_str("nil"),
        }
    }
    out.push(')');
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sexp())?;
        if let Some(location) = self.location() {
            write!(f, "@{location}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sexp())
    }
}

/// Shorthand constructors for synthesized nodes.
pub mod build {
    use super::{Child, NodeKind, SyntaxNode};

    /// Creates a synthesized node, in the style of `s(:send, nil, :foo)`.
    pub fn s(kind: NodeKind, children: impl IntoIterator<Item = Child>) -> SyntaxNode {
        SyntaxNode::new(kind, children)
    }

    /// `receiver.method(args...)`, or `method(args...)` without a receiver.
    pub fn send(
        receiver: Option<SyntaxNode>,
        method: &str,
        args: impl IntoIterator<Item = SyntaxNode>,
    ) -> SyntaxNode {
        let mut children = vec![Child::from(receiver), Child::sym(method)];
        children.extend(args.into_iter().map(Child::Node));
        SyntaxNode::new(NodeKind::Send, children)
    }

    /// An integer literal.
    pub fn int(value: i64) -> SyntaxNode {
        SyntaxNode::new(NodeKind::Int, [Child::Int(value)])
    }

    /// A string literal.
    pub fn str(value: &str) -> SyntaxNode {
        SyntaxNode::new(NodeKind::Str, [Child::Str(value.to_string())])
    }

    /// A constant path such as `Foo::Bar`; a leading `::` anchors it at the top level.
    pub fn const_path(path: &str) -> SyntaxNode {
        let (mut scope, rest) = match path.strip_prefix("::") {
            Some(rest) => (Some(SyntaxNode::new(NodeKind::Cbase, [])), rest),
            None => (None, path),
        };
        for segment in rest.split("::") {
            scope = Some(SyntaxNode::new(
                NodeKind::Const,
                [Child::from(scope), Child::sym(segment)],
            ));
        }
        scope.unwrap_or_else(|| SyntaxNode::new(NodeKind::Cbase, []))
    }

    /// A statement sequence.
    pub fn begin(statements: impl IntoIterator<Item = SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new(NodeKind::Begin, statements.into_iter().map(Child::Node))
    }
}

#[cfg(test)]
mod tests {
    use super::build::*;
    use super::*;

    #[test]
    fn test_sexp_format() {
        let node = send(Some(int(1)), "+", [str("a")]);
        assert_eq!(node.to_sexp(), r#"(send (int 1) :+ (str "a"))"#);
    }

    #[test]
    fn test_const_path() {
        assert_eq!(
            const_path("Foo::Bar").to_sexp(),
            "(const (const nil :Foo) :Bar)"
        );
        assert_eq!(
            const_path("::Foo").to_sexp(),
            "(const (cbase) :Foo)"
        );
    }

    #[test]
    fn test_synthesized_nodes_have_no_location() {
        let node = begin([send(None, "foo", [])]);
        assert!(node.is_synthesized());
        assert!(!node.is_verbatim());
        assert!(node.is_sequence());
        assert_eq!(node.node_at(0).and_then(|n| n.symbol_at(1)), Some("foo"));
    }

    #[test]
    fn test_updated_clears_verbatim_only() {
        let node = send(None, "foo", []);
        let copy = node.updated(NodeKind::Send, [Child::Absent, Child::sym("bar")]);
        assert!(!SyntaxNode::ptr_eq(&node, &copy));
        assert_eq!(copy.to_sexp(), "(send nil :bar)");
    }
}
