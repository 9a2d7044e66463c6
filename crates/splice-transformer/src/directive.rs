//! Directive recognition.
//!
//! A directive is a statement of the form `transform!(Name::Path)` sitting in
//! a statement sequence. It annotates the statement right after it, which is
//! its target.

use smol_str::SmolStr;
use splice_parser::{Child, NodeKind, SyntaxNode};

/// The method name that marks a directive.
pub const MARKER: &str = "transform!";

/// A directive found in a statement sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch {
    /// Position of the directive statement.
    pub directive_index: usize,
    /// Position of the annotated statement; always `directive_index + 1`.
    pub target_index: usize,
    /// The transformation name as written, e.g. `Foo::Bar` or `::Foo`.
    pub name: SmolStr,
}

/// Returns the transformation name if `node` is a directive.
///
/// Only a receiver-less `transform!` call with exactly one argument that is a
/// bare constant path counts. `transform!`, `transform!(a, b)` and
/// `x.transform!(Foo)` are ordinary statements.
pub fn directive_name(node: &SyntaxNode) -> Option<SmolStr> {
    if node.kind() != NodeKind::Send || node.children().len() != 3 {
        return None;
    }
    if !matches!(node.child(0), Some(Child::Absent)) || node.symbol_at(1) != Some(MARKER) {
        return None;
    }
    let mut name = String::new();
    write_constant_path(node.node_at(2)?, &mut name)?;
    Some(SmolStr::from(name))
}

fn write_constant_path(node: &SyntaxNode, out: &mut String) -> Option<()> {
    match node.kind() {
        NodeKind::Cbase => {
            out.push_str("::");
            Some(())
        }
        NodeKind::Const => {
            match node.child(0)? {
                Child::Absent => {}
                Child::Node(scope) if scope.kind() == NodeKind::Cbase => out.push_str("::"),
                Child::Node(scope) => {
                    write_constant_path(scope, out)?;
                    out.push_str("::");
                }
                _ => return None,
            }
            out.push_str(node.symbol_at(1)?);
            Some(())
        }
        _ => None,
    }
}

/// Finds the directives among a sequence's statements.
///
/// Matching is positional and non-overlapping: a directive consumes the
/// statement after it, so `transform!(A)` followed by `transform!(B)` makes
/// the second directive the first one's target. A directive in last position
/// has no target and is not a match.
pub fn scan(statements: &[SyntaxNode]) -> Vec<DirectiveMatch> {
    let mut matches = Vec::new();
    let mut index = 0;
    while index + 1 < statements.len() {
        match directive_name(&statements[index]) {
            Some(name) => {
                matches.push(DirectiveMatch {
                    directive_index: index,
                    target_index: index + 1,
                    name,
                });
                index += 2;
            }
            None => index += 1,
        }
    }
    matches
}

/// Cheap textual pre-check: could this input contain a directive at all?
pub fn contains_marker(text: impl AsRef<[u8]>) -> bool {
    let marker = MARKER.as_bytes();
    text.as_ref()
        .windows(marker.len())
        .any(|window| window == marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use splice_parser::parse;

    fn statements(source: &str) -> Vec<SyntaxNode> {
        let tree = parse(source).unwrap();
        let root = tree.root();
        if root.is_sequence() {
            root.child_nodes().cloned().collect()
        } else {
            vec![root.clone()]
        }
    }

    fn first_name(source: &str) -> Option<SmolStr> {
        directive_name(&statements(source)[0])
    }

    #[test]
    fn test_directive_shapes() {
        assert_eq!(first_name("transform!(Foo)").as_deref(), Some("Foo"));
        assert_eq!(first_name("transform!(A::B::C)").as_deref(), Some("A::B::C"));
        assert_eq!(first_name("transform!(::Top::Level)").as_deref(), Some("::Top::Level"));

        assert_eq!(first_name("transform!"), None);
        assert_eq!(first_name("transform!(Foo, Bar)"), None);
        assert_eq!(first_name("transform!(foo)"), None);
        assert_eq!(first_name("transform!(\"Foo\")"), None);
        assert_eq!(first_name("x.transform!(Foo)"), None);
        assert_eq!(first_name("other!(Foo)"), None);
    }

    #[test]
    fn test_scan_pairs_directive_with_next_statement() {
        let found = scan(&statements("a\ntransform!(Foo)\nb\nc\n"));
        assert_eq!(
            found,
            vec![DirectiveMatch {
                directive_index: 1,
                target_index: 2,
                name: "Foo".into(),
            }]
        );
    }

    #[test]
    fn test_scan_is_non_overlapping() {
        let found = scan(&statements(
            "transform!(A)\ntransform!(B)\nx\ntransform!(C)\ny\n",
        ));
        let pairs: Vec<_> = found
            .iter()
            .map(|m| (m.directive_index, m.target_index, m.name.as_str()))
            .collect();
        assert_eq!(pairs, vec![(0, 1, "A"), (3, 4, "C")]);
    }

    #[test]
    fn test_trailing_directive_is_ignored() {
        assert!(scan(&statements("class Potato\nend\ntransform!(Foo)\n")).is_empty());
        assert!(scan(&statements("transform!(Foo)\n")).is_empty());
    }

    #[test]
    fn test_contains_marker() {
        assert!(contains_marker("x = 1\ntransform!(Foo)\n"));
        assert!(contains_marker(b"# transform! in a comment"));
        assert!(!contains_marker("transform(Foo)"));
        assert!(!contains_marker(""));
    }
}
