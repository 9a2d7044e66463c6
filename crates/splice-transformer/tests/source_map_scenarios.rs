//! Line provenance through whole-tree transformations.
//!
//! Each scenario rewrites a small document with a transformation applied to
//! the root and checks which input line each output line maps back to.

use pretty_assertions::assert_eq;
use source_map::SourceMapStore;
use splice_parser::build::{int, s, send};
use splice_parser::{Child, NodeKind, SyntaxNode};
use splice_transformer::{rewrite, BoxError, Step, Transformer};

fn rewrite_direct(
    source: &str,
    transformation: fn(&SyntaxNode) -> Result<SyntaxNode, BoxError>,
) -> (String, SourceMapStore) {
    let transformer = Transformer::new(vec![Step::direct(transformation)]);
    let store = SourceMapStore::new();
    let output = rewrite(source, "transformed", &transformer, &store).unwrap();
    (output, store)
}

fn child(node: &SyntaxNode, index: usize) -> SyntaxNode {
    node.node_at(index).cloned().unwrap()
}

#[test]
fn test_synthesized_wrapper_maps_to_wrapped_node() {
    let (output, store) = rewrite_direct("method_call\n", |node| {
        Ok(send(Some(node.clone()), "+", [int(1)]))
    });
    assert_eq!(output, "method_call + 1\n");
    assert_eq!(store.lookup("transformed", 1), Some(1));
}

#[test]
fn test_updated_node_keeps_its_line() {
    let (output, store) = rewrite_direct("method_call\n", |node| {
        Ok(node.updated(
            NodeKind::Send,
            [Child::Node(node.clone()), Child::sym("+"), Child::Node(int(1))],
        ))
    });
    assert_eq!(output, "method_call + 1\n");
    assert_eq!(store.lookup("transformed", 1), Some(1));
}

#[test]
fn test_collapsed_lines_map_to_first_contributor() {
    let (output, store) = rewrite_direct("method_call1\nmethod_call2\n", |node| {
        Ok(send(Some(child(node, 0)), "+", [child(node, 1)]))
    });
    assert_eq!(output, "method_call1 + method_call2\n");
    assert_eq!(store.lookup("transformed", 1), Some(1));
}

#[test]
fn test_expanded_lines_map_to_origin() {
    let (output, store) = rewrite_direct("method_call1 + method_call2\n", |node| {
        Ok(node.updated(
            NodeKind::Begin,
            [Child::Node(child(node, 0)), Child::Node(child(node, 2))],
        ))
    });
    assert_eq!(output, "method_call1\nmethod_call2\n");
    assert_eq!(store.lookup("transformed", 1), Some(1));
    assert_eq!(store.lookup("transformed", 2), Some(1));
}

#[test]
fn test_fully_synthesized_output_is_unmapped() {
    let (output, store) = rewrite_direct("method_call\n", |_| {
        Ok(send(Some(int(1)), "+", [int(2)]))
    });
    assert_eq!(output, "1 + 2\n");
    assert_eq!(store.lookup("transformed", 1), None);
}

#[test]
fn test_pass_through_maps_every_line_to_itself() {
    let source = "# comment\nclass A\n\n  def b(x)\n    x   * 2\n  end\nend\n";
    let (output, store) = rewrite_direct(source, |node| Ok(node.clone()));
    assert_eq!(output, source);
    for line in 1..=7 {
        assert_eq!(store.lookup("transformed", line), Some(line));
    }
    assert_eq!(store.lookup("transformed", 8), None);
}

#[test]
fn test_new_lines_inside_updated_class_map_to_class() {
    let (output, store) = rewrite_direct("class A\n  a\nend\n", |node| {
        let mut children = node.children().to_vec();
        children[2] = Child::Node(s(
            NodeKind::Begin,
            [
                Child::Node(send(None, "generated", [])),
                Child::Node(child(node, 2)),
            ],
        ));
        Ok(node.updated(NodeKind::Class, children))
    });
    assert_eq!(output, "class A\n  generated\n  a\nend\n");
    let store_lines: Vec<_> = (1..=4).map(|line| store.lookup("transformed", line)).collect();
    assert_eq!(store_lines, vec![Some(1), Some(1), Some(2), Some(1)]);
}

#[test]
fn test_later_rewrite_replaces_map() {
    let transformer = Transformer::new(vec![Step::direct(
        |node: &SyntaxNode| -> Result<SyntaxNode, BoxError> { Ok(node.clone()) },
    )]);
    let store = SourceMapStore::new();
    rewrite("a\nb\nc\n", "doc", &transformer, &store).unwrap();
    assert_eq!(store.lookup("doc", 3), Some(3));

    rewrite("a\n", "doc", &transformer, &store).unwrap();
    assert_eq!(store.lookup("doc", 3), None);
    assert_eq!(store.output_ids(), vec!["doc".to_string()]);
}
