use splice_parser::{build, parse, render, Child, NodeKind, SyntaxNode};

fn sexp_snapshot(source: &str) -> String {
    let tree = parse(source).unwrap_or_else(|error| panic!("parse failed: {error}"));
    tree.root().to_sexp()
}

/// Renders `source` after rebuilding every compound node, so nothing is verbatim.
fn canonical(source: &str) -> String {
    fn rebuild(node: &SyntaxNode) -> SyntaxNode {
        let children = node.children().iter().map(|child| match child {
            Child::Node(inner) => Child::Node(rebuild(inner)),
            other => other.clone(),
        });
        node.updated(node.kind(), children)
    }

    let tree = parse(source).unwrap_or_else(|error| panic!("parse failed: {error}"));
    let root = rebuild(tree.root());
    render(&tree.with_root(root)).text
}

#[test]
fn test_snapshot_nested_definitions() {
    insta::assert_snapshot!(
        sexp_snapshot("module Outer\n  class Inner < Base\n    def call(a, b)\n      a + b\n    end\n  end\nend\n"),
        @"(module (const nil :Outer) (class (const nil :Inner) (const nil :Base) (def :call (args (arg :a) (arg :b)) (send (send nil :a) :+ (send nil :b)))))"
    );
}

#[test]
fn test_snapshot_method_chain_with_block() {
    insta::assert_snapshot!(
        sexp_snapshot("items.map do |item|\n  item.name\nend.compact\n"),
        @"(send (block (send (send nil :items) :map) (args (arg :item)) (send (send nil :item) :name)) :compact)"
    );
}

#[test]
fn test_canonical_render_normalizes_layout() {
    insta::assert_snapshot!(
        canonical("class   Foo<Bar\n\n      x  =  [1,2 ,3]\n    if x then  y(  'a' ) else z end\nend\n"),
        @r#"
    class Foo < Bar
      x = [1, 2, 3]
      if x
        y("a")
      else
        z
      end
    end
    "#
    );
}

#[test]
fn test_canonical_render_block_and_def() {
    insta::assert_snapshot!(
        canonical("Potato = Class.new do |klass|\n  def   fry\n  @oil=1\n  end\nend\n"),
        @r"
    Potato = Class.new do |klass|
      def fry
        @oil = 1
      end
    end
    "
    );
}

#[test]
fn test_canonical_render_keeps_comments_before_program() {
    let rendered = canonical("# frozen\n# second\nfoo(1)\n");
    assert_eq!(rendered, "# frozen\n# second\nfoo(1)\n");
}

#[test]
fn test_updated_node_inside_untouched_siblings() {
    let tree = parse("a\n\n# doc\nclass Foo\n  bar\nend\nz\n").unwrap();
    let root = tree.root();
    let class = root.node_at(1).unwrap();
    let renamed = class.with_children([
        Child::Node(build::const_path("Bar")),
        Child::Absent,
        class.child(2).cloned().unwrap_or(Child::Absent),
    ]);
    let new_root = root.with_children([
        root.child(0).cloned().unwrap(),
        Child::Node(renamed),
        root.child(2).cloned().unwrap(),
    ]);

    let rendered = render(&tree.with_root(new_root));
    assert_eq!(rendered.text, "a\n\n# doc\nclass Bar\n  bar\nend\nz\n");
    let lines: Vec<_> = rendered.line_map.iter().map(|(_, line)| line).collect();
    assert_eq!(
        lines,
        vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(4), Some(7)]
    );
}

#[test]
fn test_synthesized_sequence_lines_are_unmapped() {
    let tree = parse("x\n").unwrap();
    let root = build::begin([
        build::send(None, "puts", [build::str("hi")]),
        SyntaxNode::new(NodeKind::Nil, []),
    ]);
    let rendered = render(&tree.with_root(root));
    assert_eq!(rendered.text, "puts(\"hi\")\nnil\n");
    assert_eq!(rendered.line_map.line(1), None);
    assert_eq!(rendered.line_map.line(2), None);
}
