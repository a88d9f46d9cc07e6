#![allow(dead_code)]
//! Shared fixtures for the integration tests

use once_cell::sync::Lazy;
use sqlpath::builder::{col, lit, select, SelectBuilder};
use sqlpath::{Ast, Document, Node, PathId, SerializerConfig};

/// `SELECT a, b FROM t WHERE a = 1 AND b = 2` as a `{root, nodes}` snapshot,
/// the form an external parser hands over
pub static TWO_PREDICATES: Lazy<String> = Lazy::new(|| {
    let mut ast = Ast::new();
    let root = select(["a", "b"])
        .from("t")
        .where_(col("a").eq(lit(1)).and(col("b").eq(lit(2))))
        .build(&mut ast);
    Document::new(ast, root)
        .and_then(|doc| doc.to_json())
        .expect("fixture document builds")
});

/// A fresh session over [`TWO_PREDICATES`]
pub fn two_predicates() -> Document {
    Document::from_json(&TWO_PREDICATES).expect("fixture snapshot loads")
}

/// Open a session over a built query
pub fn document(query: SelectBuilder) -> Document {
    let mut ast = Ast::new();
    let root = query.build(&mut ast);
    Document::new(ast, root).expect("query builds a valid tree")
}

pub fn compact_sql(doc: &Document) -> String {
    doc.to_sql(&SerializerConfig::compact())
        .expect("document serializes")
}

/// Views of the root SELECT list, in list order
pub fn select_columns(doc: &mut Document) -> Vec<PathId> {
    let root = doc.root();
    doc.children(root)
        .into_iter()
        .filter(|p| doc.field(*p) == Some("columns"))
        .collect()
}

/// Name of the column wrapped by `path`
pub fn column_name(doc: &Document, path: PathId) -> String {
    match doc.node(path) {
        Node::Column(c) => c.name.name.clone(),
        other => panic!("expected a column, found {}", other.kind()),
    }
}
