//! sqlpath - structural editing for BigQuery SQL syntax trees
//!
//! This library locates, queries and rewrites subtrees of a SQL statement and
//! re-emits the edited tree as SQL text.
//!
//! # Architecture
//!
//! 1. **Node model** - every node lives in an [`Ast`] arena and is addressed by
//!    a [`NodeId`]. Each [`NodeKind`] describes its child-bearing fields.
//! 2. **Visitor** - [`dispatch`] calls the per-kind handler of a [`Visitor`];
//!    the [`Serializer`] is an [`ExhaustiveVisitor`].
//! 3. **Document** - an edit session. A [`PathId`] is a positioned view of a
//!    node (parent, field, list index, scope) and the only way to edit the tree.
//! 4. **Collection** - chainable queries and bulk edits over many views.
//! 5. **Serializer** - SQL text from the (possibly edited) tree.
//!
//! Trees come from an external parser through [`Document::from_json`] or are
//! put together with the [`builder`] helpers.

pub mod arena;
pub mod ast_transforms;
pub mod builder;
pub mod collection;
pub mod error;
pub mod node_path;
pub mod nodes;
pub mod scope;
pub mod serializer;
pub mod traversal;
pub mod visitor;

pub use arena::Ast;
pub use ast_transforms::{
    add_select_columns, add_where, get_column_names, get_table_names, node_count, qualify_columns,
    remove_select_columns, remove_where, rename_columns, rename_tables, set_distinct,
};
pub use collection::{Collection, NodeSource};
pub use error::{Error, Result, StructuralReason};
pub use node_path::{Document, PathId};
pub use nodes::{Cardinality, ChildRef, FieldSpec, Identifier, Node, NodeId, NodeKind};
pub use scope::{collect_bindings, Binding, Scope, ScopeArena, ScopeId};
pub use serializer::{
    compact, is_reserved_keyword, pretty, FormatStyle, Serializer, SerializerConfig,
};
pub use traversal::{
    contains_aggregate, contains_subquery, contains_window_function, get_columns, get_tables,
    is_aggregate, is_arithmetic, is_column, is_comparison, is_ddl, is_dml, is_function, is_literal,
    is_logical, is_query, is_select, is_set_operation, is_subquery, is_table, is_window_function,
    BfsIter, DfsIter, TreeWalk,
};
pub use visitor::{dispatch, dispatch_exhaustive, walk, ExhaustiveVisitor, Visitor};

/// Open an edit session over a tree, apply `edit` and render the result.
///
/// # Example
/// ```
/// use sqlpath::builder::{col, lit, select};
/// use sqlpath::{codemod, Ast, Collection, NodeKind, SerializerConfig};
///
/// let mut ast = Ast::new();
/// let root = select(["a", "b"]).from("t").build(&mut ast);
///
/// let sql = codemod(ast, root, &SerializerConfig::compact(), |doc| {
///     Collection::from_root(doc)
///         .find(doc, NodeKind::Column)
///         .last()
///         .remove(doc)
/// })
/// .unwrap();
/// assert_eq!(sql, "SELECT a FROM t");
/// ```
pub fn codemod<F>(ast: Ast, root: NodeId, config: &SerializerConfig, edit: F) -> Result<String>
where
    F: FnOnce(&mut Document) -> Result<()>,
{
    let mut doc = Document::new(ast, root)?;
    edit(&mut doc)?;
    doc.to_sql(config)
}
