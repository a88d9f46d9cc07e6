//! Read-only traversal and search over an [`Ast`].
//!
//! These helpers work on bare node handles and never allocate positioned
//! paths, which makes them the cheap option for analysis that does not edit.
//! For parent links, scopes and edits use a
//! [`Document`](crate::node_path::Document).
//!
//! # Traversal
//!
//! - [`DfsIter`] -- depth-first pre-order. A node is yielded before its
//!   children, children in field order.
//! - [`BfsIter`] -- level order. Every node at depth N is yielded before any
//!   node at depth N+1.
//!
//! Both are reachable through the [`TreeWalk`] methods [`dfs`](TreeWalk::dfs)
//! and [`bfs`](TreeWalk::bfs), which also provide [`find`](TreeWalk::find),
//! [`find_all`](TreeWalk::find_all), [`contains`](TreeWalk::contains) and
//! [`count`](TreeWalk::count). Common predicates are free functions taking a
//! `&Node`, e.g. `ast.find_all(root, is_column)`.

use std::collections::VecDeque;

use crate::arena::Ast;
use crate::nodes::{Node, NodeId};

/// Depth-first (pre-order) iterator over a subtree.
///
/// For `a + b` the order is `Arithmetic`, `a`, `b`.
pub struct DfsIter<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl<'a> DfsIter<'a> {
    pub fn new(ast: &'a Ast, root: NodeId) -> Self {
        Self {
            ast,
            stack: vec![root],
        }
    }
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // Reverse so children come out in field order
        self.stack.extend(self.ast.children(id).into_iter().rev());
        Some(id)
    }
}

/// Level-order iterator over a subtree.
///
/// For `(a + b) = c` the order is `Comparison`, `Paren`, `c`, `Arithmetic`,
/// `a`, `b`.
pub struct BfsIter<'a> {
    ast: &'a Ast,
    queue: VecDeque<NodeId>,
}

impl<'a> BfsIter<'a> {
    pub fn new(ast: &'a Ast, root: NodeId) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(root);
        Self { ast, queue }
    }
}

impl<'a> Iterator for BfsIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        self.queue.extend(self.ast.children(id));
        Some(id)
    }
}

/// Traversal and search methods over the subtree under a root handle.
pub trait TreeWalk {
    /// Depth-first pre-order iterator starting at `root`
    fn dfs(&self, root: NodeId) -> DfsIter<'_>;

    /// Level-order iterator starting at `root`
    fn bfs(&self, root: NodeId) -> BfsIter<'_>;

    /// First node matching `predicate` in depth-first order
    fn find<F>(&self, root: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool;

    /// Every node matching `predicate` in depth-first order
    fn find_all<F>(&self, root: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool;

    /// Returns `true` if `root` or any descendant matches
    fn contains<F>(&self, root: NodeId, predicate: F) -> bool
    where
        F: Fn(&Node) -> bool;

    /// Number of nodes in the subtree (including `root`) that match
    fn count<F>(&self, root: NodeId, predicate: F) -> usize
    where
        F: Fn(&Node) -> bool;

    /// Height of the subtree. A leaf has depth 0.
    fn tree_depth(&self, root: NodeId) -> usize;
}

impl TreeWalk for Ast {
    fn dfs(&self, root: NodeId) -> DfsIter<'_> {
        DfsIter::new(self, root)
    }

    fn bfs(&self, root: NodeId) -> BfsIter<'_> {
        BfsIter::new(self, root)
    }

    fn find<F>(&self, root: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.dfs(root).find(|id| predicate(self.get(*id)))
    }

    fn find_all<F>(&self, root: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.dfs(root).filter(|id| predicate(self.get(*id))).collect()
    }

    fn contains<F>(&self, root: NodeId, predicate: F) -> bool
    where
        F: Fn(&Node) -> bool,
    {
        self.dfs(root).any(|id| predicate(self.get(id)))
    }

    fn count<F>(&self, root: NodeId, predicate: F) -> usize
    where
        F: Fn(&Node) -> bool,
    {
        self.dfs(root).filter(|id| predicate(self.get(*id))).count()
    }

    fn tree_depth(&self, root: NodeId) -> usize {
        // Iterative so deeply nested expressions cannot overflow the stack
        let mut max_depth = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.children(id).into_iter().map(|c| (c, depth + 1)));
        }
        max_depth
    }
}

// ---------------------------------------------------------------------------
// Common node predicates
// ---------------------------------------------------------------------------

/// BigQuery aggregate functions recognised by [`is_aggregate`]
const AGGREGATE_FUNCTIONS: &[&str] = &[
    "ANY_VALUE",
    "ARRAY_AGG",
    "ARRAY_CONCAT_AGG",
    "AVG",
    "BIT_AND",
    "BIT_OR",
    "BIT_XOR",
    "COUNT",
    "COUNTIF",
    "LOGICAL_AND",
    "LOGICAL_OR",
    "MAX",
    "MIN",
    "STRING_AGG",
    "SUM",
];

macro_rules! is_type {
    ($name:ident, $($variant:pat),+ $(,)?) => {
        /// Returns `true` if `node` matches the expected kind(s).
        pub fn $name(node: &Node) -> bool {
            matches!(node, $($variant)|+)
        }
    };
}

is_type!(is_column, Node::Column(_));
is_type!(is_table, Node::Table(_));
is_type!(is_select, Node::Select(_));
is_type!(is_subquery, Node::Subquery(_) | Node::InSubquery(_) | Node::Exists(_));
is_type!(is_window_function, Node::WindowFunction(_));
is_type!(is_comparison, Node::Comparison(_));
is_type!(is_logical, Node::Logical(_));
is_type!(is_arithmetic, Node::Arithmetic(_));
is_type!(is_set_operation, Node::SetOperation(_));
is_type!(is_query, Node::Select(_) | Node::SetOperation(_));
is_type!(
    is_literal,
    Node::StringLiteral(_)
        | Node::IntegerLiteral(_)
        | Node::FloatLiteral(_)
        | Node::BooleanLiteral(_)
        | Node::NullLiteral(_)
        | Node::TypedLiteral(_)
);
is_type!(is_function, Node::FunctionCall(_) | Node::TableFunction(_));
is_type!(
    is_dml,
    Node::Insert(_) | Node::Update(_) | Node::Delete(_) | Node::Merge(_)
);
is_type!(is_ddl, Node::CreateTable(_) | Node::DropTable(_));

/// Returns `true` for a call of a known aggregate function
pub fn is_aggregate(node: &Node) -> bool {
    match node {
        Node::FunctionCall(call) => AGGREGATE_FUNCTIONS
            .iter()
            .any(|name| call.name.eq_ignore_ascii_case(name)),
        _ => false,
    }
}

/// Every column reference under `root`
pub fn get_columns(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    ast.find_all(root, is_column)
}

/// Every table reference under `root`
pub fn get_tables(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    ast.find_all(root, is_table)
}

/// Returns `true` if an aggregate call appears under `root`.
///
/// Aggregates used as window functions count too.
pub fn contains_aggregate(ast: &Ast, root: NodeId) -> bool {
    ast.contains(root, is_aggregate)
}

pub fn contains_window_function(ast: &Ast, root: NodeId) -> bool {
    ast.contains(root, is_window_function)
}

pub fn contains_subquery(ast: &Ast, root: NodeId) -> bool {
    ast.contains(root, is_subquery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use crate::nodes::NodeKind;

    #[test]
    fn test_dfs_simple() {
        let mut ast = Ast::new();
        let root = col("a").eq(lit(1)).build(&mut ast);
        let kinds: Vec<_> = ast.dfs(root).map(|id| ast.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Comparison,
                NodeKind::Column,
                NodeKind::IntegerLiteral
            ]
        );
    }

    #[test]
    fn test_bfs_is_level_order() {
        let mut ast = Ast::new();
        let root = col("a").add(col("b")).paren().eq(col("c")).build(&mut ast);
        let kinds: Vec<_> = ast.bfs(root).map(|id| ast.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Comparison,
                NodeKind::Paren,
                NodeKind::Column,
                NodeKind::Arithmetic,
                NodeKind::Column,
                NodeKind::Column,
            ]
        );
    }

    #[test]
    fn test_find_and_count() {
        let mut ast = Ast::new();
        let root = select(["a", "b"])
            .from("t")
            .where_(col("a").gt(lit(1)))
            .build(&mut ast);

        let first = ast.find(root, is_column).unwrap();
        assert!(matches!(ast.get(first), Node::Column(c) if c.name.name == "a"));
        assert_eq!(get_columns(&ast, root).len(), 3);
        assert_eq!(get_tables(&ast, root).len(), 1);
        assert_eq!(ast.count(root, is_literal), 1);
        assert!(!contains_subquery(&ast, root));
        assert!(ast.find(root, is_window_function).is_none());
    }

    #[test]
    fn test_aggregate_detection() {
        let mut ast = Ast::new();
        let root = select([sum(col("x")).alias("total")])
            .from("t")
            .build(&mut ast);
        assert!(contains_aggregate(&ast, root));

        let plain = select([func("upper", [col("x")])]).from("t").build(&mut ast);
        assert!(!contains_aggregate(&ast, plain));
    }

    #[test]
    fn test_contains_walks_below_root() {
        let mut ast = Ast::new();
        let root = select(["a"])
            .from("t")
            .where_(col("a").in_query(select(["b"]).from("u")))
            .build(&mut ast);
        assert!(ast.contains(root, is_column));
        assert!(contains_subquery(&ast, root));
        assert!(!contains_window_function(&ast, root));
        assert!(ast.is_allocated(root));
    }

    #[test]
    fn test_tree_depth() {
        let mut ast = Ast::new();
        let leaf = col("a").build(&mut ast);
        assert_eq!(ast.tree_depth(leaf), 0);

        // Comparison -> Arithmetic -> Column
        let nested = col("a").add(lit(1)).eq(lit(2)).build(&mut ast);
        assert_eq!(ast.tree_depth(nested), 2);
    }
}
