//! Node storage.
//!
//! An [`Ast`] owns every node of one or more trees in a flat vector and hands out
//! [`NodeId`] handles. Parent/child relationships exist only as handles stored in
//! child fields, so there are no ownership cycles and a node can be addressed
//! from any number of positioned views at once.
//!
//! Nodes are never freed individually. Replacing or removing a subtree leaves
//! the old nodes allocated but unreachable from the root.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::nodes::{ChildRef, Node, NodeId, NodeKind};

/// Arena of syntax tree nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node and return its handle
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of allocated nodes, reachable or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `id` was allocated by this arena
    pub fn is_allocated(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Borrow a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Borrow a node mutably.
    ///
    /// Prefer the structural edit operations on
    /// [`Document`](crate::node_path::Document); writing child handles directly
    /// bypasses index bookkeeping and cache invalidation.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Borrow a node if the handle is valid
    pub fn try_get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.get(id).kind()
    }

    /// Content of one child field of `id`
    pub fn child(&self, id: NodeId, field: &str) -> Option<ChildRef<'_>> {
        self.get(id).child(field)
    }

    /// Direct children of `id` in descriptor order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).child_ids()
    }

    /// Copy the subtree rooted at `id` into fresh nodes and return the new root.
    ///
    /// The copy is structurally equal to the original but shares no node
    /// identity with it.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let mut node = self.get(id).clone();
        let mut copies = Vec::new();
        for child in node.child_ids() {
            copies.push((child, self.deep_clone(child)));
        }
        node.map_children(&mut |old| {
            copies
                .iter()
                .find(|(from, _)| *from == old)
                .map(|(_, to)| *to)
                .unwrap_or(old)
        });
        self.alloc(node)
    }

    /// Returns `true` if the subtrees at `a` and `b` have equal shape and scalars
    pub fn structurally_equal(&self, a: NodeId, b: NodeId) -> bool {
        let (left, right) = (self.get(a), self.get(b));
        if left.kind() != right.kind() {
            return false;
        }
        let mut left = left.clone();
        let mut right = right.clone();
        let (left_children, right_children) = (left.child_ids(), right.child_ids());
        if left_children.len() != right_children.len() {
            return false;
        }
        if !left_children
            .iter()
            .zip(&right_children)
            .all(|(l, r)| self.structurally_equal(*l, *r))
        {
            return false;
        }
        // Scalars only: blank out handles before comparing
        left.map_children(&mut |_| NodeId(0));
        right.map_children(&mut |_| NodeId(0));
        left == right
    }

    /// Check that the tree under `root` only references allocated nodes and
    /// never reaches the same node twice.
    pub fn validate(&self, root: NodeId) -> Result<()> {
        if !self.is_allocated(root) {
            return Err(Error::invalid_tree(format!("root {} is not allocated", root)));
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if seen[id.index()] {
                return Err(Error::invalid_tree(format!(
                    "node {} is reachable more than once",
                    id
                )));
            }
            seen[id.index()] = true;
            for child in self.children(id) {
                if !self.is_allocated(child) {
                    return Err(Error::invalid_tree(format!(
                        "{} {} references unallocated node {}",
                        self.kind(id),
                        id,
                        child
                    )));
                }
                stack.push(child);
            }
        }
        Ok(())
    }
}

/// JSON snapshot of one tree: its arena and root handle
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub root: NodeId,
    pub nodes: Ast,
}

impl Snapshot {
    pub(crate) fn to_json(ast: &Ast, root: NodeId) -> Result<String> {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            root: NodeId,
            nodes: &'a Ast,
        }
        Ok(serde_json::to_string(&Borrowed { root, nodes: ast })?)
    }

    pub(crate) fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.nodes.validate(snapshot.root)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Column, Comparison, ComparisonOp, Identifier, IntegerLiteral};

    fn column(ast: &mut Ast, name: &str) -> NodeId {
        ast.alloc(Node::Column(Column {
            table: None,
            name: Identifier::new(name),
        }))
    }

    fn eq(ast: &mut Ast, name: &str, value: i64) -> NodeId {
        let left = column(ast, name);
        let right = ast.alloc(Node::IntegerLiteral(IntegerLiteral { value }));
        ast.alloc(Node::Comparison(Comparison {
            left,
            op: ComparisonOp::Eq,
            right,
        }))
    }

    #[test]
    fn test_alloc_and_children() {
        let mut ast = Ast::new();
        let cmp = eq(&mut ast, "a", 1);
        assert_eq!(ast.len(), 3);
        assert_eq!(ast.kind(cmp), NodeKind::Comparison);
        assert_eq!(ast.children(cmp).len(), 2);
    }

    #[test]
    fn test_deep_clone_is_structural_copy_with_new_identity() {
        let mut ast = Ast::new();
        let cmp = eq(&mut ast, "a", 1);
        let copy = ast.deep_clone(cmp);
        assert_ne!(copy, cmp);
        assert!(ast.structurally_equal(cmp, copy));
        let original_children = ast.children(cmp);
        for child in ast.children(copy) {
            assert!(!original_children.contains(&child));
        }
    }

    #[test]
    fn test_structurally_equal_compares_scalars() {
        let mut ast = Ast::new();
        let a = eq(&mut ast, "a", 1);
        let b = eq(&mut ast, "a", 2);
        let c = eq(&mut ast, "a", 1);
        assert!(!ast.structurally_equal(a, b));
        assert!(ast.structurally_equal(a, c));
    }

    #[test]
    fn test_validate_rejects_aliasing_and_dangling() {
        let mut ast = Ast::new();
        let col = column(&mut ast, "a");
        let aliased = ast.alloc(Node::Comparison(Comparison {
            left: col,
            op: ComparisonOp::Eq,
            right: col,
        }));
        assert!(ast.validate(aliased).is_err());

        let dangling = ast.alloc(Node::Comparison(Comparison {
            left: col,
            op: ComparisonOp::Eq,
            right: NodeId(999),
        }));
        assert!(matches!(ast.validate(dangling), Err(Error::InvalidTree(_))));
        assert!(ast.validate(NodeId(1000)).is_err());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut ast = Ast::new();
        let cmp = eq(&mut ast, "a", 1);
        let json = Snapshot::to_json(&ast, cmp).unwrap();
        let back = Snapshot::from_json(&json).unwrap();
        assert_eq!(back.root, cmp);
        assert_eq!(back.nodes, ast);
    }
}
