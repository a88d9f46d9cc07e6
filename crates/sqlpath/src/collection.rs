//! Chainable queries and bulk edits over positioned nodes.
//!
//! A [`Collection`] is an ordered list of [`PathId`] views into one
//! [`Document`]. Query methods return new collections; bulk edit methods apply
//! the matching [`Document`] edit to every member.
//!
//! # Example
//!
//! ```
//! use sqlpath::builder::{col, lit, select};
//! use sqlpath::{Ast, Collection, Document, NodeKind};
//!
//! let mut ast = Ast::new();
//! let root = select(["a"])
//!     .from("t")
//!     .where_(col("a").eq(lit(1)))
//!     .build(&mut ast);
//! let mut doc = Document::new(ast, root).unwrap();
//!
//! let found = Collection::from_root(&doc).find(&mut doc, NodeKind::Comparison);
//! assert_eq!(found.len(), 1);
//! ```
//!
//! # Bulk edits
//!
//! Before anything is spliced, a bulk edit checks the structural
//! preconditions of every member and fails without changing the tree if one
//! does not hold. A failure that only shows up while the edit is running (a
//! member removed together with an earlier member's subtree) stops the call at
//! that member; the edits already applied stay in place.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::node_path::{Document, PathId};
use crate::nodes::{Node, NodeId, NodeKind};

/// Supplies the node written for each member of a bulk edit
pub trait NodeSource {
    /// Node for `member`, the `position`-th member of the collection
    fn produce(&mut self, doc: &mut Document, member: PathId, position: usize) -> NodeId;

    /// Checked with the members' preconditions, before any edit
    fn validate(&self, _doc: &Document) -> Result<()> {
        Ok(())
    }
}

/// A constant node. The member at position 0 receives the node itself, every
/// other member a deep clone, so no two slots share a node.
impl NodeSource for NodeId {
    fn produce(&mut self, doc: &mut Document, _member: PathId, position: usize) -> NodeId {
        if position == 0 {
            *self
        } else {
            doc.ast_mut().deep_clone(*self)
        }
    }

    fn validate(&self, doc: &Document) -> Result<()> {
        if doc.ast().is_allocated(*self) {
            Ok(())
        } else {
            Err(Error::invalid_tree(format!("node {} is not allocated", self)))
        }
    }
}

impl<F> NodeSource for F
where
    F: FnMut(&mut Document, PathId, usize) -> NodeId,
{
    fn produce(&mut self, doc: &mut Document, member: PathId, position: usize) -> NodeId {
        self(doc, member, position)
    }
}

/// Ordered group of positioned nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    paths: Vec<PathId>,
}

impl Collection {
    pub fn new(paths: Vec<PathId>) -> Self {
        Self { paths }
    }

    /// Collection holding the document root
    pub fn from_root(doc: &Document) -> Self {
        Self::new(vec![doc.root()])
    }

    pub fn from_path(path: PathId) -> Self {
        Self::new(vec![path])
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathId] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<PathId> {
        self.paths
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, PathId>> {
        self.paths.iter().copied()
    }

    /// Member at `index`
    pub fn at(&self, index: usize) -> Option<PathId> {
        self.paths.get(index).copied()
    }

    /// Node wrapped by the member at `index`
    pub fn get<'d>(&self, doc: &'d Document, index: usize) -> Option<&'d Node> {
        self.at(index).map(|p| doc.node(p))
    }

    /// Nodes wrapped by every member, in order
    pub fn nodes(&self, doc: &Document) -> Vec<NodeId> {
        self.iter().map(|p| doc.node_id(p)).collect()
    }

    // -- Queries ------------------------------------------------------------

    /// Descendants of kind `kind` below every member (members excluded), in
    /// pre-order per member, members in collection order
    pub fn find(&self, doc: &mut Document, kind: NodeKind) -> Collection {
        self.find_where(doc, kind, |_, _| true)
    }

    /// Like [`find`](Collection::find) with an extra predicate
    pub fn find_where<F>(&self, doc: &mut Document, kind: NodeKind, mut pred: F) -> Collection
    where
        F: FnMut(&Document, PathId) -> bool,
    {
        let mut found = Vec::new();
        for member in self.iter() {
            found.extend(doc.find_descendants(member, |d, p| d.kind(p) == kind && pred(d, p)));
        }
        Collection::new(found)
    }

    pub fn filter<F>(&self, doc: &Document, mut pred: F) -> Collection
    where
        F: FnMut(&Document, PathId) -> bool,
    {
        Collection::new(self.iter().filter(|p| pred(doc, *p)).collect())
    }

    pub fn filter_kind(&self, doc: &Document, kind: NodeKind) -> Collection {
        self.filter(doc, |d, p| d.kind(p) == kind)
    }

    pub fn map<T, F>(&self, doc: &mut Document, mut f: F) -> Vec<T>
    where
        F: FnMut(&mut Document, PathId, usize) -> T,
    {
        self.iter()
            .enumerate()
            .map(|(i, p)| f(doc, p, i))
            .collect()
    }

    pub fn for_each<F>(&self, doc: &mut Document, mut f: F) -> &Self
    where
        F: FnMut(&mut Document, PathId, usize),
    {
        for (i, p) in self.iter().enumerate() {
            f(doc, p, i);
        }
        self
    }

    pub fn some<F>(&self, doc: &Document, mut pred: F) -> bool
    where
        F: FnMut(&Document, PathId) -> bool,
    {
        self.iter().any(|p| pred(doc, p))
    }

    pub fn every<F>(&self, doc: &Document, mut pred: F) -> bool
    where
        F: FnMut(&Document, PathId) -> bool,
    {
        self.iter().all(|p| pred(doc, p))
    }

    /// Nearest ancestor of kind `kind` for each member that has one
    pub fn closest(&self, doc: &Document, kind: NodeKind) -> Collection {
        self.closest_where(doc, kind, |_, _| true)
    }

    pub fn closest_where<F>(&self, doc: &Document, kind: NodeKind, mut pred: F) -> Collection
    where
        F: FnMut(&Document, PathId) -> bool,
    {
        Collection::new(
            self.iter()
                .filter_map(|p| doc.find_ancestor(p, |d, a| d.kind(a) == kind && pred(d, a)))
                .collect(),
        )
    }

    /// Parents of the members, each node once
    pub fn parent(&self, doc: &Document) -> Collection {
        let parents = self.iter().filter_map(|p| doc.parent(p)).collect();
        Collection::new(parents).unique(doc)
    }

    /// Children of the members, each node once
    pub fn children(&self, doc: &mut Document) -> Collection {
        let mut children = Vec::new();
        for member in self.iter() {
            children.extend(doc.children(member));
        }
        Collection::new(children).unique(doc)
    }

    /// Drop members whose node already appeared earlier
    pub fn unique(&self, doc: &Document) -> Collection {
        let mut seen = HashSet::new();
        Collection::new(
            self.iter()
                .filter(|p| seen.insert(doc.node_id(*p)))
                .collect(),
        )
    }

    /// Sorted distinct kind names of the members
    pub fn kinds(&self, doc: &Document) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.iter().map(|p| doc.kind(p).name()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }

    pub fn has_kind(&self, doc: &Document, kind: NodeKind) -> bool {
        self.some(doc, |d, p| d.kind(p) == kind)
    }

    pub fn first(&self) -> Collection {
        self.slice(0, Some(1))
    }

    pub fn last(&self) -> Collection {
        Collection::new(self.paths.last().copied().into_iter().collect())
    }

    /// Member at `index` as a one-element collection; empty when out of range
    pub fn nth(&self, index: usize) -> Collection {
        Collection::new(self.at(index).into_iter().collect())
    }

    /// Members `start..end`, clamped to the collection
    pub fn slice(&self, start: usize, end: Option<usize>) -> Collection {
        let end = end.unwrap_or(self.paths.len()).min(self.paths.len());
        let start = start.min(end);
        Collection::new(self.paths[start..end].to_vec())
    }

    pub fn reverse(&self) -> Collection {
        Collection::new(self.paths.iter().rev().copied().collect())
    }

    pub fn sort_by_key<K, F>(&self, doc: &Document, mut key: F) -> Collection
    where
        K: Ord,
        F: FnMut(&Document, PathId) -> K,
    {
        let mut paths = self.paths.clone();
        paths.sort_by_key(|p| key(doc, *p));
        Collection::new(paths)
    }

    /// Resolve `path` (e.g. `from.sources[0]`) below every member, skipping
    /// members where it does not resolve
    pub fn lookup_path(&self, doc: &mut Document, path: &str) -> Collection {
        Collection::new(self.iter().filter_map(|p| doc.lookup_path(p, path)).collect())
    }

    // -- Bulk edits ---------------------------------------------------------

    /// Replace every member's node. Members keep their handles, so the
    /// returned collection equals `self`.
    pub fn replace_with<S: NodeSource>(&self, doc: &mut Document, mut source: S) -> Result<Collection> {
        debug!("replace_with on {} members", self.len());
        for member in self.iter() {
            doc.check(member, false)?;
        }
        source.validate(doc)?;
        for (i, member) in self.iter().enumerate() {
            let node = source.produce(doc, member, i);
            doc.replace(member, node)?;
        }
        Ok(self.clone())
    }

    /// Remove every member from its list, last member first.
    ///
    /// Handles stay correct while earlier members are removed, so the outcome
    /// does not depend on member order. A member listed twice is removed once.
    pub fn remove(&self, doc: &mut Document) -> Result<()> {
        debug!("remove on {} members", self.len());
        let mut seen = HashSet::new();
        let members: Vec<_> = self.iter().filter(|p| seen.insert(*p)).collect();
        for member in &members {
            doc.check(*member, true)?;
        }
        for member in members.into_iter().rev() {
            doc.remove(member)?;
        }
        Ok(())
    }

    /// Insert a node before every member. Returns the inserted views in
    /// member order.
    pub fn insert_before<S: NodeSource>(&self, doc: &mut Document, source: S) -> Result<Collection> {
        debug!("insert_before on {} members", self.len());
        self.insert(doc, source, Document::insert_before)
    }

    /// Insert a node after every member. Returns the inserted views in member
    /// order.
    pub fn insert_after<S: NodeSource>(&self, doc: &mut Document, source: S) -> Result<Collection> {
        debug!("insert_after on {} members", self.len());
        self.insert(doc, source, Document::insert_after)
    }

    fn insert<S, E>(&self, doc: &mut Document, mut source: S, edit: E) -> Result<Collection>
    where
        S: NodeSource,
        E: Fn(&mut Document, PathId, NodeId) -> Result<PathId>,
    {
        for member in self.iter() {
            doc.check(member, true)?;
        }
        source.validate(doc)?;
        let mut inserted = Vec::with_capacity(self.len());
        for (i, member) in self.iter().enumerate().rev() {
            let node = source.produce(doc, member, i);
            inserted.push(edit(doc, member, node)?);
        }
        inserted.reverse();
        Ok(Collection::new(inserted))
    }
}

impl From<Vec<PathId>> for Collection {
    fn from(paths: Vec<PathId>) -> Self {
        Collection::new(paths)
    }
}

impl IntoIterator for Collection {
    type Item = PathId;
    type IntoIter = std::vec::IntoIter<PathId>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}
