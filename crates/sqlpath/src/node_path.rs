//! Positioned nodes and structural editing.
//!
//! A [`Document`] is one edit session over a tree: it owns the [`Ast`], the
//! root handle, the [`ScopeArena`] and every positioned view handed out so far.
//! A positioned view is addressed by a [`PathId`] and records the node it wraps,
//! its parent view, the parent field it occupies, its list index (only for
//! list-valued fields) and its scope.
//!
//! # Editing
//!
//! [`Document::replace`], [`Document::remove`], [`Document::insert_before`],
//! [`Document::insert_after`], [`Document::set_field`] and [`Document::append`]
//! all funnel into one private splice routine. It checks the structural preconditions and that the
//! written node belongs to the arena, writes the field, shifts the list indices
//! of later siblings, detaches views of nodes that left the tree and
//! invalidates the affected child caches, in that order. Sibling indices are
//! therefore contiguous and in list order as soon as an edit returns.
//!
//! # Identity
//!
//! A [`PathId`] stays the canonical view of its slot for as long as the slot
//! exists: recomputing a parent's children reuses every view whose field, index
//! and node still match. Views of removed nodes, and views below a replaced
//! node, become *detached*; editing through them fails with
//! [`StructuralReason::Detached`].

use std::fmt;

use tracing::{debug, trace};

use crate::arena::{Ast, Snapshot};
use crate::error::{Error, Result, StructuralReason};
use crate::nodes::{Cardinality, ChildRef, Node, NodeId, NodeKind};
use crate::scope::{collect_bindings, Binding, ScopeArena, ScopeId};
use crate::serializer::{Serializer, SerializerConfig};

/// Handle of a positioned view inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(u32);

impl PathId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct PathEntry {
    node: NodeId,
    parent: Option<PathId>,
    field: Option<&'static str>,
    index: Option<usize>,
    scope: ScopeId,
    depth: usize,
    detached: bool,
    /// Live child views known to this entry, in no particular order
    children: Vec<PathId>,
    /// `children` is complete and in enumeration order
    children_valid: bool,
}

#[derive(Debug, Clone, Copy)]
enum Edit {
    Replace(NodeId),
    Remove,
    Insert { at: usize, node: NodeId },
    /// Set or empty a single-valued field of the edited node itself
    Assign {
        field: &'static str,
        node: Option<NodeId>,
    },
    /// Push onto a list field of the edited node itself
    Append { field: &'static str, node: NodeId },
}

impl Edit {
    fn name(&self) -> &'static str {
        match self {
            Edit::Replace(_) => "replace",
            Edit::Remove => "remove",
            Edit::Insert { .. } => "insert",
            Edit::Assign { .. } => "assign",
            Edit::Append { .. } => "append",
        }
    }

    fn needs_list(&self) -> bool {
        matches!(self, Edit::Remove | Edit::Insert { .. })
    }

    /// The node this edit writes into the tree
    fn written(&self) -> Option<NodeId> {
        match self {
            Edit::Replace(node) | Edit::Insert { node, .. } | Edit::Append { node, .. } => Some(*node),
            Edit::Assign { node, .. } => *node,
            Edit::Remove => None,
        }
    }
}

/// An edit session over one tree
#[derive(Debug, Clone)]
pub struct Document {
    ast: Ast,
    root: PathId,
    paths: Vec<PathEntry>,
    scopes: ScopeArena,
}

impl Document {
    /// Open a session over the tree rooted at `root`.
    ///
    /// Fails with [`Error::InvalidTree`] if the tree references unallocated
    /// nodes or reaches a node twice.
    pub fn new(ast: Ast, root: NodeId) -> Result<Self> {
        ast.validate(root)?;
        let mut scopes = ScopeArena::new();
        let scope = scopes.open(&ast, root, None);
        debug!("document opened at {} ({} nodes)", ast.kind(root), ast.len());
        Ok(Self {
            ast,
            root: PathId(0),
            paths: vec![PathEntry {
                node: root,
                parent: None,
                field: None,
                index: None,
                scope,
                depth: 0,
                detached: false,
                children: Vec::new(),
                children_valid: false,
            }],
            scopes,
        })
    }

    /// Parse a `{ "root": .., "nodes": [..] }` snapshot
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot = Snapshot::from_json(json)?;
        Self::new(snapshot.nodes, snapshot.root)
    }

    /// Write the whole arena and the root handle as JSON
    pub fn to_json(&self) -> Result<String> {
        Snapshot::to_json(&self.ast, self.root_node())
    }

    /// Render the tree as SQL text
    pub fn to_sql(&self, config: &SerializerConfig) -> Result<String> {
        Serializer::new(config.clone()).serialize(&self.ast, self.root_node())
    }

    /// Render the subtree at `path` as SQL text
    pub fn to_sql_at(&self, path: PathId, config: &SerializerConfig) -> Result<String> {
        Serializer::new(config.clone()).serialize(&self.ast, self.node_id(path))
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Mutable arena access, for allocating replacement nodes.
    ///
    /// Changing child handles of reachable nodes here bypasses index
    /// bookkeeping; views whose slot no longer matches are detached the next
    /// time their parent's children are recomputed.
    pub fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }

    pub fn into_ast(self) -> (Ast, NodeId) {
        let root = self.root_node();
        (self.ast, root)
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    /// The root view
    pub fn root(&self) -> PathId {
        self.root
    }

    /// The root node
    pub fn root_node(&self) -> NodeId {
        self.entry(self.root).node
    }

    fn entry(&self, path: PathId) -> &PathEntry {
        &self.paths[path.index()]
    }

    fn entry_mut(&mut self, path: PathId) -> &mut PathEntry {
        &mut self.paths[path.index()]
    }

    // -- Accessors ----------------------------------------------------------

    /// The node currently wrapped by `path`
    pub fn node(&self, path: PathId) -> &Node {
        self.ast.get(self.entry(path).node)
    }

    pub fn node_id(&self, path: PathId) -> NodeId {
        self.entry(path).node
    }

    pub fn kind(&self, path: PathId) -> NodeKind {
        self.ast.kind(self.entry(path).node)
    }

    pub fn parent(&self, path: PathId) -> Option<PathId> {
        self.entry(path).parent
    }

    /// Name of the parent field `path` occupies; `None` for the root
    pub fn field(&self, path: PathId) -> Option<&'static str> {
        self.entry(path).field
    }

    /// Position in the parent's list field; `None` for single-valued fields
    /// and the root
    pub fn index(&self, path: PathId) -> Option<usize> {
        self.entry(path).index
    }

    pub fn scope_of(&self, path: PathId) -> ScopeId {
        self.entry(path).scope
    }

    /// Distance from the root
    pub fn depth(&self, path: PathId) -> usize {
        self.entry(path).depth
    }

    /// The root view of the tree `path` belongs to
    pub fn path_root(&self, path: PathId) -> PathId {
        let mut current = path;
        while let Some(parent) = self.entry(current).parent {
            current = parent;
        }
        current
    }

    /// Returns `true` if `path` no longer names a slot in the tree
    pub fn is_detached(&self, path: PathId) -> bool {
        self.entry(path).detached
    }

    /// Returns `true` if `a` and `b` wrap the same node instance
    pub fn same_node(&self, a: PathId, b: PathId) -> bool {
        self.entry(a).node == self.entry(b).node
    }

    /// Diagnostic path from the root, e.g. `where_clause.condition.left` or
    /// `columns[2]`; `<root>` for the root
    pub fn path_string(&self, path: PathId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(path);
        while let Some(p) = current {
            let entry = self.entry(p);
            if let Some(field) = entry.field {
                match entry.index {
                    Some(i) => parts.push(format!("{}[{}]", field, i)),
                    None => parts.push(field.to_string()),
                }
            }
            current = entry.parent;
        }
        if parts.is_empty() {
            return "<root>".to_string();
        }
        parts.reverse();
        parts.join(".")
    }

    // -- Scope --------------------------------------------------------------

    /// Resolve `name` in the scope active at `path`
    pub fn lookup(&self, path: PathId, name: &str) -> Option<&Binding> {
        self.scopes.lookup(self.entry(path).scope, name)
    }

    /// Declare `name` in the scope active at `path`
    pub fn declare(&mut self, path: PathId, name: impl Into<String>, binding: Binding) {
        let scope = self.entry(path).scope;
        self.scopes.declare(scope, name, binding);
    }

    // -- Traversal ----------------------------------------------------------

    /// Child views of `path` in descriptor order, list elements in list order.
    ///
    /// The result is cached until an edit under `path` or a shift of its own
    /// index. A detached view has no children.
    pub fn children(&mut self, path: PathId) -> Vec<PathId> {
        let entry = self.entry(path);
        if entry.detached {
            return Vec::new();
        }
        if entry.children_valid {
            return entry.children.clone();
        }

        let node = entry.node;
        let (scope, depth) = (entry.scope, entry.depth);
        let mut known = std::mem::take(&mut self.entry_mut(path).children);

        let mut slots = Vec::new();
        for spec in self.ast.kind(node).fields() {
            match self.ast.child(node, spec.name) {
                Some(ChildRef::Single(Some(id))) => slots.push((spec.name, None, id)),
                Some(ChildRef::List(list)) => {
                    slots.extend(list.iter().enumerate().map(|(i, id)| (spec.name, Some(i), *id)))
                }
                _ => {}
            }
        }

        let mut children = Vec::with_capacity(slots.len());
        for (field, index, id) in slots {
            let reused = known.iter().position(|k| {
                let e = self.entry(*k);
                e.field == Some(field) && e.index == index && e.node == id
            });
            let child = match reused {
                Some(pos) => known.swap_remove(pos),
                None => {
                    let child_scope = self.scopes.open(&self.ast, id, Some(scope));
                    self.push_entry(id, path, field, index, child_scope, depth + 1)
                }
            };
            children.push(child);
        }

        for stale in known {
            self.detach(stale);
        }

        let entry = self.entry_mut(path);
        entry.children = children.clone();
        entry.children_valid = true;
        children
    }

    fn push_entry(
        &mut self,
        node: NodeId,
        parent: PathId,
        field: &'static str,
        index: Option<usize>,
        scope: ScopeId,
        depth: usize,
    ) -> PathId {
        let id = PathId(self.paths.len() as u32);
        self.paths.push(PathEntry {
            node,
            parent: Some(parent),
            field: Some(field),
            index,
            scope,
            depth,
            detached: false,
            children: Vec::new(),
            children_valid: false,
        });
        id
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, path: PathId) -> Vec<PathId> {
        let mut out = Vec::new();
        let mut current = self.entry(path).parent;
        while let Some(p) = current {
            out.push(p);
            current = self.entry(p).parent;
        }
        out
    }

    /// Nearest ancestor (excluding `path`) matching `pred`
    pub fn find_ancestor<F>(&self, path: PathId, mut pred: F) -> Option<PathId>
    where
        F: FnMut(&Document, PathId) -> bool,
    {
        let mut current = self.entry(path).parent;
        while let Some(p) = current {
            if pred(self, p) {
                return Some(p);
            }
            current = self.entry(p).parent;
        }
        None
    }

    /// Descendants of `path` (excluding `path`) matching `pred`, in pre-order
    pub fn find_descendants<F>(&mut self, path: PathId, mut pred: F) -> Vec<PathId>
    where
        F: FnMut(&Document, PathId) -> bool,
    {
        let mut out = Vec::new();
        let mut stack: Vec<PathId> = self.children(path).into_iter().rev().collect();
        while let Some(p) = stack.pop() {
            if pred(&*self, p) {
                out.push(p);
            }
            stack.extend(self.children(p).into_iter().rev());
        }
        out
    }

    /// `path` and all its descendants in pre-order
    pub fn walk(&mut self, path: PathId) -> Vec<PathId> {
        let mut out = vec![path];
        out.extend(self.find_descendants(path, |_, _| true));
        out
    }

    /// Views sharing the parent field of `path`, excluding `path` itself
    pub fn siblings(&mut self, path: PathId) -> Vec<PathId> {
        let Some(parent) = self.entry(path).parent else {
            return Vec::new();
        };
        let field = self.entry(path).field;
        self.children(parent)
            .into_iter()
            .filter(|p| *p != path && self.entry(*p).field == field)
            .collect()
    }

    /// Returns `true` if `path` is at index 0, or is not list-positioned
    pub fn is_first_child(&self, path: PathId) -> bool {
        matches!(self.entry(path).index, None | Some(0))
    }

    /// Returns `true` if `path` is the last element of its list, or is not
    /// list-positioned
    pub fn is_last_child(&self, path: PathId) -> bool {
        let entry = self.entry(path);
        let (Some(index), Some(parent), Some(field)) = (entry.index, entry.parent, entry.field)
        else {
            return true;
        };
        match self.ast.child(self.entry(parent).node, field) {
            Some(ChildRef::List(list)) => index + 1 == list.len(),
            _ => true,
        }
    }

    /// Resolve a diagnostic path such as `where_clause.condition.left` or
    /// `columns[1]` relative to `from`
    pub fn lookup_path(&mut self, from: PathId, path: &str) -> Option<PathId> {
        let mut current = from;
        if path.is_empty() || path == "<root>" {
            return Some(current);
        }
        for segment in path.split('.') {
            let (field, index) = match segment.split_once('[') {
                Some((field, rest)) => (field, Some(rest.strip_suffix(']')?.parse::<usize>().ok()?)),
                None => (segment, None),
            };
            current = self.children(current).into_iter().find(|c| {
                let e = self.entry(*c);
                e.field == Some(field) && e.index == index
            })?;
        }
        Some(current)
    }

    // -- Editing ------------------------------------------------------------

    /// Write `node` into the slot of `path`. `path` keeps naming the slot and
    /// now wraps `node`; views below the old node are detached.
    pub fn replace(&mut self, path: PathId, node: NodeId) -> Result<()> {
        self.splice(path, Edit::Replace(node)).map(|_| ())
    }

    /// Delete the list element at `path` and shift later siblings down
    pub fn remove(&mut self, path: PathId) -> Result<()> {
        self.splice(path, Edit::Remove).map(|_| ())
    }

    /// Insert `node` into the list of `path` right before it. `path` and every
    /// later sibling move up by one.
    pub fn insert_before(&mut self, path: PathId, node: NodeId) -> Result<PathId> {
        self.check(path, true)?;
        let at = self.entry(path).index.unwrap_or_default();
        self.splice(path, Edit::Insert { at, node })?
            .ok_or_else(|| Error::generate("insert produced no view"))
    }

    /// Insert `node` into the list of `path` right after it. Later siblings
    /// move up by one.
    pub fn insert_after(&mut self, path: PathId, node: NodeId) -> Result<PathId> {
        self.check(path, true)?;
        let at = self.entry(path).index.unwrap_or_default() + 1;
        self.splice(path, Edit::Insert { at, node })?
            .ok_or_else(|| Error::generate("insert produced no view"))
    }

    /// Write `node` into the single-valued `field` of the node at `path`, or
    /// empty the field when `node` is `None`.
    ///
    /// Unlike the other edits this targets a field of the wrapped node, so it
    /// also works on the root and on clauses that are absent. The view of the
    /// previous child is detached. Returns the view of the new child.
    ///
    /// Fails with [`StructuralReason::UnknownField`] if `field` is not a
    /// single-valued field of the node, or if it is required and `node` is
    /// `None`. A scope-introducing node keeps its bindings and gains the ones
    /// the new child declares.
    pub fn set_field(&mut self, path: PathId, field: &str, node: Option<NodeId>) -> Result<Option<PathId>> {
        if self.entry(path).detached {
            return Err(Error::structural(StructuralReason::Detached, self.path_string(path)));
        }
        let owner = self.entry(path).node;
        let field = match self.ast.kind(owner).field(field) {
            Some(spec) if spec.cardinality == Cardinality::Single => spec.name,
            _ => {
                return Err(Error::structural(
                    StructuralReason::UnknownField,
                    self.field_path(path, field),
                ))
            }
        };
        self.splice(path, Edit::Assign { field, node })
    }

    /// Push `node` onto the list `field` of the node at `path`. Works on the
    /// root and on empty lists. Returns the view of the new element.
    pub fn append(&mut self, path: PathId, field: &str, node: NodeId) -> Result<PathId> {
        if self.entry(path).detached {
            return Err(Error::structural(StructuralReason::Detached, self.path_string(path)));
        }
        let owner = self.entry(path).node;
        let field = match self.ast.kind(owner).field(field) {
            Some(spec) if spec.cardinality == Cardinality::List => spec.name,
            Some(_) => {
                return Err(Error::structural(
                    StructuralReason::NotInList,
                    self.field_path(path, field),
                ))
            }
            None => {
                return Err(Error::structural(
                    StructuralReason::UnknownField,
                    self.field_path(path, field),
                ))
            }
        };
        self.splice(path, Edit::Append { field, node })?
            .ok_or_else(|| Error::generate("append produced no view"))
    }

    /// Check the structural preconditions of an edit at `path` without
    /// changing anything
    pub(crate) fn check(&self, path: PathId, needs_list: bool) -> Result<()> {
        let entry = self.entry(path);
        let fail = |reason| Err(Error::structural(reason, self.path_string(path)));
        if entry.detached {
            return fail(StructuralReason::Detached);
        }
        let (Some(parent), Some(field)) = (entry.parent, entry.field) else {
            return fail(StructuralReason::RootNode);
        };
        if needs_list && entry.index.is_none() {
            return fail(StructuralReason::NotInList);
        }
        let parent_node = self.entry(parent).node;
        let Some(spec) = self.ast.kind(parent_node).field(field) else {
            return fail(StructuralReason::UnknownField);
        };
        let in_slot = match (self.ast.child(parent_node, field), entry.index) {
            (Some(ChildRef::List(list)), Some(i)) => list.get(i) == Some(&entry.node),
            (Some(ChildRef::Single(Some(id))), None) => id == entry.node,
            _ => false,
        };
        if !in_slot || (entry.index.is_some() != (spec.cardinality == Cardinality::List)) {
            return fail(StructuralReason::Detached);
        }
        Ok(())
    }

    fn splice(&mut self, path: PathId, edit: Edit) -> Result<Option<PathId>> {
        match edit {
            Edit::Assign { .. } | Edit::Append { .. } if self.entry(path).detached => {
                return Err(Error::structural(StructuralReason::Detached, self.path_string(path)));
            }
            Edit::Assign { .. } | Edit::Append { .. } => {}
            _ => self.check(path, edit.needs_list())?,
        }
        if let Some(node) = edit.written() {
            if !self.ast.is_allocated(node) {
                return Err(Error::invalid_tree(format!(
                    "node {} written at {} is not allocated",
                    node,
                    self.path_string(path)
                )));
            }
        }
        trace!("{} at {}", edit.name(), self.path_string(path));

        match edit {
            Edit::Assign { field, node } => return self.assign(path, field, node),
            Edit::Append { field, node } => return self.append_to(path, field, node).map(Some),
            _ => {}
        }

        let entry = self.entry(path).clone();
        let (Some(parent), Some(field)) = (entry.parent, entry.field) else {
            return Err(Error::structural(StructuralReason::RootNode, "<root>"));
        };
        let parent_node = self.entry(parent).node;

        let inserted = match edit {
            Edit::Replace(node) => {
                let written = match entry.index {
                    Some(i) => match self.ast.get_mut(parent_node).list_mut(field) {
                        Some(list) => {
                            list[i] = node;
                            true
                        }
                        None => false,
                    },
                    None => self.ast.get_mut(parent_node).set_single(field, node),
                };
                if !written {
                    return Err(Error::structural(
                        StructuralReason::UnknownField,
                        self.path_string(path),
                    ));
                }
                let old_children = std::mem::take(&mut self.entry_mut(path).children);
                for child in old_children {
                    self.detach(child);
                }
                let parent_scope = self.entry(parent).scope;
                let scope = self.scopes.open(&self.ast, node, Some(parent_scope));
                let e = self.entry_mut(path);
                e.node = node;
                e.scope = scope;
                e.children_valid = false;
                None
            }
            Edit::Remove => {
                let index = entry.index.unwrap_or_default();
                self.list_mut(path, parent_node, field)?.remove(index);
                self.detach(path);
                self.entry_mut(parent).children.retain(|c| *c != path);
                self.shift_siblings(parent, field, |i| i > index, |i| i - 1);
                None
            }
            Edit::Insert { at, node } => {
                self.list_mut(path, parent_node, field)?.insert(at, node);
                self.shift_siblings(parent, field, |i| i >= at, |i| i + 1);
                let parent_scope = self.entry(parent).scope;
                let scope = self.scopes.open(&self.ast, node, Some(parent_scope));
                let depth = self.entry(parent).depth + 1;
                let created = self.push_entry(node, parent, field, Some(at), scope, depth);
                self.entry_mut(parent).children.push(created);
                Some(created)
            }
            Edit::Assign { .. } | Edit::Append { .. } => None,
        };

        self.entry_mut(parent).children_valid = false;
        Ok(inserted)
    }

    fn assign(&mut self, path: PathId, field: &'static str, node: Option<NodeId>) -> Result<Option<PathId>> {
        let owner = self.entry(path).node;
        let written = match node {
            Some(id) => self.ast.get_mut(owner).set_single(field, id),
            None => self.ast.get_mut(owner).clear_single(field),
        };
        if !written {
            return Err(Error::structural(
                StructuralReason::UnknownField,
                self.field_path(path, field),
            ));
        }

        let previous: Vec<PathId> = self
            .entry(path)
            .children
            .iter()
            .copied()
            .filter(|c| self.entry(*c).field == Some(field))
            .collect();
        for child in &previous {
            self.detach(*child);
        }
        self.entry_mut(path).children.retain(|c| !previous.contains(c));

        let created = match node {
            Some(id) => {
                let (scope, depth) = (self.entry(path).scope, self.entry(path).depth);
                if self.ast.kind(owner).introduces_scope() {
                    for (name, binding) in collect_bindings(&self.ast, owner) {
                        if !self.scopes.get(scope).bindings().contains_key(&name) {
                            self.scopes.declare(scope, name, binding);
                        }
                    }
                }
                let child_scope = self.scopes.open(&self.ast, id, Some(scope));
                let created = self.push_entry(id, path, field, None, child_scope, depth + 1);
                self.entry_mut(path).children.push(created);
                Some(created)
            }
            None => None,
        };
        self.entry_mut(path).children_valid = false;
        Ok(created)
    }

    fn append_to(&mut self, path: PathId, field: &'static str, node: NodeId) -> Result<PathId> {
        let owner = self.entry(path).node;
        let list = self.list_mut(path, owner, field)?;
        list.push(node);
        let index = list.len() - 1;

        let (scope, depth) = (self.entry(path).scope, self.entry(path).depth);
        let child_scope = self.scopes.open(&self.ast, node, Some(scope));
        let created = self.push_entry(node, path, field, Some(index), child_scope, depth + 1);
        let entry = self.entry_mut(path);
        entry.children.push(created);
        entry.children_valid = false;
        Ok(created)
    }

    /// Diagnostic path of `field` below `path`
    fn field_path(&self, path: PathId, field: &str) -> String {
        match self.entry(path).parent {
            Some(_) => format!("{}.{}", self.path_string(path), field),
            None => field.to_string(),
        }
    }

    fn list_mut(
        &mut self,
        path: PathId,
        parent_node: NodeId,
        field: &str,
    ) -> Result<&mut Vec<NodeId>> {
        if !matches!(self.ast.child(parent_node, field), Some(ChildRef::List(_))) {
            return Err(Error::structural(
                StructuralReason::NotInList,
                self.path_string(path),
            ));
        }
        let field_name = field.to_string();
        self.ast
            .get_mut(parent_node)
            .list_mut(field)
            .ok_or_else(|| Error::structural(StructuralReason::NotInList, field_name))
    }

    /// Re-index the known children of `parent` in `field` whose index satisfies
    /// `affected`
    fn shift_siblings(
        &mut self,
        parent: PathId,
        field: &str,
        affected: impl Fn(usize) -> bool,
        shift: impl Fn(usize) -> usize,
    ) {
        let siblings = self.entry(parent).children.clone();
        for sibling in siblings {
            let e = self.entry_mut(sibling);
            if e.field != Some(field) {
                continue;
            }
            if let Some(i) = e.index.filter(|i| affected(*i)) {
                e.index = Some(shift(i));
                e.children_valid = false;
            }
        }
    }

    /// Mark `path` and every known view below it as detached
    fn detach(&mut self, path: PathId) {
        let mut stack = vec![path];
        while let Some(p) = stack.pop() {
            let e = self.entry_mut(p);
            e.detached = true;
            e.children_valid = false;
            stack.extend(std::mem::take(&mut e.children));
        }
    }
}
