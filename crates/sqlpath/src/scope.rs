//! Lexical name-resolution scopes.
//!
//! Scopes form a parent-linked chain stored in a [`ScopeArena`] and addressed by
//! [`ScopeId`]. Each positioned node in a [`Document`](crate::node_path::Document)
//! carries the scope active at its position. Kinds for which
//! [`NodeKind::introduces_scope`](crate::nodes::NodeKind::introduces_scope)
//! is true open a child scope whose parent is the enclosing one. Every other
//! node shares its parent's scope.
//!
//! When a scope is opened for a node, the names that node introduces are
//! declared in it (see [`collect_bindings`]).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::arena::Ast;
use crate::nodes::{Alias, Cte, Node, NodeId, Select};
use crate::visitor::{dispatch, Visitor};

/// Handle of a scope inside a [`ScopeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a name in a scope refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// A CTE of the enclosing WITH clause
    Cte(NodeId),
    /// A base table in FROM or JOIN, by alias or table name
    Table(NodeId),
    /// An aliased subquery in FROM or JOIN
    DerivedTable(NodeId),
    /// An aliased table-valued function such as `UNNEST(x) AS y`
    TableFunction(NodeId),
    /// An alias in the SELECT list
    ColumnAlias(NodeId),
    /// A column of a CTE's explicit column list; the handle is the CTE
    CteColumn(NodeId),
    /// Caller-declared binding with no node behind it
    External(String),
}

impl Binding {
    /// The node the binding points at, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Binding::Cte(id)
            | Binding::Table(id)
            | Binding::DerivedTable(id)
            | Binding::TableFunction(id)
            | Binding::ColumnAlias(id)
            | Binding::CteColumn(id) => Some(*id),
            Binding::External(_) => None,
        }
    }
}

/// One lexical level: an optional parent and the names declared at this level
#[derive(Debug, Clone, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    bindings: HashMap<String, Binding>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Returns `true` for the global scope
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Bindings declared at this level only
    pub fn bindings(&self) -> &HashMap<String, Binding> {
        &self.bindings
    }
}

/// Storage for every scope of one edit session
#[derive(Debug, Clone, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope with no parent
    pub fn root(&mut self) -> ScopeId {
        self.push(None)
    }

    /// Create a scope whose lookups fall back to `parent`
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        self.push(Some(parent))
    }

    fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            bindings: HashMap::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Add `name` to the level `scope` only. A later declaration of the same
    /// name at the same level wins.
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>, binding: Binding) {
        self.scopes[scope.index()]
            .bindings
            .insert(name.into(), binding);
    }

    /// Resolve `name` starting at `scope` and walking outwards
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let level = self.get(id);
            if let Some(binding) = level.bindings.get(name) {
                return Some(binding);
            }
            current = level.parent;
        }
        None
    }

    pub fn is_root(&self, scope: ScopeId) -> bool {
        self.get(scope).is_root()
    }

    /// `scope` followed by each enclosing scope up to the root
    pub fn chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut current = self.get(scope).parent;
        while let Some(id) = current {
            chain.push(id);
            current = self.get(id).parent;
        }
        chain
    }

    /// Open the scope for the node `id`.
    ///
    /// Returns `parent` unchanged when `id` does not introduce a scope.
    /// `parent` of `None` means `id` is a document root: it gets a fresh root
    /// scope, holding its own bindings if it is scope-introducing.
    pub(crate) fn open(&mut self, ast: &Ast, id: NodeId, parent: Option<ScopeId>) -> ScopeId {
        let scope = match parent {
            None => self.root(),
            Some(parent) if ast.kind(id).introduces_scope() => self.child(parent),
            Some(parent) => return parent,
        };
        for (name, binding) in collect_bindings(ast, id) {
            self.declare(scope, name, binding);
        }
        scope
    }
}

/// Names the node `id` introduces into the scope it opens, in declaration order
pub fn collect_bindings(ast: &Ast, id: NodeId) -> Vec<(String, Binding)> {
    if !ast.kind(id).introduces_scope() {
        return Vec::new();
    }
    dispatch(ast, id, &mut BindingCollector)
}

struct BindingCollector;

impl BindingCollector {
    fn source(ast: &Ast, id: NodeId) -> Option<(String, Binding)> {
        match ast.get(id) {
            Node::Table(table) => table
                .visible_name()
                .map(|name| (name.name.clone(), Binding::Table(id))),
            Node::Subquery(sub) => sub
                .alias
                .as_ref()
                .map(|alias| (alias.name.clone(), Binding::DerivedTable(id))),
            Node::TableFunction(func) => func
                .alias
                .as_ref()
                .map(|alias| (alias.name.clone(), Binding::TableFunction(id))),
            Node::Join(join) => Self::source(ast, join.source),
            _ => None,
        }
    }
}

impl Visitor for BindingCollector {
    type Output = Vec<(String, Binding)>;

    fn visit_default(&mut self, _ast: &Ast, _id: NodeId) -> Self::Output {
        Vec::new()
    }

    fn visit_select(&mut self, ast: &Ast, _id: NodeId, node: &Select) -> Self::Output {
        let mut out = Vec::new();

        if let Some(Node::With(with)) = node.with.map(|w| ast.get(w)) {
            for cte in &with.ctes {
                if let Node::Cte(c) = ast.get(*cte) {
                    out.push((c.name.name.clone(), Binding::Cte(*cte)));
                }
            }
        }

        if let Some(Node::From(from)) = node.from.map(|f| ast.get(f)) {
            out.extend(from.sources.iter().filter_map(|s| Self::source(ast, *s)));
        }
        out.extend(node.joins.iter().filter_map(|j| Self::source(ast, *j)));

        for column in &node.columns {
            if let Node::Alias(Alias { alias, .. }) = ast.get(*column) {
                out.push((alias.name.clone(), Binding::ColumnAlias(*column)));
            }
        }
        out
    }

    fn visit_cte(&mut self, _ast: &Ast, id: NodeId, node: &Cte) -> Self::Output {
        node.columns
            .iter()
            .map(|c| (c.name.clone(), Binding::CteColumn(id)))
            .collect()
    }
}
