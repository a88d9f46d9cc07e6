//! Ready-made codemods and convenience getters.
//!
//! Mutations go through a [`Document`] so every edit keeps the positioned views
//! consistent; they return how much they changed. Functions that target one
//! SELECT take the handle of a `Select` view and fail with
//! [`Error::InvalidTree`] for any other kind.
//!
//! Clauses a SELECT does not have yet (a missing WHERE, an empty SELECT list)
//! are written with [`Document::set_field`] and [`Document::append`], so these
//! codemods work on the document root as well as on nested queries.

use std::collections::HashMap;

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::node_path::{Document, PathId};
use crate::nodes::{Column, Identifier, Logical, LogicalOp, Node, NodeId, NodeKind, Select, Table, Where};

fn select_payload(doc: &Document, select: PathId) -> Result<Select> {
    match doc.node(select) {
        Node::Select(s) => Ok(s.clone()),
        other => Err(Error::invalid_tree(format!(
            "expected Select at {}, found {}",
            doc.path_string(select),
            other.kind()
        ))),
    }
}

/// Child views of `select` stored in `field`
fn field_children(doc: &mut Document, select: PathId, field: &str) -> Collection {
    Collection::new(doc.children(select)).filter(doc, |d, p| d.field(p) == Some(field))
}

// ---------------------------------------------------------------------------
// SELECT clause
// ---------------------------------------------------------------------------

/// Append `columns` to the SELECT list. Returns the new column views.
pub fn add_select_columns(doc: &mut Document, select: PathId, columns: Vec<NodeId>) -> Result<Collection> {
    select_payload(doc, select)?;
    let mut added = Vec::with_capacity(columns.len());
    for column in columns {
        added.push(doc.append(select, "columns", column)?);
    }
    Ok(Collection::new(added))
}

/// Remove SELECT-list entries for which `predicate` holds. Returns the number
/// removed.
pub fn remove_select_columns<F>(doc: &mut Document, select: PathId, mut predicate: F) -> Result<usize>
where
    F: FnMut(&Document, PathId) -> bool,
{
    select_payload(doc, select)?;
    let doomed = field_children(doc, select, "columns").filter(doc, |d, p| predicate(d, p));
    doomed.remove(doc)?;
    Ok(doomed.len())
}

/// Set or clear the DISTINCT flag
pub fn set_distinct(doc: &mut Document, select: PathId, distinct: bool) -> Result<()> {
    select_payload(doc, select)?;
    let id = doc.node_id(select);
    if let Node::Select(s) = doc.ast_mut().get_mut(id) {
        s.distinct = distinct;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// WHERE clause
// ---------------------------------------------------------------------------

/// Add `condition` to the WHERE clause.
///
/// An existing condition is combined with the new one using AND, or OR when
/// `use_or` is set. Without a WHERE clause one is created.
pub fn add_where(doc: &mut Document, select: PathId, condition: NodeId, use_or: bool) -> Result<()> {
    let payload = select_payload(doc, select)?;
    if payload.where_clause.is_none() {
        let where_clause = doc.ast_mut().alloc(Node::Where(Where { condition }));
        doc.set_field(select, "where_clause", Some(where_clause))?;
        return Ok(());
    }

    let existing = Collection::from_path(select)
        .lookup_path(doc, "where_clause.condition")
        .at(0)
        .ok_or_else(|| Error::invalid_tree("WHERE clause without a condition"))?;
    let left = doc.node_id(existing);
    let op = if use_or { LogicalOp::Or } else { LogicalOp::And };
    let combined = doc.ast_mut().alloc(Node::Logical(Logical {
        left,
        op,
        right: condition,
    }));
    doc.replace(existing, combined)
}

/// Drop the WHERE clause. Returns `false` if there was none.
pub fn remove_where(doc: &mut Document, select: PathId) -> Result<bool> {
    if select_payload(doc, select)?.where_clause.is_none() {
        return Ok(false);
    }
    doc.set_field(select, "where_clause", None)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Renaming
// ---------------------------------------------------------------------------

/// Rename tables by their last path segment. Aliases are kept. Returns the
/// number of table references rewritten.
pub fn rename_tables(doc: &mut Document, mapping: &HashMap<String, String>) -> Result<usize> {
    let tables = Collection::from_root(doc).find(doc, NodeKind::Table);
    let mut targets = Vec::new();
    let mut renamed: Vec<Table> = Vec::new();
    for member in tables.iter() {
        let Node::Table(table) = doc.node(member) else {
            continue;
        };
        let Some(new_name) = table.name().and_then(|n| mapping.get(&n.name)) else {
            continue;
        };
        let mut table = table.clone();
        if let Some(last) = table.path.last_mut() {
            *last = Identifier::new(new_name.as_str());
        }
        targets.push(member);
        renamed.push(table);
    }

    let targets = Collection::new(targets);
    targets.replace_with(doc, |doc: &mut Document, _: PathId, position: usize| {
        doc.ast_mut().alloc(Node::Table(renamed[position].clone()))
    })?;
    Ok(targets.len())
}

/// Rename column references (not aliases). Returns the number rewritten.
pub fn rename_columns(doc: &mut Document, mapping: &HashMap<String, String>) -> Result<usize> {
    rewrite_columns(doc, |column| match mapping.get(&column.name.name) {
        Some(renamed) => {
            column.name = Identifier::new(renamed.as_str());
            true
        }
        None => false,
    })
}

/// Qualify every unqualified column reference with `table`. Returns the number
/// rewritten.
pub fn qualify_columns(doc: &mut Document, table: &str) -> Result<usize> {
    rewrite_columns(doc, |column| {
        if column.table.is_some() {
            return false;
        }
        column.table = Some(Identifier::new(table));
        true
    })
}

/// Replace each column for which `rewrite` changed a copy
fn rewrite_columns<F>(doc: &mut Document, mut rewrite: F) -> Result<usize>
where
    F: FnMut(&mut Column) -> bool,
{
    let columns = Collection::from_root(doc).find(doc, NodeKind::Column);
    let mut rewritten = Vec::new();
    for member in columns.iter() {
        if let Node::Column(c) = doc.node(member) {
            let mut column = c.clone();
            if rewrite(&mut column) {
                rewritten.push((member, column));
            }
        }
    }
    let count = rewritten.len();
    for (member, column) in rewritten {
        let id = doc.ast_mut().alloc(Node::Column(column));
        doc.replace(member, id)?;
    }
    Ok(count)
}

// ---------------------------------------------------------------------------
// Getters
// ---------------------------------------------------------------------------

/// Column names referenced anywhere in the document, in pre-order
pub fn get_column_names(doc: &mut Document) -> Vec<String> {
    let columns = Collection::from_root(doc).find(doc, NodeKind::Column);
    columns
        .iter()
        .filter_map(|p| match doc.node(p) {
            Node::Column(c) => Some(c.name.name.clone()),
            _ => None,
        })
        .collect()
}

/// Table names (last path segment) referenced anywhere, in pre-order
pub fn get_table_names(doc: &mut Document) -> Vec<String> {
    let tables = Collection::from_root(doc).find(doc, NodeKind::Table);
    tables
        .iter()
        .filter_map(|p| match doc.node(p) {
            Node::Table(t) => t.name().map(|n| n.name.clone()),
            _ => None,
        })
        .collect()
}

/// Number of nodes reachable from the document root
pub fn node_count(doc: &mut Document) -> usize {
    let root = doc.root();
    doc.walk(root).len()
}
