//! Positioned node tests
//!
//! Structural edits through `Document` handles: index maintenance, guards,
//! detachment and scope resolution.

mod common;

use common::*;
use sqlpath::builder::{col, lit, select, table_as};
use sqlpath::{Binding, Collection, NodeKind, StructuralReason};

// ============================================================================
// Index maintenance
// ============================================================================

mod indices {
    use super::*;

    #[test]
    fn test_insert_after_shifts_later_siblings() {
        let mut doc = document(select(["a", "b", "c"]).from("t"));
        let cols = select_columns(&mut doc);
        let (a, b, c) = (cols[0], cols[1], cols[2]);

        let x = col("x").build(doc.ast_mut());
        let inserted = doc.insert_after(b, x).unwrap();

        assert_eq!(doc.index(a), Some(0));
        assert_eq!(doc.index(b), Some(1));
        assert_eq!(doc.index(inserted), Some(2));
        assert_eq!(doc.index(c), Some(3));
        assert_eq!(compact_sql(&doc), "SELECT a, b, x, c FROM t");

        // Fresh enumeration hands back the same handles
        assert_eq!(select_columns(&mut doc), vec![a, b, inserted, c]);
    }

    #[test]
    fn test_insert_before_moves_self() {
        let mut doc = document(select(["a", "b"]).from("t"));
        let cols = select_columns(&mut doc);
        let y = col("y").build(doc.ast_mut());
        let inserted = doc.insert_before(cols[0], y).unwrap();

        assert_eq!(doc.index(inserted), Some(0));
        assert_eq!(doc.index(cols[0]), Some(1));
        assert_eq!(doc.index(cols[1]), Some(2));
        assert_eq!(compact_sql(&doc), "SELECT y, a, b FROM t");
    }

    #[test]
    fn test_remove_shifts_and_detaches() {
        let mut doc = document(select(["a", "b", "c"]).from("t"));
        let cols = select_columns(&mut doc);

        doc.remove(cols[0]).unwrap();
        assert!(doc.is_detached(cols[0]));
        assert_eq!(doc.index(cols[1]), Some(0));
        assert_eq!(doc.index(cols[2]), Some(1));
        assert_eq!(column_name(&doc, cols[2]), "c");
        assert_eq!(compact_sql(&doc), "SELECT b, c FROM t");

        let err = doc.remove(cols[0]).unwrap_err();
        assert_eq!(err.structural_reason(), Some(StructuralReason::Detached));
    }
}

// ============================================================================
// Guards
// ============================================================================

mod guards {
    use super::*;

    #[test]
    fn test_root_cannot_be_edited() {
        let mut doc = two_predicates();
        let root = doc.root();
        let replacement = col("z").build(doc.ast_mut());

        for result in [
            doc.remove(root),
            doc.replace(root, replacement),
            doc.insert_after(root, replacement).map(|_| ()),
        ] {
            assert_eq!(
                result.unwrap_err().structural_reason(),
                Some(StructuralReason::RootNode)
            );
        }
        assert_eq!(compact_sql(&doc), "SELECT a, b FROM t WHERE a = 1 AND b = 2");
    }

    #[test]
    fn test_single_slot_rejects_list_edits() {
        let mut doc = two_predicates();
        let root = doc.root();
        let where_clause = doc.lookup_path(root, "where_clause").unwrap();
        assert_eq!(doc.index(where_clause), None);

        let extra = col("z").build(doc.ast_mut());
        let err = doc.insert_before(where_clause, extra).unwrap_err();
        assert_eq!(err.structural_reason(), Some(StructuralReason::NotInList));
        let err = doc.remove(where_clause).unwrap_err();
        assert_eq!(err.structural_reason(), Some(StructuralReason::NotInList));
        assert!(!doc.is_detached(where_clause));
    }

    #[test]
    fn test_edit_below_replaced_ancestor_is_detached() {
        let mut doc = two_predicates();
        let root = doc.root();
        let condition = doc.lookup_path(root, "where_clause.condition").unwrap();
        let inner = doc.lookup_path(condition, "left.right").unwrap();
        assert_eq!(doc.kind(inner), NodeKind::IntegerLiteral);

        let replacement = col("ok").is_not_null().build(doc.ast_mut());
        doc.replace(condition, replacement).unwrap();
        assert!(doc.is_detached(inner));

        let other = lit(7).build(doc.ast_mut());
        let err = doc.replace(inner, other).unwrap_err();
        assert_eq!(err.structural_reason(), Some(StructuralReason::Detached));
        assert_eq!(compact_sql(&doc), "SELECT a, b FROM t WHERE ok IS NOT NULL");
    }
}

// ============================================================================
// Replacement and cache coherence
// ============================================================================

mod replacement {
    use super::*;

    #[test]
    fn test_double_replace_through_one_handle() {
        let mut doc = two_predicates();
        let root = doc.root();
        let condition = doc.lookup_path(root, "where_clause.condition").unwrap();

        let first = col("x").eq(lit(1)).build(doc.ast_mut());
        doc.replace(condition, first).unwrap();
        let second = col("y").eq(lit(2)).build(doc.ast_mut());
        doc.replace(condition, second).unwrap();

        assert_eq!(doc.node_id(condition), second);
        assert_eq!(compact_sql(&doc), "SELECT a, b FROM t WHERE y = 2");
    }

    #[test]
    fn test_children_reflect_replacement() {
        let mut doc = document(select(["a", "b"]).from("t"));
        let before = select_columns(&mut doc);

        let replacement = col("z").build(doc.ast_mut());
        doc.replace(before[1], replacement).unwrap();

        let after = select_columns(&mut doc);
        assert_eq!(after, before);
        assert_eq!(doc.node_id(after[1]), replacement);
        assert_eq!(column_name(&doc, after[1]), "z");
    }

    #[test]
    fn test_diagnostic_paths() {
        let mut doc = two_predicates();
        let found = Collection::from_root(&doc).find(&mut doc, NodeKind::Comparison);
        let second = found.at(1).unwrap();

        assert_eq!(doc.path_string(second), "where_clause.condition.right");
        assert_eq!(doc.depth(second), 3);
        assert_eq!(doc.path_root(second), doc.root());
        assert_eq!(doc.lookup_path(doc.root(), "where_clause.condition.right"), Some(second));
        assert_eq!(doc.lookup_path(doc.root(), "columns[5]"), None);
    }
}

// ============================================================================
// Scopes
// ============================================================================

mod scopes {
    use super::*;

    #[test]
    fn test_nested_query_resolves_outwards() {
        let mut doc = document(
            select(["o.id"])
                .with("recent", select(["id"]).from("raw"))
                .from_expr(table_as("orders", "o"))
                .where_(col("o.id").in_query(select(["id"]).from("recent"))),
        );
        let root = doc.root();
        let selects = Collection::from_root(&doc).find(&mut doc, NodeKind::Select);
        assert_eq!(selects.len(), 2);
        let (cte_query, in_query) = (selects.paths()[0], selects.paths()[1]);

        assert!(doc.scopes().is_root(doc.scope_of(root)));
        assert!(matches!(doc.lookup(root, "recent"), Some(Binding::Cte(_))));

        // Inside the IN subquery `recent` is its own FROM table
        let inner_column = Collection::from_path(in_query)
            .find(&mut doc, NodeKind::Column)
            .at(0)
            .unwrap();
        assert!(matches!(doc.lookup(inner_column, "recent"), Some(Binding::Table(_))));

        let orders = doc.lookup_path(root, "from.sources[0]").unwrap();
        assert_eq!(
            doc.lookup(inner_column, "o"),
            Some(&Binding::Table(doc.node_id(orders)))
        );

        assert!(matches!(doc.lookup(cte_query, "raw"), Some(Binding::Table(_))));
        assert_eq!(doc.lookup(root, "raw"), None);
    }

    #[test]
    fn test_declared_binding_is_visible_below() {
        let mut doc = two_predicates();
        let root = doc.root();
        doc.declare(root, "threshold", Binding::External("param".into()));

        let literal = doc.lookup_path(root, "where_clause.condition.left.right").unwrap();
        assert_eq!(
            doc.lookup(literal, "threshold"),
            Some(&Binding::External("param".into()))
        );
        assert_eq!(doc.scope_of(literal), doc.scope_of(root));
    }
}
