//! Collection tests
//!
//! Queries over positioned nodes and the bulk edit policy.

mod common;

use common::*;
use sqlpath::builder::{col, func, lit, select};
use sqlpath::{Collection, Document, NodeKind, PathId, SerializerConfig, StructuralReason};

// ============================================================================
// Queries
// ============================================================================

mod queries {
    use super::*;

    #[test]
    fn test_find_returns_matches_in_traversal_order() {
        let mut doc = two_predicates();
        let found = Collection::from_root(&doc).find(&mut doc, NodeKind::Comparison);
        assert_eq!(found.len(), 2);

        let config = SerializerConfig::compact();
        let rendered: Vec<_> = found
            .iter()
            .map(|p| doc.to_sql_at(p, &config).unwrap())
            .collect();
        assert_eq!(rendered, vec!["a = 1", "b = 2"]);
    }

    #[test]
    fn test_find_excludes_members_themselves() {
        let mut doc = two_predicates();
        let comparisons = Collection::from_root(&doc).find(&mut doc, NodeKind::Comparison);
        assert!(comparisons
            .find(&mut doc, NodeKind::Comparison)
            .is_empty());
        assert_eq!(comparisons.find(&mut doc, NodeKind::Column).len(), 2);
    }

    #[test]
    fn test_find_where_and_filter() {
        let mut doc = two_predicates();
        let root = Collection::from_root(&doc);
        let b_columns = root.find_where(&mut doc, NodeKind::Column, |d, p| column_name(d, p) == "b");
        assert_eq!(b_columns.len(), 2);

        let in_select_list = b_columns.filter(&doc, |d, p| d.field(p) == Some("columns"));
        assert_eq!(in_select_list.len(), 1);
        assert_eq!(doc.index(in_select_list.paths()[0]), Some(1));
    }

    #[test]
    fn test_parent_and_children_deduplicate() {
        let mut doc = document(select(["a", "b", "c"]).from("t"));
        let columns = Collection::new(select_columns(&mut doc));
        let parents = columns.parent(&doc);
        assert_eq!(parents.paths(), &[doc.root()]);

        let children = parents.children(&mut doc);
        assert_eq!(children.kinds(&doc), vec!["Column", "From"]);
        assert_eq!(children.filter_kind(&doc, NodeKind::Column), columns);
    }

    #[test]
    fn test_closest_finds_nearest_ancestor() {
        let mut doc = document(
            select(["a"])
                .from("t")
                .where_(col("a").in_query(select(["b"]).from("u"))),
        );
        let columns = Collection::from_root(&doc).find(&mut doc, NodeKind::Column);
        let selects = columns.closest(&doc, NodeKind::Select);

        // `a` (select list), `a` (IN operand) and `b` (inner select list)
        assert_eq!(columns.len(), 3);
        assert_eq!(selects.len(), 3);
        assert_eq!(selects.at(0), Some(doc.root()));
        assert_eq!(selects.at(1), Some(doc.root()));
        assert_eq!(doc.kind(selects.at(2).unwrap()), NodeKind::Select);
        assert_ne!(selects.at(2), Some(doc.root()));
        assert_eq!(selects.unique(&doc).len(), 2);
    }

    #[test]
    fn test_slicing_and_ordering() {
        let mut doc = document(select(["c", "a", "b"]).from("t"));
        let columns = Collection::new(select_columns(&mut doc));

        let sorted = columns.sort_by_key(&doc, column_name);
        let names: Vec<_> = sorted.iter().map(|p| column_name(&doc, p)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert_eq!(columns.first().len(), 1);
        assert_eq!(columns.last().at(0), columns.at(2));
        assert_eq!(columns.slice(1, None).len(), 2);
        assert_eq!(columns.slice(2, Some(10)).len(), 1);
        assert!(columns.nth(3).is_empty());
        assert_eq!(columns.reverse().at(0), columns.at(2));
        assert!(columns.every(&doc, |d, p| d.kind(p) == NodeKind::Column));
        assert!(!columns.has_kind(&doc, NodeKind::Table));
    }
}

// ============================================================================
// Bulk edits
// ============================================================================

mod bulk_edits {
    use super::*;

    fn removal_result(order: [usize; 2]) -> String {
        let mut doc = document(select(["a", "b", "c"]).from("t"));
        let columns = select_columns(&mut doc);
        let members: Vec<PathId> = order.iter().map(|i| columns[*i]).collect();
        Collection::new(members).remove(&mut doc).unwrap();
        compact_sql(&doc)
    }

    #[test]
    fn test_remove_is_order_independent() {
        assert_eq!(removal_result([1, 2]), "SELECT a FROM t");
        assert_eq!(removal_result([2, 1]), "SELECT a FROM t");
    }

    #[test]
    fn test_insert_returns_views_in_member_order() {
        let mut doc = document(select(["a", "b", "c"]).from("t"));
        let columns = select_columns(&mut doc);
        let members = Collection::new(vec![columns[0], columns[2]]);

        let inserted = members
            .insert_before(&mut doc, |doc: &mut Document, _: PathId, i: usize| {
                col(&format!("x{}", i)).build(doc.ast_mut())
            })
            .unwrap();

        assert_eq!(compact_sql(&doc), "SELECT x0, a, b, x1, c FROM t");
        assert_eq!(doc.index(inserted.paths()[0]), Some(0));
        assert_eq!(doc.index(inserted.paths()[1]), Some(3));
        assert_eq!(doc.index(columns[2]), Some(4));
    }

    #[test]
    fn test_insert_after_each_member() {
        let mut doc = document(select(["a", "b"]).from("t"));
        let columns = Collection::new(select_columns(&mut doc));
        let marker = lit(0).build(doc.ast_mut());
        let inserted = columns.insert_after(&mut doc, marker).unwrap();

        assert_eq!(compact_sql(&doc), "SELECT a, 0, b, 0 FROM t");
        assert_eq!(inserted.len(), 2);
        assert_eq!(doc.index(inserted.paths()[1]), Some(3));
    }

    #[test]
    fn test_constant_replacement_is_cloned_per_member() {
        let mut doc = two_predicates();
        let columns = Collection::from_root(&doc)
            .find(&mut doc, NodeKind::Comparison)
            .find(&mut doc, NodeKind::Column);
        let replacement = col("z").build(doc.ast_mut());
        columns.replace_with(&mut doc, replacement).unwrap();

        assert_eq!(compact_sql(&doc), "SELECT a, b FROM t WHERE z = 1 AND z = 2");
        let nodes = columns.nodes(&doc);
        assert_eq!(nodes[0], replacement);
        assert_ne!(nodes[0], nodes[1]);
        assert!(doc.ast().structurally_equal(nodes[0], nodes[1]));
    }

    #[test]
    fn test_precondition_failure_leaves_tree_untouched() {
        let mut doc = two_predicates();
        let root = doc.root();
        let first_column = select_columns(&mut doc)[0];
        let where_clause = doc.lookup_path(root, "where_clause").unwrap();

        let err = Collection::new(vec![first_column, where_clause])
            .remove(&mut doc)
            .unwrap_err();
        assert_eq!(err.structural_reason(), Some(StructuralReason::NotInList));
        assert!(!doc.is_detached(first_column));
        assert_eq!(compact_sql(&doc), "SELECT a, b FROM t WHERE a = 1 AND b = 2");
    }

    #[test]
    fn test_member_detached_mid_way_aborts() {
        let mut doc = document(select([func("f", [func("g", [lit(1)]), lit(2)])]).from("t"));
        let calls = Collection::from_root(&doc).find(&mut doc, NodeKind::FunctionCall);
        let inner_call = calls.at(1).unwrap();
        let literal = Collection::from_path(inner_call)
            .find(&mut doc, NodeKind::IntegerLiteral)
            .at(0)
            .unwrap();

        // The inner call goes first and takes the literal with it
        let err = Collection::new(vec![literal, inner_call])
            .remove(&mut doc)
            .unwrap_err();
        assert_eq!(err.structural_reason(), Some(StructuralReason::Detached));
        assert_eq!(compact_sql(&doc), "SELECT f(2) FROM t");
    }

    #[test]
    fn test_duplicate_members_are_removed_once() {
        let mut doc = document(select(["a", "b"]).from("t"));
        let columns = select_columns(&mut doc);
        Collection::new(vec![columns[1], columns[1]])
            .remove(&mut doc)
            .unwrap();
        assert_eq!(compact_sql(&doc), "SELECT a FROM t");
    }
}
