//! Serializer tests
//!
//! Output layout per configuration, statement coverage, configuration parsing
//! and idempotence across the JSON interchange format.

mod common;

use common::*;
use sqlpath::builder::{
    case, col, count_star, delete, func, insert_into, lit, not, param, select, table, union_all,
    update,
};
use sqlpath::{add_where, pretty, remove_where, Ast, Document, Error, FormatStyle, SerializerConfig};

fn compact_of(build: impl FnOnce(&mut Ast) -> sqlpath::NodeId) -> String {
    let mut ast = Ast::new();
    let root = build(&mut ast);
    sqlpath::compact(&ast, root).unwrap()
}

// ============================================================================
// Layout
// ============================================================================

mod layout {
    use super::*;

    #[test]
    fn test_compact_select() {
        let doc = two_predicates();
        assert_eq!(compact_sql(&doc), "SELECT a, b FROM t WHERE a = 1 AND b = 2");
    }

    #[test]
    fn test_expanded_select() {
        let doc = two_predicates();
        let sql = doc.to_sql(&SerializerConfig::default()).unwrap();
        assert_eq!(sql, "SELECT\n  a,\n  b\nFROM\n  t\nWHERE\n  a = 1 AND b = 2");
    }

    #[test]
    fn test_custom_indent_and_lowercase() {
        let doc = two_predicates();
        let config = SerializerConfig::default()
            .with_indent_unit("\t")
            .with_uppercase_keywords(false);
        let sql = doc.to_sql(&config).unwrap();
        assert_eq!(sql, "select\n\ta,\n\tb\nfrom\n\tt\nwhere\n\ta = 1 and b = 2");
    }

    #[test]
    fn test_full_select_clause_order() {
        let sql = compact_of(|ast| {
            select([col("dept"), count_star().alias("n")])
                .with("staff", select(["*"]).from("proj.hr.employees"))
                .from("staff")
                .left_join("depts", col("staff.dept").eq(col("depts.id")))
                .where_(col("active").eq(lit(true)))
                .group_by(["dept"])
                .having(count_star().gt(lit(5)))
                .order_by([col("n").desc()])
                .limit(10)
                .offset(20)
                .build(ast)
        });
        assert_eq!(
            sql,
            "WITH staff AS (SELECT * FROM proj.hr.employees) \
             SELECT dept, COUNT(*) AS n FROM staff \
             LEFT JOIN depts ON staff.dept = depts.id \
             WHERE active = TRUE GROUP BY dept HAVING COUNT(*) > 5 \
             ORDER BY n DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_set_operation_and_case() {
        let sql = compact_of(|ast| {
            union_all(
                select([case()
                    .when(col("x").is_null(), lit("none"))
                    .else_(col("x"))
                    .build()
                    .alias("label")])
                .from("a"),
                select(["label"]).from("b"),
            )
            .build(ast)
        });
        assert_eq!(
            sql,
            "SELECT CASE WHEN x IS NULL THEN 'none' ELSE x END AS label FROM a \
             UNION ALL SELECT label FROM b"
        );
    }
}

// ============================================================================
// Statements
// ============================================================================

mod statements {
    use super::*;

    #[test]
    fn test_insert_values() {
        let sql = compact_of(|ast| {
            insert_into("ds.events")
                .columns(["id", "kind"])
                .values([lit(1), lit("click")])
                .values([lit(2), param("kind")])
                .build(ast)
        });
        assert_eq!(
            sql,
            "INSERT INTO ds.events (id, kind) VALUES (1, 'click'), (2, @kind)"
        );
    }

    #[test]
    fn test_update_and_delete() {
        let updated = compact_of(|ast| {
            update("accounts")
                .set("balance", col("balance").sub(lit(10)))
                .where_(col("id").eq(lit(7)))
                .build(ast)
        });
        assert_eq!(updated, "UPDATE accounts SET balance = balance - 10 WHERE id = 7");

        let deleted = compact_of(|ast| delete("logs").where_(col("day").lt(lit("2024-01-01"))).build(ast));
        assert_eq!(deleted, "DELETE FROM logs WHERE day < '2024-01-01'");
    }

    #[test]
    fn test_reserved_identifiers_are_quoted() {
        let sql = compact_of(|ast| {
            select([col("group"), func("UPPER", [col("from")])])
                .from_expr(table("my-project.ds.order"))
                .build(ast)
        });
        assert_eq!(
            sql,
            "SELECT `group`, UPPER(`from`) FROM `my-project`.ds.`order`"
        );
    }
}

// ============================================================================
// Operator precedence
// ============================================================================

mod precedence {
    use super::*;

    #[test]
    fn test_looser_operand_is_parenthesized() {
        let sql = compact_of(|ast| {
            select([col("price").add(col("tax")).mul(col("qty")).alias("total")])
                .from("orders")
                .where_(not(col("a").eq(lit(1)).or(col("b").eq(lit(2)))))
                .build(ast)
        });
        assert_eq!(
            sql,
            "SELECT (price + tax) * qty AS total FROM orders WHERE NOT (a = 1 OR b = 2)"
        );
    }

    #[test]
    fn test_added_condition_does_not_regroup() {
        let mut doc = document(
            select(["a"])
                .from("t")
                .where_(col("a").eq(lit(1)).or(col("b").eq(lit(2)))),
        );
        let root = doc.root();
        let condition = col("c").eq(lit(3)).build(doc.ast_mut());
        add_where(&mut doc, root, condition, false).unwrap();
        assert_eq!(
            compact_sql(&doc),
            "SELECT a FROM t WHERE (a = 1 OR b = 2) AND c = 3"
        );

        assert!(remove_where(&mut doc, root).unwrap());
        assert_eq!(compact_sql(&doc), "SELECT a FROM t");
    }

    #[test]
    fn test_double_negation_keeps_rest_of_statement() {
        let sql = compact_of(|ast| {
            select([lit(-5).neg().alias("n")])
                .from("t")
                .where_(col("x").eq(lit(1)))
                .build(ast)
        });
        assert_eq!(sql, "SELECT - -5 AS n FROM t WHERE x = 1");
        assert!(!sql.contains("--"));
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let config = SerializerConfig::from_json(r#"{"uppercase_keywords": false}"#).unwrap();
        assert!(!config.uppercase_keywords);
        assert_eq!(config.indent_unit, "  ");
        assert_eq!(config.format_style, FormatStyle::Expanded);
        assert!(config.quote_identifiers);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = SerializerConfig::from_json(r#"{"indent": 4}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_invalid_indent_is_rejected() {
        let err = SerializerConfig::from_json(r#"{"indent_unit": "ab"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

// ============================================================================
// Interchange
// ============================================================================

mod interchange {
    use super::*;

    #[test]
    fn test_json_round_trip_is_idempotent() {
        let doc = two_predicates();
        let json = doc.to_json().unwrap();
        let reloaded = Document::from_json(&json).unwrap();

        assert_eq!(compact_sql(&reloaded), compact_sql(&doc));
        assert_eq!(reloaded.to_json().unwrap(), json);
    }

    #[test]
    fn test_edited_document_round_trips() {
        let mut doc = two_predicates();
        let columns = select_columns(&mut doc);
        doc.remove(columns[0]).unwrap();

        let reloaded = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(compact_sql(&reloaded), "SELECT b FROM t WHERE a = 1 AND b = 2");
        let (ast, root) = reloaded.into_ast();
        assert_eq!(
            pretty(&ast, root).unwrap(),
            doc.to_sql(&SerializerConfig::pretty()).unwrap()
        );
    }

    #[test]
    fn test_dangling_handle_is_rejected() {
        let json = r#"{"root": 0, "nodes": [{"paren": {"expr": 5}}]}"#;
        assert!(matches!(
            Document::from_json(json),
            Err(Error::InvalidTree(_))
        ));
    }
}
