//! Double dispatch over node kinds.
//!
//! [`dispatch`] looks at the kind of a node and calls the matching `visit_*`
//! method of a [`Visitor`]. Every method of [`Visitor`] has a default that
//! forwards to [`Visitor::visit_default`], so a visitor only overrides the kinds
//! it cares about.
//!
//! Components that must handle every kind (the
//! [`Serializer`](crate::serializer::Serializer)) implement
//! [`ExhaustiveVisitor`] instead. It has no defaults: adding a kind to the
//! catalogue is a compile error until every exhaustive visitor handles it.
//!
//! Both traits are generated from the node catalogue, so they always list the
//! same kinds as [`NodeKind`](crate::nodes::NodeKind).

use crate::arena::Ast;
use crate::nodes::*;

macro_rules! define_visitors {
    ($($variant:ident => $visit:ident { $($field:ident : $card:ident),* $(,)? }),* $(,)?) => {
        /// Per-kind handlers with a required fallback.
        pub trait Visitor {
            type Output;

            /// Called for every kind whose handler is not overridden
            fn visit_default(&mut self, ast: &Ast, id: NodeId) -> Self::Output;

            $(
                fn $visit(&mut self, ast: &Ast, id: NodeId, node: &$variant) -> Self::Output {
                    let _ = node;
                    self.visit_default(ast, id)
                }
            )*
        }

        /// Per-kind handlers with no fallback.
        pub trait ExhaustiveVisitor {
            type Output;

            $(
                fn $visit(&mut self, ast: &Ast, id: NodeId, node: &$variant) -> Self::Output;
            )*
        }

        /// Call the handler of `visitor` that matches the kind of `id`
        pub fn dispatch<V: Visitor + ?Sized>(ast: &Ast, id: NodeId, visitor: &mut V) -> V::Output {
            match ast.get(id) {
                $(Node::$variant(node) => visitor.$visit(ast, id, node),)*
            }
        }

        /// Call the handler of `visitor` that matches the kind of `id`
        pub fn dispatch_exhaustive<V: ExhaustiveVisitor + ?Sized>(
            ast: &Ast,
            id: NodeId,
            visitor: &mut V,
        ) -> V::Output {
            match ast.get(id) {
                $(Node::$variant(node) => visitor.$visit(ast, id, node),)*
            }
        }
    };
}

node_catalogue!(define_visitors);

/// Visit `root` and every descendant in pre-order, calling `visitor` on each.
///
/// Returns the outputs in visiting order.
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, root: NodeId, visitor: &mut V) -> Vec<V::Output> {
    let mut outputs = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        outputs.push(dispatch(ast, id, visitor));
        let children = ast.children(id);
        stack.extend(children.into_iter().rev());
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TableNames(Vec<String>);

    impl Visitor for TableNames {
        type Output = ();

        fn visit_default(&mut self, _ast: &Ast, _id: NodeId) {}

        fn visit_table(&mut self, _ast: &Ast, _id: NodeId, node: &Table) {
            if let Some(name) = node.name() {
                self.0.push(name.name.clone());
            }
        }
    }

    struct KindName;

    impl Visitor for KindName {
        type Output = &'static str;

        fn visit_default(&mut self, ast: &Ast, id: NodeId) -> &'static str {
            ast.kind(id).name()
        }

        fn visit_comparison(&mut self, _ast: &Ast, _id: NodeId, _node: &Comparison) -> &'static str {
            "cmp"
        }
    }

    fn table(ast: &mut Ast, name: &str) -> NodeId {
        ast.alloc(Node::Table(Table {
            path: vec![Identifier::new(name)],
            alias: None,
        }))
    }

    #[test]
    fn test_dispatch_uses_override_or_fallback() {
        let mut ast = Ast::new();
        let left = ast.alloc(Node::IntegerLiteral(IntegerLiteral { value: 1 }));
        let right = ast.alloc(Node::IntegerLiteral(IntegerLiteral { value: 2 }));
        let cmp = ast.alloc(Node::Comparison(Comparison {
            left,
            op: ComparisonOp::Lt,
            right,
        }));
        assert_eq!(dispatch(&ast, cmp, &mut KindName), "cmp");
        assert_eq!(dispatch(&ast, left, &mut KindName), "IntegerLiteral");
    }

    #[test]
    fn test_walk_is_pre_order() {
        let mut ast = Ast::new();
        let a = table(&mut ast, "a");
        let b = table(&mut ast, "b");
        let from = ast.alloc(Node::From(From { sources: vec![a, b] }));
        let star = ast.alloc(Node::Star(Star {
            table: None,
            except: vec![],
        }));
        let select = ast.alloc(Node::Select(Select {
            columns: vec![star],
            from: Some(from),
            ..Select::default()
        }));

        let mut names = TableNames(Vec::new());
        walk(&ast, select, &mut names);
        assert_eq!(names.0, vec!["a", "b"]);

        let kinds = walk(&ast, select, &mut KindName);
        assert_eq!(kinds, vec!["Select", "Star", "From", "Table", "Table"]);
    }
}
