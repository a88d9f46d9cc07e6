//! Fluent node construction.
//!
//! Builds replacement subtrees for the editing API without writing arena code
//! by hand. The helpers mirror the usual SQL builder vocabulary (`select()`,
//! `from()`, `col()`, `lit()`, ...).
//!
//! # Design
//!
//! - **Expression helpers** ([`col`], [`lit`], [`star`], [`null`], [`boolean`],
//!   [`func`], [`cast`], [`alias`], [`param`]) create leaf-level [`Expr`] values.
//! - **Query starters** ([`select`], [`from`], [`delete`], [`insert_into`],
//!   [`update`]) return fluent builder structs.
//! - **[`Expr`]** exposes operator methods (`.eq()`, `.gt()`, `.and()`,
//!   `.like()`, ...) so conditions can be written inline.
//! - Nothing touches an [`Ast`] until `.build(&mut ast)` is called. Building
//!   allocates every node of the subtree and returns the root [`NodeId`], which
//!   can then be passed to [`Document::replace`](crate::node_path::Document::replace)
//!   and friends.
//!
//! # Examples
//!
//! ```
//! use sqlpath::builder::*;
//!
//! // SELECT id, name FROM users WHERE age > 18 ORDER BY name LIMIT 10
//! let sql = select(["id", "name"])
//!     .from("users")
//!     .where_(col("age").gt(lit(18)))
//!     .order_by(["name"])
//!     .limit(10)
//!     .to_sql()
//!     .unwrap();
//! assert_eq!(sql, "SELECT id, name FROM users WHERE age > 18 ORDER BY name LIMIT 10");
//! ```

use std::fmt;

use crate::arena::Ast;
use crate::error::Result;
use crate::nodes::{
    self, Alias, Arithmetic, ArithmeticOp, Assignment, Between, BooleanLiteral, Case, Cast, Column,
    Comparison, ComparisonOp, Cte, Delete, Exists, FloatLiteral, FunctionCall, GroupBy, Having,
    Identifier, InList, InSubquery, Insert, IntegerLiteral, IsNull, Join, JoinKind, Like, Limit,
    Logical, LogicalOp, Node, NodeId, NullLiteral, OrderBy, Ordered, Parameter, Paren, Qualify,
    Select, SetOperation, SetOperator, SortDirection, Star, StringLiteral, Subquery, Table, Tuple,
    Unary, UnaryOp, Update, Values, When, Where, With,
};
use crate::serializer;

fn is_safe_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return false;
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn builder_identifier(name: &str) -> Identifier {
    if is_safe_identifier_name(name) {
        Identifier::new(name)
    } else {
        Identifier::quoted(name)
    }
}

fn builder_table(name: &str) -> Table {
    Table {
        path: name.split('.').map(builder_identifier).collect(),
        alias: None,
    }
}

// ---------------------------------------------------------------------------
// Expr
// ---------------------------------------------------------------------------

type Alloc = Box<dyn FnOnce(&mut Ast) -> NodeId>;

/// A subtree waiting to be allocated
pub struct Expr(Alloc);

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Expr(..)")
    }
}

impl Expr {
    fn new(alloc: impl FnOnce(&mut Ast) -> NodeId + 'static) -> Self {
        Expr(Box::new(alloc))
    }

    /// A single node with no children
    pub fn leaf(node: Node) -> Self {
        Expr::new(move |ast| ast.alloc(node))
    }

    /// A node already allocated in the target arena
    pub fn existing(id: NodeId) -> Self {
        Expr::new(move |_| id)
    }

    /// Allocate the subtree and return its root
    pub fn build(self, ast: &mut Ast) -> NodeId {
        (self.0)(ast)
    }

    /// Render in compact style, mostly useful in tests and docs
    pub fn to_sql(self) -> Result<String> {
        let mut ast = Ast::new();
        let id = self.build(&mut ast);
        serializer::compact(&ast, id)
    }

    fn compare(self, op: ComparisonOp, other: Expr) -> Expr {
        Expr::new(move |ast| {
            let left = self.build(ast);
            let right = other.build(ast);
            ast.alloc(Node::Comparison(Comparison { left, op, right }))
        })
    }

    fn logical(self, op: LogicalOp, other: Expr) -> Expr {
        Expr::new(move |ast| {
            let left = self.build(ast);
            let right = other.build(ast);
            ast.alloc(Node::Logical(Logical { left, op, right }))
        })
    }

    fn arithmetic(self, op: ArithmeticOp, other: Expr) -> Expr {
        Expr::new(move |ast| {
            let left = self.build(ast);
            let right = other.build(ast);
            ast.alloc(Node::Arithmetic(Arithmetic { left, op, right }))
        })
    }

    pub fn eq(self, other: Expr) -> Expr {
        self.compare(ComparisonOp::Eq, other)
    }

    pub fn neq(self, other: Expr) -> Expr {
        self.compare(ComparisonOp::NotEq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.compare(ComparisonOp::Lt, other)
    }

    pub fn lte(self, other: Expr) -> Expr {
        self.compare(ComparisonOp::LtEq, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.compare(ComparisonOp::Gt, other)
    }

    pub fn gte(self, other: Expr) -> Expr {
        self.compare(ComparisonOp::GtEq, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.logical(LogicalOp::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.logical(LogicalOp::Or, other)
    }

    pub fn not(self) -> Expr {
        not(self)
    }

    /// `-expr`
    pub fn neg(self) -> Expr {
        Expr::new(move |ast| {
            let operand = self.build(ast);
            ast.alloc(Node::Unary(Unary {
                op: UnaryOp::Neg,
                operand,
            }))
        })
    }

    pub fn add(self, other: Expr) -> Expr {
        self.arithmetic(ArithmeticOp::Add, other)
    }

    pub fn sub(self, other: Expr) -> Expr {
        self.arithmetic(ArithmeticOp::Sub, other)
    }

    pub fn mul(self, other: Expr) -> Expr {
        self.arithmetic(ArithmeticOp::Mul, other)
    }

    pub fn div(self, other: Expr) -> Expr {
        self.arithmetic(ArithmeticOp::Div, other)
    }

    /// `a || b`
    pub fn concat(self, other: Expr) -> Expr {
        self.arithmetic(ArithmeticOp::Concat, other)
    }

    pub fn is_null(self) -> Expr {
        self.null_test(false)
    }

    pub fn is_not_null(self) -> Expr {
        self.null_test(true)
    }

    fn null_test(self, negated: bool) -> Expr {
        Expr::new(move |ast| {
            let expr = self.build(ast);
            ast.alloc(Node::IsNull(IsNull { expr, negated }))
        })
    }

    pub fn in_list(self, values: impl IntoIterator<Item = Expr>) -> Expr {
        self.membership(values, false)
    }

    pub fn not_in(self, values: impl IntoIterator<Item = Expr>) -> Expr {
        self.membership(values, true)
    }

    fn membership(self, values: impl IntoIterator<Item = Expr>, negated: bool) -> Expr {
        let values: Vec<Expr> = values.into_iter().collect();
        Expr::new(move |ast| {
            let expr = self.build(ast);
            let list = build_all(values, ast);
            ast.alloc(Node::InList(InList {
                expr,
                list,
                negated,
            }))
        })
    }

    /// `self IN (query)`
    pub fn in_query(self, query: SelectBuilder) -> Expr {
        Expr::new(move |ast| {
            let expr = self.build(ast);
            let query = query.build(ast);
            ast.alloc(Node::InSubquery(InSubquery {
                expr,
                query,
                negated: false,
            }))
        })
    }

    pub fn between(self, low: Expr, high: Expr) -> Expr {
        Expr::new(move |ast| {
            let expr = self.build(ast);
            let low = low.build(ast);
            let high = high.build(ast);
            ast.alloc(Node::Between(Between {
                expr,
                low,
                high,
                negated: false,
            }))
        })
    }

    pub fn like(self, pattern: Expr) -> Expr {
        Expr::new(move |ast| {
            let expr = self.build(ast);
            let pattern = pattern.build(ast);
            ast.alloc(Node::Like(Like {
                expr,
                pattern,
                negated: false,
            }))
        })
    }

    pub fn alias(self, name: &str) -> Expr {
        alias(self, name)
    }

    pub fn cast(self, to: &str) -> Expr {
        cast(self, to)
    }

    /// Wrap in parentheses
    pub fn paren(self) -> Expr {
        Expr::new(move |ast| {
            let expr = self.build(ast);
            ast.alloc(Node::Paren(Paren { expr }))
        })
    }

    pub fn asc(self) -> Expr {
        self.ordered(Some(SortDirection::Asc))
    }

    pub fn desc(self) -> Expr {
        self.ordered(Some(SortDirection::Desc))
    }

    fn ordered(self, direction: Option<SortDirection>) -> Expr {
        Expr::new(move |ast| {
            let expr = self.build(ast);
            ast.alloc(Node::Ordered(Ordered {
                expr,
                direction,
                nulls: None,
            }))
        })
    }
}

fn build_all(exprs: Vec<Expr>, ast: &mut Ast) -> Vec<NodeId> {
    exprs.into_iter().map(|e| e.build(ast)).collect()
}

// ---------------------------------------------------------------------------
// Expression helpers
// ---------------------------------------------------------------------------

/// Column reference. A dotted name is split on the last `.` into a table
/// qualifier and the column (`"u.id"` becomes `u.id`). `"*"` and `"t.*"`
/// become stars.
pub fn col(name: &str) -> Expr {
    if name == "*" {
        return star();
    }
    let column = match name.rsplit_once('.') {
        Some((table, "*")) => {
            return Expr::leaf(Node::Star(Star {
                table: Some(builder_identifier(table)),
                except: Vec::new(),
            }))
        }
        Some((table, column)) => Column {
            table: Some(builder_identifier(table)),
            name: builder_identifier(column),
        },
        None => Column {
            table: None,
            name: builder_identifier(name),
        },
    };
    Expr::leaf(Node::Column(column))
}

/// Literal from a Rust value; see [`IntoLiteral`]
pub fn lit<V: IntoLiteral>(value: V) -> Expr {
    value.into_literal()
}

pub fn star() -> Expr {
    Expr::leaf(Node::Star(Star {
        table: None,
        except: Vec::new(),
    }))
}

pub fn null() -> Expr {
    Expr::leaf(Node::NullLiteral(NullLiteral))
}

pub fn boolean(value: bool) -> Expr {
    Expr::leaf(Node::BooleanLiteral(BooleanLiteral { value }))
}

/// Named query parameter `@name`
pub fn param(name: &str) -> Expr {
    Expr::leaf(Node::Parameter(Parameter::Named(name.to_string())))
}

/// Table reference from a dotted `project.dataset.table` name
pub fn table(name: &str) -> Expr {
    Expr::leaf(Node::Table(builder_table(name)))
}

/// Table reference with an alias
pub fn table_as(name: &str, alias_name: &str) -> Expr {
    let mut t = builder_table(name);
    t.alias = Some(builder_identifier(alias_name));
    Expr::leaf(Node::Table(t))
}

/// Function call `name(args...)`
pub fn func(name: &str, args: impl IntoIterator<Item = Expr>) -> Expr {
    let name = name.to_string();
    let args: Vec<Expr> = args.into_iter().collect();
    Expr::new(move |ast| {
        let args = build_all(args, ast);
        ast.alloc(Node::FunctionCall(FunctionCall {
            name,
            args,
            distinct: false,
        }))
    })
}

pub fn count(expr: Expr) -> Expr {
    func("COUNT", [expr])
}

pub fn count_star() -> Expr {
    func("COUNT", [star()])
}

pub fn sum(expr: Expr) -> Expr {
    func("SUM", [expr])
}

pub fn cast(expr: Expr, to: &str) -> Expr {
    let data_type = to.to_string();
    Expr::new(move |ast| {
        let expr = expr.build(ast);
        ast.alloc(Node::Cast(Cast {
            expr,
            data_type,
            safe: false,
        }))
    })
}

pub fn not(expr: Expr) -> Expr {
    Expr::new(move |ast| {
        let operand = expr.build(ast);
        ast.alloc(Node::Unary(Unary {
            op: UnaryOp::Not,
            operand,
        }))
    })
}

pub fn and(left: Expr, right: Expr) -> Expr {
    left.and(right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    left.or(right)
}

/// `expr AS name`
pub fn alias(expr: Expr, name: &str) -> Expr {
    let alias = builder_identifier(name);
    Expr::new(move |ast| {
        let expr = expr.build(ast);
        ast.alloc(Node::Alias(Alias { expr, alias }))
    })
}

/// `(query) AS alias`, usable in FROM
pub fn subquery(query: SelectBuilder, alias_name: &str) -> Expr {
    let alias = Some(builder_identifier(alias_name));
    Expr::new(move |ast| {
        let query = query.build(ast);
        ast.alloc(Node::Subquery(Subquery { query, alias }))
    })
}

/// `EXISTS (query)`
pub fn exists(query: SelectBuilder) -> Expr {
    Expr::new(move |ast| {
        let query = query.build(ast);
        ast.alloc(Node::Exists(Exists {
            query,
            negated: false,
        }))
    })
}

// ---------------------------------------------------------------------------
// Query starters
// ---------------------------------------------------------------------------

/// Start a SELECT with the given columns
pub fn select<I, E>(expressions: I) -> SelectBuilder
where
    I: IntoIterator<Item = E>,
    E: IntoExpr,
{
    SelectBuilder::new().select_cols(expressions)
}

/// Start a SELECT from a table; add columns with [`SelectBuilder::select_cols`]
pub fn from(table_name: &str) -> SelectBuilder {
    SelectBuilder::new().from(table_name)
}

pub fn delete(table_name: &str) -> DeleteBuilder {
    DeleteBuilder {
        table: table(table_name),
        where_clause: None,
    }
}

pub fn insert_into(table_name: &str) -> InsertBuilder {
    InsertBuilder {
        table: table(table_name),
        columns: Vec::new(),
        rows: Vec::new(),
        query: None,
    }
}

pub fn update(table_name: &str) -> UpdateBuilder {
    UpdateBuilder {
        table: table(table_name),
        assignments: Vec::new(),
        where_clause: None,
    }
}

pub fn case() -> CaseBuilder {
    CaseBuilder {
        operand: None,
        whens: Vec::new(),
        else_result: None,
    }
}

pub fn union(left: SelectBuilder, right: SelectBuilder) -> SetOpBuilder {
    SetOpBuilder::new(SetOperator::Union, true, left, right)
}

pub fn union_all(left: SelectBuilder, right: SelectBuilder) -> SetOpBuilder {
    SetOpBuilder::new(SetOperator::Union, false, left, right)
}

pub fn intersect(left: SelectBuilder, right: SelectBuilder) -> SetOpBuilder {
    SetOpBuilder::new(SetOperator::Intersect, true, left, right)
}

pub fn except_(left: SelectBuilder, right: SelectBuilder) -> SetOpBuilder {
    SetOpBuilder::new(SetOperator::Except, true, left, right)
}

// ---------------------------------------------------------------------------
// SelectBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a `Select` node
#[derive(Debug, Default)]
pub struct SelectBuilder {
    distinct: bool,
    ctes: Vec<(Identifier, SelectBuilder)>,
    columns: Vec<Expr>,
    sources: Vec<Expr>,
    joins: Vec<(JoinKind, Expr, Option<Expr>)>,
    where_clause: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    qualify: Option<Expr>,
    order_by: Vec<Expr>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append columns to the SELECT list
    pub fn select_cols<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoExpr,
    {
        self.columns
            .extend(expressions.into_iter().map(IntoExpr::into_expr));
        self
    }

    /// Append one column
    pub fn column(mut self, expr: impl IntoExpr) -> Self {
        self.columns.push(expr.into_expr());
        self
    }

    /// Add a table to the FROM clause
    pub fn from(mut self, table_name: &str) -> Self {
        self.sources.push(table(table_name));
        self
    }

    /// Add an arbitrary source (subquery, aliased table, ...) to the FROM clause
    pub fn from_expr(mut self, expr: Expr) -> Self {
        self.sources.push(expr);
        self
    }

    /// `WITH name AS (query)`
    pub fn with(mut self, name: &str, query: SelectBuilder) -> Self {
        self.ctes.push((builder_identifier(name), query));
        self
    }

    pub fn join(self, table_name: &str, on: Expr) -> Self {
        self.join_expr(JoinKind::Inner, table(table_name), Some(on))
    }

    pub fn left_join(self, table_name: &str, on: Expr) -> Self {
        self.join_expr(JoinKind::Left, table(table_name), Some(on))
    }

    pub fn cross_join(self, table_name: &str) -> Self {
        self.join_expr(JoinKind::Cross, table(table_name), None)
    }

    /// Join any source with an optional ON condition
    pub fn join_expr(mut self, kind: JoinKind, source: Expr, on: Option<Expr>) -> Self {
        self.joins.push((kind, source, on));
        self
    }

    /// Set the WHERE condition, replacing any earlier one
    pub fn where_(mut self, condition: Expr) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn group_by<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoExpr,
    {
        self.group_by = expressions.into_iter().map(IntoExpr::into_expr).collect();
        self
    }

    pub fn having(mut self, condition: Expr) -> Self {
        self.having = Some(condition);
        self
    }

    pub fn qualify(mut self, condition: Expr) -> Self {
        self.qualify = Some(condition);
        self
    }

    /// Set ORDER BY. Items not already wrapped with [`Expr::asc`] or
    /// [`Expr::desc`] get no explicit direction.
    pub fn order_by<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoExpr,
    {
        self.order_by = expressions.into_iter().map(IntoExpr::into_expr).collect();
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.offset = Some(count);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn union(self, other: SelectBuilder) -> SetOpBuilder {
        union(self, other)
    }

    pub fn union_all(self, other: SelectBuilder) -> SetOpBuilder {
        union_all(self, other)
    }

    /// Use this query as an expression (scalar subquery)
    pub fn into_expr(self) -> Expr {
        Expr::new(move |ast| {
            let query = self.build(ast);
            ast.alloc(Node::Subquery(Subquery { query, alias: None }))
        })
    }

    /// Allocate the query and return the `Select` node
    pub fn build(self, ast: &mut Ast) -> NodeId {
        let with = if self.ctes.is_empty() {
            None
        } else {
            let mut ctes = Vec::with_capacity(self.ctes.len());
            for (name, query) in self.ctes {
                let query = query.build(ast);
                ctes.push(ast.alloc(Node::Cte(Cte {
                    name,
                    columns: Vec::new(),
                    query,
                })));
            }
            Some(ast.alloc(Node::With(With {
                recursive: false,
                ctes,
            })))
        };

        let columns = build_all(self.columns, ast);

        let from = if self.sources.is_empty() {
            None
        } else {
            let sources = build_all(self.sources, ast);
            Some(ast.alloc(Node::From(nodes::From { sources })))
        };

        let mut joins = Vec::with_capacity(self.joins.len());
        for (kind, source, on) in self.joins {
            let source = source.build(ast);
            let condition = on.map(|c| c.build(ast));
            joins.push(ast.alloc(Node::Join(Join {
                kind,
                source,
                condition,
                using: Vec::new(),
            })));
        }

        let where_clause = self.where_clause.map(|c| {
            let condition = c.build(ast);
            ast.alloc(Node::Where(Where { condition }))
        });

        let group_by = if self.group_by.is_empty() {
            None
        } else {
            let expressions = build_all(self.group_by, ast);
            Some(ast.alloc(Node::GroupBy(GroupBy { expressions })))
        };

        let having = self.having.map(|c| {
            let condition = c.build(ast);
            ast.alloc(Node::Having(Having { condition }))
        });

        let qualify = self.qualify.map(|c| {
            let condition = c.build(ast);
            ast.alloc(Node::Qualify(Qualify { condition }))
        });

        let order_by = build_order_by(self.order_by, ast);
        let limit = build_limit(self.limit, self.offset, ast);

        ast.alloc(Node::Select(Select {
            with,
            distinct: self.distinct,
            columns,
            from,
            joins,
            where_clause,
            group_by,
            having,
            qualify,
            order_by,
            limit,
        }))
    }

    /// Build into a fresh arena and render in compact style
    pub fn to_sql(self) -> Result<String> {
        let mut ast = Ast::new();
        let id = self.build(&mut ast);
        serializer::compact(&ast, id)
    }
}

fn build_order_by(items: Vec<Expr>, ast: &mut Ast) -> Option<NodeId> {
    if items.is_empty() {
        return None;
    }
    let mut ordered = Vec::with_capacity(items.len());
    for item in items {
        let id = item.build(ast);
        if matches!(ast.get(id), Node::Ordered(_)) {
            ordered.push(id);
        } else {
            ordered.push(ast.alloc(Node::Ordered(Ordered {
                expr: id,
                direction: None,
                nulls: None,
            })));
        }
    }
    Some(ast.alloc(Node::OrderBy(OrderBy { items: ordered })))
}

fn build_limit(limit: Option<i64>, offset: Option<i64>, ast: &mut Ast) -> Option<NodeId> {
    let count = limit?;
    let count = ast.alloc(Node::IntegerLiteral(IntegerLiteral { value: count }));
    let offset = offset.map(|o| ast.alloc(Node::IntegerLiteral(IntegerLiteral { value: o })));
    Some(ast.alloc(Node::Limit(Limit { count, offset })))
}

// ---------------------------------------------------------------------------
// Set operations
// ---------------------------------------------------------------------------

/// Fluent builder for `UNION` / `INTERSECT` / `EXCEPT`
#[derive(Debug)]
pub struct SetOpBuilder {
    op: SetOperator,
    distinct: bool,
    left: SelectBuilder,
    right: SelectBuilder,
    order_by: Vec<Expr>,
    limit: Option<i64>,
}

impl SetOpBuilder {
    fn new(op: SetOperator, distinct: bool, left: SelectBuilder, right: SelectBuilder) -> Self {
        Self {
            op,
            distinct,
            left,
            right,
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn order_by<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoExpr,
    {
        self.order_by = expressions.into_iter().map(IntoExpr::into_expr).collect();
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn build(self, ast: &mut Ast) -> NodeId {
        let left = self.left.build(ast);
        let right = self.right.build(ast);
        let order_by = build_order_by(self.order_by, ast);
        let limit = build_limit(self.limit, None, ast);
        ast.alloc(Node::SetOperation(SetOperation {
            op: self.op,
            distinct: self.distinct,
            left,
            right,
            order_by,
            limit,
        }))
    }

    pub fn to_sql(self) -> Result<String> {
        let mut ast = Ast::new();
        let id = self.build(&mut ast);
        serializer::compact(&ast, id)
    }
}

// ---------------------------------------------------------------------------
// DML
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DeleteBuilder {
    table: Expr,
    where_clause: Option<Expr>,
}

impl DeleteBuilder {
    pub fn where_(mut self, condition: Expr) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn build(self, ast: &mut Ast) -> NodeId {
        let table = self.table.build(ast);
        let where_clause = self.where_clause.map(|c| {
            let condition = c.build(ast);
            ast.alloc(Node::Where(Where { condition }))
        });
        ast.alloc(Node::Delete(Delete {
            table,
            where_clause,
        }))
    }
}

#[derive(Debug)]
pub struct InsertBuilder {
    table: Expr,
    columns: Vec<Identifier>,
    rows: Vec<Vec<Expr>>,
    query: Option<SelectBuilder>,
}

impl InsertBuilder {
    pub fn columns<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.columns = names.into_iter().map(builder_identifier).collect();
        self
    }

    /// Append one row of `VALUES`
    pub fn values(mut self, row: impl IntoIterator<Item = Expr>) -> Self {
        self.rows.push(row.into_iter().collect());
        self
    }

    /// Insert the result of a query instead of literal rows
    pub fn query(mut self, query: SelectBuilder) -> Self {
        self.query = Some(query);
        self
    }

    pub fn build(self, ast: &mut Ast) -> NodeId {
        let table = self.table.build(ast);
        let source = match self.query {
            Some(query) => query.build(ast),
            None => {
                let mut rows = Vec::with_capacity(self.rows.len());
                for row in self.rows {
                    let expressions = build_all(row, ast);
                    rows.push(ast.alloc(Node::Tuple(Tuple { expressions })));
                }
                ast.alloc(Node::Values(Values { rows }))
            }
        };
        ast.alloc(Node::Insert(Insert {
            table,
            columns: self.columns,
            source,
        }))
    }
}

#[derive(Debug)]
pub struct UpdateBuilder {
    table: Expr,
    assignments: Vec<(String, Expr)>,
    where_clause: Option<Expr>,
}

impl UpdateBuilder {
    /// `SET column = value`
    pub fn set(mut self, column: &str, value: Expr) -> Self {
        self.assignments.push((column.to_string(), value));
        self
    }

    pub fn where_(mut self, condition: Expr) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn build(self, ast: &mut Ast) -> NodeId {
        let table = self.table.build(ast);
        let mut assignments = Vec::with_capacity(self.assignments.len());
        for (name, value) in self.assignments {
            let column = col(&name).build(ast);
            let value = value.build(ast);
            assignments.push(ast.alloc(Node::Assignment(Assignment { column, value })));
        }
        let where_clause = self.where_clause.map(|c| {
            let condition = c.build(ast);
            ast.alloc(Node::Where(Where { condition }))
        });
        ast.alloc(Node::Update(Update {
            table,
            assignments,
            from: None,
            where_clause,
        }))
    }
}

// ---------------------------------------------------------------------------
// CASE
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CaseBuilder {
    operand: Option<Expr>,
    whens: Vec<(Expr, Expr)>,
    else_result: Option<Expr>,
}

impl CaseBuilder {
    pub fn when(mut self, condition: Expr, result: Expr) -> Self {
        self.whens.push((condition, result));
        self
    }

    pub fn else_(mut self, result: Expr) -> Self {
        self.else_result = Some(result);
        self
    }

    pub fn build(self) -> Expr {
        Expr::new(move |ast| {
            let operand = self.operand.map(|o| o.build(ast));
            let mut whens = Vec::with_capacity(self.whens.len());
            for (condition, result) in self.whens {
                let condition = condition.build(ast);
                let result = result.build(ast);
                whens.push(ast.alloc(Node::When(When { condition, result })));
            }
            let else_result = self.else_result.map(|e| e.build(ast));
            ast.alloc(Node::Case(Case {
                operand,
                whens,
                else_result,
            }))
        })
    }
}

/// `CASE operand WHEN ... END`
pub fn case_of(operand: Expr) -> CaseBuilder {
    CaseBuilder {
        operand: Some(operand),
        whens: Vec::new(),
        else_result: None,
    }
}

// ---------------------------------------------------------------------------
// Conversion traits
// ---------------------------------------------------------------------------

/// Values usable where an expression is expected. Strings are column names.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        col(self)
    }
}

impl IntoExpr for String {
    fn into_expr(self) -> Expr {
        col(&self)
    }
}

impl IntoExpr for NodeId {
    fn into_expr(self) -> Expr {
        Expr::existing(self)
    }
}

/// Rust values that become SQL literals through [`lit`]
pub trait IntoLiteral {
    fn into_literal(self) -> Expr;
}

impl IntoLiteral for &str {
    fn into_literal(self) -> Expr {
        Expr::leaf(Node::StringLiteral(StringLiteral {
            value: self.to_string(),
        }))
    }
}

impl IntoLiteral for String {
    fn into_literal(self) -> Expr {
        Expr::leaf(Node::StringLiteral(StringLiteral { value: self }))
    }
}

impl IntoLiteral for i64 {
    fn into_literal(self) -> Expr {
        Expr::leaf(Node::IntegerLiteral(IntegerLiteral { value: self }))
    }
}

impl IntoLiteral for i32 {
    fn into_literal(self) -> Expr {
        i64::from(self).into_literal()
    }
}

impl IntoLiteral for f64 {
    fn into_literal(self) -> Expr {
        Expr::leaf(Node::FloatLiteral(FloatLiteral {
            value: self.to_string(),
        }))
    }
}

impl IntoLiteral for bool {
    fn into_literal(self) -> Expr {
        boolean(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeKind;

    #[test]
    fn test_col_splits_qualifier() {
        let mut ast = Ast::new();
        let id = col("u.id").build(&mut ast);
        match ast.get(id) {
            Node::Column(c) => {
                assert_eq!(c.table.as_ref().map(|t| t.name.as_str()), Some("u"));
                assert_eq!(c.name.name, "id");
            }
            other => panic!("expected column, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_unsafe_names_are_quoted() {
        let mut ast = Ast::new();
        let id = col("my col").build(&mut ast);
        match ast.get(id) {
            Node::Column(c) => assert!(c.name.quoted),
            other => panic!("expected column, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_table_path_is_dotted() {
        let mut ast = Ast::new();
        let id = table_as("proj.ds.orders", "o").build(&mut ast);
        match ast.get(id) {
            Node::Table(t) => {
                assert_eq!(t.path.len(), 3);
                assert_eq!(t.name().map(|n| n.name.as_str()), Some("orders"));
                assert_eq!(t.visible_name().map(|n| n.name.as_str()), Some("o"));
            }
            other => panic!("expected table, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_select_builder_shape() {
        let mut ast = Ast::new();
        let id = select(["a", "b"])
            .from("t")
            .where_(col("a").eq(lit(1)))
            .order_by([col("a").desc()])
            .limit(5)
            .build(&mut ast);
        assert_eq!(ast.kind(id), NodeKind::Select);
        let kinds: Vec<_> = ast.children(id).into_iter().map(|c| ast.kind(c)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Column,
                NodeKind::Column,
                NodeKind::From,
                NodeKind::Where,
                NodeKind::OrderBy,
                NodeKind::Limit
            ]
        );
        assert!(ast.validate(id).is_ok());
    }

    #[test]
    fn test_existing_node_is_reused() {
        let mut ast = Ast::new();
        let a = col("a").build(&mut ast);
        let before = ast.len();
        let id = select([a]).build(&mut ast);
        assert_eq!(ast.len(), before + 1);
        assert_eq!(ast.children(id), vec![a]);
    }

    #[test]
    fn test_to_sql() {
        let sql = select(["a", "b"])
            .from("t")
            .where_(col("a").eq(lit(1)).and(col("b").eq(lit(2))))
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT a, b FROM t WHERE a = 1 AND b = 2");
    }
}
