//! SQL text generation.
//!
//! [`Serializer`] renders a tree as BigQuery Standard SQL. It implements
//! [`ExhaustiveVisitor`], so every node kind must have a handler here. Each
//! handler writes its own keywords and punctuation and renders its children in a
//! fixed, kind-specific order (SELECT list, then FROM, then WHERE, ...).
//!
//! # Formatting
//!
//! [`SerializerConfig`] controls the output:
//!
//! | Option | Effect |
//! |---|---|
//! | `indent_unit` | Text inserted once per nesting level in expanded style |
//! | `uppercase_keywords` | `SELECT` vs `select` |
//! | `quote_identifiers` | Backtick identifiers that are reserved words or contain non-identifier characters |
//! | `format_style` | `compact` joins clauses and list items with single spaces and `, `; `expanded` puts each clause keyword on its own line and indents its body |
//!
//! Identifiers marked [`quoted`](crate::nodes::Identifier::quoted) are always
//! backticked.
//!
//! ```
//! use sqlpath::builder::*;
//! use sqlpath::serializer::{pretty, compact};
//! use sqlpath::Ast;
//!
//! let mut ast = Ast::new();
//! let root = select(["a", "b"]).from("t").where_(col("a").eq(lit(1))).build(&mut ast);
//!
//! assert_eq!(compact(&ast, root).unwrap(), "SELECT a, b FROM t WHERE a = 1");
//! assert_eq!(
//!     pretty(&ast, root).unwrap(),
//!     "SELECT\n  a,\n  b\nFROM\n  t\nWHERE\n  a = 1"
//! );
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::arena::Ast;
use crate::error::{Error, Result};
use crate::nodes::*;
use crate::visitor::{dispatch_exhaustive, ExhaustiveVisitor};

/// BigQuery reserved keywords; identifiers spelled like these must be quoted
static RESERVED_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "ALL", "AND", "ANY", "ARRAY", "AS", "ASC", "ASSERT_ROWS_MODIFIED", "AT", "BETWEEN", "BY",
        "CASE", "CAST", "COLLATE", "CONTAINS", "CREATE", "CROSS", "CUBE", "CURRENT", "DEFAULT",
        "DEFINE", "DESC", "DISTINCT", "ELSE", "END", "ENUM", "ESCAPE", "EXCEPT", "EXCLUDE",
        "EXISTS", "EXTRACT", "FALSE", "FETCH", "FOLLOWING", "FOR", "FROM", "FULL", "GROUP",
        "GROUPING", "GROUPS", "HASH", "HAVING", "IF", "IGNORE", "IN", "INNER", "INTERSECT",
        "INTERVAL", "INTO", "IS", "JOIN", "LATERAL", "LEFT", "LIKE", "LIMIT", "LOOKUP", "MERGE",
        "NATURAL", "NEW", "NO", "NOT", "NULL", "NULLS", "OF", "ON", "OR", "ORDER", "OUTER", "OVER",
        "PARTITION", "PRECEDING", "PROTO", "QUALIFY", "RANGE", "RECURSIVE", "RESPECT", "RIGHT",
        "ROLLUP", "ROWS", "SELECT", "SET", "SOME", "STRUCT", "TABLESAMPLE", "THEN", "TO", "TREAT",
        "TRUE", "UNBOUNDED", "UNION", "UNNEST", "USING", "WHEN", "WHERE", "WINDOW", "WITH",
        "WITHIN",
    ]
    .into_iter()
    .collect()
});

/// Returns `true` if `name` is a reserved keyword (case-insensitive)
pub fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(name.to_ascii_uppercase().as_str())
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Layout of the generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatStyle {
    /// Single line, clauses and list items separated by single spaces
    Compact,
    /// One clause keyword per line, bodies indented
    #[default]
    Expanded,
}

/// Serializer options.
///
/// Deserializing rejects unknown option names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerializerConfig {
    pub indent_unit: String,
    pub uppercase_keywords: bool,
    pub quote_identifiers: bool,
    pub format_style: FormatStyle,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            indent_unit: "  ".to_string(),
            uppercase_keywords: true,
            quote_identifiers: true,
            format_style: FormatStyle::Expanded,
        }
    }
}

impl SerializerConfig {
    /// The expanded configuration used by [`pretty`]
    pub fn pretty() -> Self {
        Self::default()
    }

    /// The single-line configuration used by [`compact`]
    pub fn compact() -> Self {
        Self {
            format_style: FormatStyle::Compact,
            ..Self::default()
        }
    }

    /// Parse options from JSON. Missing options take their defaults; unknown
    /// options are an error.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SerializerConfig =
            serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check option values
    pub fn validate(&self) -> Result<()> {
        if !self.indent_unit.chars().all(|c| c == ' ' || c == '\t') {
            return Err(Error::config(format!(
                "indent_unit must be spaces or tabs, got {:?}",
                self.indent_unit
            )));
        }
        Ok(())
    }

    pub fn with_indent_unit(mut self, indent: impl Into<String>) -> Self {
        self.indent_unit = indent.into();
        self
    }

    pub fn with_uppercase_keywords(mut self, uppercase: bool) -> Self {
        self.uppercase_keywords = uppercase;
        self
    }

    pub fn with_quote_identifiers(mut self, quote: bool) -> Self {
        self.quote_identifiers = quote;
        self
    }

    pub fn with_format_style(mut self, style: FormatStyle) -> Self {
        self.format_style = style;
        self
    }
}

/// Render the tree at `root` with the expanded configuration
pub fn pretty(ast: &Ast, root: NodeId) -> Result<String> {
    Serializer::new(SerializerConfig::pretty()).serialize(ast, root)
}

/// Render the tree at `root` on a single line
pub fn compact(ast: &Ast, root: NodeId) -> Result<String> {
    Serializer::new(SerializerConfig::compact()).serialize(ast, root)
}

/// Render the tree at `root` with `config`
pub fn serialize(ast: &Ast, root: NodeId, config: &SerializerConfig) -> Result<String> {
    Serializer::new(config.clone()).serialize(ast, root)
}

// Binding strength of expression nodes, loosest first. Anything not listed
// (literals, columns, calls, parenthesized forms) is an atom.
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_COMPARISON: u8 = 4;
const PREC_ADDITIVE: u8 = 5;
const PREC_MULTIPLICATIVE: u8 = 6;
const PREC_PREFIX: u8 = 7;
const PREC_ATOM: u8 = u8::MAX;

fn precedence(node: &Node) -> u8 {
    match node {
        Node::Logical(l) => match l.op {
            LogicalOp::Or => PREC_OR,
            LogicalOp::And => PREC_AND,
        },
        Node::Unary(u) => match u.op {
            UnaryOp::Not => PREC_NOT,
            UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => PREC_PREFIX,
        },
        Node::Comparison(_)
        | Node::Between(_)
        | Node::InList(_)
        | Node::InSubquery(_)
        | Node::IsNull(_)
        | Node::Like(_) => PREC_COMPARISON,
        Node::Arithmetic(a) => match a.op {
            ArithmeticOp::Add | ArithmeticOp::Sub => PREC_ADDITIVE,
            ArithmeticOp::Mul | ArithmeticOp::Div | ArithmeticOp::Concat => PREC_MULTIPLICATIVE,
        },
        _ => PREC_ATOM,
    }
}

/// Visitor that writes SQL text into a buffer
#[derive(Debug, Clone)]
pub struct Serializer {
    config: SerializerConfig,
    buf: String,
    depth: usize,
}

impl Serializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self {
            config,
            buf: String::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Render the tree at `root`. The buffer and depth are reset first, so a
    /// serializer can be reused.
    pub fn serialize(&mut self, ast: &Ast, root: NodeId) -> Result<String> {
        ast.validate(root)?;
        self.buf.clear();
        self.depth = 0;
        self.visit(ast, root)?;
        Ok(std::mem::take(&mut self.buf))
    }

    fn visit(&mut self, ast: &Ast, id: NodeId) -> Result<()> {
        dispatch_exhaustive(ast, id, self)
    }

    fn expanded(&self) -> bool {
        self.config.format_style == FormatStyle::Expanded
    }

    // -- Writing primitives -------------------------------------------------

    fn write(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    fn space(&mut self) {
        self.buf.push(' ');
    }

    fn keyword(&mut self, keyword: &str) {
        if self.config.uppercase_keywords {
            self.buf.push_str(keyword);
        } else {
            self.buf.push_str(&keyword.to_ascii_lowercase());
        }
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        for _ in 0..self.depth {
            self.buf.push_str(&self.config.indent_unit);
        }
    }

    /// Separator between two clauses of the same statement
    fn clause_break(&mut self) {
        if self.expanded() {
            self.newline();
        } else {
            self.space();
        }
    }

    fn identifier(&mut self, ident: &Identifier) {
        let needs_quotes = ident.quoted
            || (self.config.quote_identifiers
                && (!is_plain_identifier(&ident.name) || is_reserved_keyword(&ident.name)));
        if needs_quotes {
            self.buf.push('`');
            self.buf.push_str(&ident.name.replace('`', "\\`"));
            self.buf.push('`');
        } else {
            self.buf.push_str(&ident.name);
        }
    }

    fn identifier_list(&mut self, idents: &[Identifier]) {
        for (i, ident) in idents.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.identifier(ident);
        }
    }

    fn string_literal(&mut self, value: &str) {
        self.buf.push('\'');
        for c in value.chars() {
            match c {
                '\\' => self.buf.push_str("\\\\"),
                '\'' => self.buf.push_str("\\'"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                c => self.buf.push(c),
            }
        }
        self.buf.push('\'');
    }

    // -- Composite helpers --------------------------------------------------

    /// Items joined with `, ` on the current line
    fn inline_list(&mut self, ast: &Ast, ids: &[NodeId]) -> Result<()> {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.visit(ast, *id)?;
        }
        Ok(())
    }

    /// Clause body holding one node
    fn body(&mut self, ast: &Ast, id: NodeId) -> Result<()> {
        self.body_list(ast, &[id])
    }

    /// Clause body holding a list: one item per indented line when expanded
    fn body_list(&mut self, ast: &Ast, ids: &[NodeId]) -> Result<()> {
        if !self.expanded() {
            self.space();
            return self.inline_list(ast, ids);
        }
        self.depth += 1;
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.write(",");
            }
            self.newline();
            self.visit(ast, *id)?;
        }
        self.depth -= 1;
        Ok(())
    }

    /// Write an operand, parenthesized when it binds looser than `min`
    fn operand(&mut self, ast: &Ast, id: NodeId, min: u8) -> Result<()> {
        if precedence(ast.get(id)) >= min {
            return self.visit(ast, id);
        }
        self.write("(");
        self.visit(ast, id)?;
        self.write(")");
        Ok(())
    }

    fn binary(&mut self, ast: &Ast, left: (NodeId, u8), op: &str, right: (NodeId, u8)) -> Result<()> {
        self.operand(ast, left.0, left.1)?;
        self.space();
        self.write(op);
        self.space();
        self.operand(ast, right.0, right.1)
    }

    /// `(query)`, with the query on its own indented lines when expanded
    fn paren_query(&mut self, ast: &Ast, query: NodeId) -> Result<()> {
        self.write("(");
        if self.expanded() {
            self.depth += 1;
            self.newline();
            self.visit(ast, query)?;
            self.depth -= 1;
            self.newline();
        } else {
            self.visit(ast, query)?;
        }
        self.write(")");
        Ok(())
    }

    fn keyword_clause(&mut self, ast: &Ast, keyword: &str, ids: &[NodeId]) -> Result<()> {
        if ids.is_empty() {
            return Err(Error::generate(format!("{} clause has no items", keyword)));
        }
        self.keyword(keyword);
        self.body_list(ast, ids)
    }

    fn trailing_clauses(&mut self, ast: &Ast, clauses: &[Option<NodeId>]) -> Result<()> {
        for clause in clauses.iter().flatten() {
            self.clause_break();
            self.visit(ast, *clause)?;
        }
        Ok(())
    }

    fn alias_suffix(&mut self, alias: &Option<Identifier>) {
        if let Some(alias) = alias {
            self.space();
            self.keyword("AS");
            self.space();
            self.identifier(alias);
        }
    }

    fn negation(&mut self, negated: bool) {
        if negated {
            self.keyword("NOT");
            self.space();
        }
    }
}

impl ExhaustiveVisitor for Serializer {
    type Output = Result<()>;

    // -- Leaves -------------------------------------------------------------

    fn visit_string_literal(&mut self, _ast: &Ast, _id: NodeId, node: &StringLiteral) -> Result<()> {
        self.string_literal(&node.value);
        Ok(())
    }

    fn visit_integer_literal(&mut self, _ast: &Ast, _id: NodeId, node: &IntegerLiteral) -> Result<()> {
        self.write(&node.value.to_string());
        Ok(())
    }

    fn visit_float_literal(&mut self, _ast: &Ast, _id: NodeId, node: &FloatLiteral) -> Result<()> {
        self.write(&node.value);
        Ok(())
    }

    fn visit_boolean_literal(&mut self, _ast: &Ast, _id: NodeId, node: &BooleanLiteral) -> Result<()> {
        self.keyword(if node.value { "TRUE" } else { "FALSE" });
        Ok(())
    }

    fn visit_null_literal(&mut self, _ast: &Ast, _id: NodeId, _node: &NullLiteral) -> Result<()> {
        self.keyword("NULL");
        Ok(())
    }

    fn visit_typed_literal(&mut self, _ast: &Ast, _id: NodeId, node: &TypedLiteral) -> Result<()> {
        self.keyword(&node.data_type.to_ascii_uppercase());
        self.space();
        self.string_literal(&node.value);
        Ok(())
    }

    fn visit_parameter(&mut self, _ast: &Ast, _id: NodeId, node: &Parameter) -> Result<()> {
        match node {
            Parameter::Named(name) => {
                self.write("@");
                self.write(name);
            }
            Parameter::Positional => self.write("?"),
        }
        Ok(())
    }

    fn visit_column(&mut self, _ast: &Ast, _id: NodeId, node: &Column) -> Result<()> {
        if let Some(table) = &node.table {
            self.identifier(table);
            self.write(".");
        }
        self.identifier(&node.name);
        Ok(())
    }

    fn visit_star(&mut self, _ast: &Ast, _id: NodeId, node: &Star) -> Result<()> {
        if let Some(table) = &node.table {
            self.identifier(table);
            self.write(".");
        }
        self.write("*");
        if !node.except.is_empty() {
            self.space();
            self.keyword("EXCEPT");
            self.write(" (");
            self.identifier_list(&node.except);
            self.write(")");
        }
        Ok(())
    }

    fn visit_table(&mut self, _ast: &Ast, _id: NodeId, node: &Table) -> Result<()> {
        if node.path.is_empty() {
            return Err(Error::generate("table reference has an empty path"));
        }
        for (i, part) in node.path.iter().enumerate() {
            if i > 0 {
                self.write(".");
            }
            self.identifier(part);
        }
        self.alias_suffix(&node.alias);
        Ok(())
    }

    // -- Compound literals --------------------------------------------------

    fn visit_interval(&mut self, ast: &Ast, _id: NodeId, node: &Interval) -> Result<()> {
        self.keyword("INTERVAL");
        self.space();
        self.visit(ast, node.value)?;
        self.space();
        self.keyword(&node.unit.to_ascii_uppercase());
        Ok(())
    }

    fn visit_array(&mut self, ast: &Ast, _id: NodeId, node: &Array) -> Result<()> {
        self.write("[");
        self.inline_list(ast, &node.elements)?;
        self.write("]");
        Ok(())
    }

    fn visit_struct(&mut self, ast: &Ast, _id: NodeId, node: &Struct) -> Result<()> {
        self.keyword("STRUCT");
        self.write("(");
        self.inline_list(ast, &node.fields)?;
        self.write(")");
        Ok(())
    }

    // -- Operators ----------------------------------------------------------

    fn visit_comparison(&mut self, ast: &Ast, _id: NodeId, node: &Comparison) -> Result<()> {
        // Comparisons do not chain
        let min = PREC_COMPARISON + 1;
        self.binary(ast, (node.left, min), node.op.symbol(), (node.right, min))
    }

    fn visit_logical(&mut self, ast: &Ast, id: NodeId, node: &Logical) -> Result<()> {
        let op = if self.config.uppercase_keywords {
            node.op.keyword().to_string()
        } else {
            node.op.keyword().to_ascii_lowercase()
        };
        // Left-associative: a right operand at the same level keeps its parens
        let level = precedence(ast.get(id));
        self.binary(ast, (node.left, level), &op, (node.right, level + 1))
    }

    fn visit_arithmetic(&mut self, ast: &Ast, id: NodeId, node: &Arithmetic) -> Result<()> {
        let level = precedence(ast.get(id));
        self.binary(ast, (node.left, level), node.op.symbol(), (node.right, level + 1))
    }

    fn visit_unary(&mut self, ast: &Ast, id: NodeId, node: &Unary) -> Result<()> {
        match node.op {
            UnaryOp::Not => {
                self.keyword("NOT");
                self.space();
            }
            UnaryOp::Neg => self.write("-"),
            UnaryOp::Plus => self.write("+"),
            UnaryOp::BitNot => self.write("~"),
        }
        let start = self.buf.len();
        self.operand(ast, node.operand, precedence(ast.get(id)))?;
        // `--` would open a line comment
        if node.op == UnaryOp::Neg && self.buf[start..].starts_with('-') {
            self.buf.insert(start, ' ');
        }
        Ok(())
    }

    fn visit_between(&mut self, ast: &Ast, _id: NodeId, node: &Between) -> Result<()> {
        self.operand(ast, node.expr, PREC_COMPARISON + 1)?;
        self.space();
        self.negation(node.negated);
        self.keyword("BETWEEN");
        self.space();
        self.operand(ast, node.low, PREC_COMPARISON + 1)?;
        self.space();
        self.keyword("AND");
        self.space();
        self.operand(ast, node.high, PREC_COMPARISON + 1)
    }

    fn visit_in_list(&mut self, ast: &Ast, _id: NodeId, node: &InList) -> Result<()> {
        if node.list.is_empty() {
            return Err(Error::generate("IN list is empty"));
        }
        self.operand(ast, node.expr, PREC_COMPARISON + 1)?;
        self.space();
        self.negation(node.negated);
        self.keyword("IN");
        self.write(" (");
        self.inline_list(ast, &node.list)?;
        self.write(")");
        Ok(())
    }

    fn visit_in_subquery(&mut self, ast: &Ast, _id: NodeId, node: &InSubquery) -> Result<()> {
        self.operand(ast, node.expr, PREC_COMPARISON + 1)?;
        self.space();
        self.negation(node.negated);
        self.keyword("IN");
        self.space();
        self.paren_query(ast, node.query)
    }

    fn visit_is_null(&mut self, ast: &Ast, _id: NodeId, node: &IsNull) -> Result<()> {
        self.operand(ast, node.expr, PREC_COMPARISON + 1)?;
        self.space();
        self.keyword("IS");
        self.space();
        self.negation(node.negated);
        self.keyword("NULL");
        Ok(())
    }

    fn visit_like(&mut self, ast: &Ast, _id: NodeId, node: &Like) -> Result<()> {
        self.operand(ast, node.expr, PREC_COMPARISON + 1)?;
        self.space();
        self.negation(node.negated);
        self.keyword("LIKE");
        self.space();
        self.operand(ast, node.pattern, PREC_COMPARISON + 1)
    }

    fn visit_exists(&mut self, ast: &Ast, _id: NodeId, node: &Exists) -> Result<()> {
        self.negation(node.negated);
        self.keyword("EXISTS");
        self.space();
        self.paren_query(ast, node.query)
    }

    fn visit_paren(&mut self, ast: &Ast, _id: NodeId, node: &Paren) -> Result<()> {
        self.write("(");
        self.visit(ast, node.expr)?;
        self.write(")");
        Ok(())
    }

    fn visit_cast(&mut self, ast: &Ast, _id: NodeId, node: &Cast) -> Result<()> {
        self.keyword(if node.safe { "SAFE_CAST" } else { "CAST" });
        self.write("(");
        self.visit(ast, node.expr)?;
        self.space();
        self.keyword("AS");
        self.space();
        self.write(&node.data_type);
        self.write(")");
        Ok(())
    }

    fn visit_case(&mut self, ast: &Ast, _id: NodeId, node: &Case) -> Result<()> {
        if node.whens.is_empty() {
            return Err(Error::generate("CASE has no WHEN branches"));
        }
        self.keyword("CASE");
        if let Some(operand) = node.operand {
            self.space();
            self.visit(ast, operand)?;
        }
        for when in &node.whens {
            self.space();
            self.visit(ast, *when)?;
        }
        if let Some(else_result) = node.else_result {
            self.space();
            self.keyword("ELSE");
            self.space();
            self.visit(ast, else_result)?;
        }
        self.space();
        self.keyword("END");
        Ok(())
    }

    fn visit_when(&mut self, ast: &Ast, _id: NodeId, node: &When) -> Result<()> {
        self.keyword("WHEN");
        self.space();
        self.visit(ast, node.condition)?;
        self.space();
        self.keyword("THEN");
        self.space();
        self.visit(ast, node.result)
    }

    fn visit_alias(&mut self, ast: &Ast, _id: NodeId, node: &Alias) -> Result<()> {
        self.visit(ast, node.expr)?;
        self.space();
        self.keyword("AS");
        self.space();
        self.identifier(&node.alias);
        Ok(())
    }

    // -- Functions ----------------------------------------------------------

    fn visit_function_call(&mut self, ast: &Ast, _id: NodeId, node: &FunctionCall) -> Result<()> {
        self.write(&node.name);
        self.write("(");
        if node.distinct {
            self.keyword("DISTINCT");
            self.space();
        }
        self.inline_list(ast, &node.args)?;
        self.write(")");
        Ok(())
    }

    fn visit_window_function(&mut self, ast: &Ast, _id: NodeId, node: &WindowFunction) -> Result<()> {
        self.visit(ast, node.function)?;
        self.space();
        self.keyword("OVER");
        self.write(" (");
        self.visit(ast, node.window)?;
        self.write(")");
        Ok(())
    }

    fn visit_window_spec(&mut self, ast: &Ast, _id: NodeId, node: &WindowSpec) -> Result<()> {
        let mut first = true;
        let mut separate = |s: &mut Self| {
            if !std::mem::take(&mut first) {
                s.space();
            }
        };
        if let Some(name) = &node.name {
            separate(self);
            self.identifier(name);
        }
        if !node.partition_by.is_empty() {
            separate(self);
            self.keyword("PARTITION BY");
            self.space();
            self.inline_list(ast, &node.partition_by)?;
        }
        if !node.order_by.is_empty() {
            separate(self);
            self.keyword("ORDER BY");
            self.space();
            self.inline_list(ast, &node.order_by)?;
        }
        if let Some(frame) = &node.frame {
            separate(self);
            self.write(frame);
        }
        Ok(())
    }

    // -- Queries ------------------------------------------------------------

    fn visit_select(&mut self, ast: &Ast, _id: NodeId, node: &Select) -> Result<()> {
        if node.columns.is_empty() {
            return Err(Error::generate("SELECT has no columns"));
        }
        if let Some(with) = node.with {
            self.visit(ast, with)?;
            self.clause_break();
        }
        self.keyword("SELECT");
        if node.distinct {
            self.space();
            self.keyword("DISTINCT");
        }
        self.body_list(ast, &node.columns)?;
        self.trailing_clauses(ast, &[node.from])?;
        for join in &node.joins {
            self.clause_break();
            self.visit(ast, *join)?;
        }
        self.trailing_clauses(
            ast,
            &[
                node.where_clause,
                node.group_by,
                node.having,
                node.qualify,
                node.order_by,
                node.limit,
            ],
        )
    }

    fn visit_set_operation(&mut self, ast: &Ast, _id: NodeId, node: &SetOperation) -> Result<()> {
        self.visit(ast, node.left)?;
        self.clause_break();
        self.keyword(match node.op {
            SetOperator::Union => "UNION",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Except => "EXCEPT",
        });
        self.space();
        self.keyword(if node.distinct { "DISTINCT" } else { "ALL" });
        self.clause_break();
        if ast.kind(node.right) == NodeKind::SetOperation {
            self.paren_query(ast, node.right)?;
        } else {
            self.visit(ast, node.right)?;
        }
        self.trailing_clauses(ast, &[node.order_by, node.limit])
    }

    fn visit_with(&mut self, ast: &Ast, _id: NodeId, node: &With) -> Result<()> {
        if node.ctes.is_empty() {
            return Err(Error::generate("WITH clause has no CTEs"));
        }
        self.keyword("WITH");
        if node.recursive {
            self.space();
            self.keyword("RECURSIVE");
        }
        self.body_list(ast, &node.ctes)
    }

    fn visit_cte(&mut self, ast: &Ast, _id: NodeId, node: &Cte) -> Result<()> {
        self.identifier(&node.name);
        if !node.columns.is_empty() {
            self.write(" (");
            self.identifier_list(&node.columns);
            self.write(")");
        }
        self.space();
        self.keyword("AS");
        self.space();
        self.paren_query(ast, node.query)
    }

    fn visit_subquery(&mut self, ast: &Ast, _id: NodeId, node: &Subquery) -> Result<()> {
        self.paren_query(ast, node.query)?;
        self.alias_suffix(&node.alias);
        Ok(())
    }

    // -- Clauses ------------------------------------------------------------

    fn visit_from(&mut self, ast: &Ast, _id: NodeId, node: &From) -> Result<()> {
        self.keyword_clause(ast, "FROM", &node.sources)
    }

    fn visit_join(&mut self, ast: &Ast, _id: NodeId, node: &Join) -> Result<()> {
        self.keyword(node.kind.keyword());
        self.space();
        self.visit(ast, node.source)?;
        if let Some(condition) = node.condition {
            self.space();
            self.keyword("ON");
            self.space();
            self.visit(ast, condition)?;
        }
        if !node.using.is_empty() {
            self.space();
            self.keyword("USING");
            self.write(" (");
            self.identifier_list(&node.using);
            self.write(")");
        }
        Ok(())
    }

    fn visit_table_function(&mut self, ast: &Ast, _id: NodeId, node: &TableFunction) -> Result<()> {
        self.write(&node.name);
        self.write("(");
        self.inline_list(ast, &node.args)?;
        self.write(")");
        self.alias_suffix(&node.alias);
        Ok(())
    }

    fn visit_where(&mut self, ast: &Ast, _id: NodeId, node: &Where) -> Result<()> {
        self.keyword("WHERE");
        self.body(ast, node.condition)
    }

    fn visit_group_by(&mut self, ast: &Ast, _id: NodeId, node: &GroupBy) -> Result<()> {
        self.keyword_clause(ast, "GROUP BY", &node.expressions)
    }

    fn visit_having(&mut self, ast: &Ast, _id: NodeId, node: &Having) -> Result<()> {
        self.keyword("HAVING");
        self.body(ast, node.condition)
    }

    fn visit_qualify(&mut self, ast: &Ast, _id: NodeId, node: &Qualify) -> Result<()> {
        self.keyword("QUALIFY");
        self.body(ast, node.condition)
    }

    fn visit_order_by(&mut self, ast: &Ast, _id: NodeId, node: &OrderBy) -> Result<()> {
        self.keyword_clause(ast, "ORDER BY", &node.items)
    }

    fn visit_ordered(&mut self, ast: &Ast, _id: NodeId, node: &Ordered) -> Result<()> {
        self.visit(ast, node.expr)?;
        match node.direction {
            Some(SortDirection::Asc) => {
                self.space();
                self.keyword("ASC");
            }
            Some(SortDirection::Desc) => {
                self.space();
                self.keyword("DESC");
            }
            None => {}
        }
        match node.nulls {
            Some(NullsOrder::First) => {
                self.space();
                self.keyword("NULLS FIRST");
            }
            Some(NullsOrder::Last) => {
                self.space();
                self.keyword("NULLS LAST");
            }
            None => {}
        }
        Ok(())
    }

    fn visit_limit(&mut self, ast: &Ast, _id: NodeId, node: &Limit) -> Result<()> {
        self.keyword("LIMIT");
        self.space();
        self.visit(ast, node.count)?;
        if let Some(offset) = node.offset {
            self.space();
            self.keyword("OFFSET");
            self.space();
            self.visit(ast, offset)?;
        }
        Ok(())
    }

    // -- Statements ---------------------------------------------------------

    fn visit_insert(&mut self, ast: &Ast, _id: NodeId, node: &Insert) -> Result<()> {
        self.keyword("INSERT INTO");
        self.space();
        self.visit(ast, node.table)?;
        if !node.columns.is_empty() {
            self.write(" (");
            self.identifier_list(&node.columns);
            self.write(")");
        }
        self.clause_break();
        self.visit(ast, node.source)
    }

    fn visit_values(&mut self, ast: &Ast, _id: NodeId, node: &Values) -> Result<()> {
        self.keyword_clause(ast, "VALUES", &node.rows)
    }

    fn visit_tuple(&mut self, ast: &Ast, _id: NodeId, node: &Tuple) -> Result<()> {
        if node.expressions.is_empty() {
            return Err(Error::generate("row has no values"));
        }
        self.write("(");
        self.inline_list(ast, &node.expressions)?;
        self.write(")");
        Ok(())
    }

    fn visit_update(&mut self, ast: &Ast, _id: NodeId, node: &Update) -> Result<()> {
        self.keyword("UPDATE");
        self.space();
        self.visit(ast, node.table)?;
        self.clause_break();
        self.keyword_clause(ast, "SET", &node.assignments)?;
        self.trailing_clauses(ast, &[node.from, node.where_clause])
    }

    fn visit_assignment(&mut self, ast: &Ast, _id: NodeId, node: &Assignment) -> Result<()> {
        self.visit(ast, node.column)?;
        self.write(" = ");
        self.visit(ast, node.value)
    }

    fn visit_delete(&mut self, ast: &Ast, _id: NodeId, node: &Delete) -> Result<()> {
        self.keyword("DELETE FROM");
        self.space();
        self.visit(ast, node.table)?;
        self.trailing_clauses(ast, &[node.where_clause])
    }

    fn visit_merge(&mut self, ast: &Ast, _id: NodeId, node: &Merge) -> Result<()> {
        self.keyword("MERGE INTO");
        self.space();
        self.visit(ast, node.target)?;
        self.clause_break();
        self.keyword("USING");
        self.space();
        self.visit(ast, node.source)?;
        self.clause_break();
        self.keyword("ON");
        self.space();
        self.visit(ast, node.on)?;
        for when in &node.whens {
            self.clause_break();
            self.visit(ast, *when)?;
        }
        Ok(())
    }

    fn visit_merge_when(&mut self, ast: &Ast, _id: NodeId, node: &MergeWhen) -> Result<()> {
        self.keyword(match node.matched {
            MergeMatch::Matched => "WHEN MATCHED",
            MergeMatch::NotMatchedByTarget => "WHEN NOT MATCHED",
            MergeMatch::NotMatchedBySource => "WHEN NOT MATCHED BY SOURCE",
        });
        if let Some(condition) = node.condition {
            self.space();
            self.keyword("AND");
            self.space();
            self.visit(ast, condition)?;
        }
        self.space();
        self.keyword("THEN");
        self.space();
        self.visit(ast, node.action)
    }

    fn visit_merge_insert(&mut self, ast: &Ast, _id: NodeId, node: &MergeInsert) -> Result<()> {
        self.keyword("INSERT");
        if !node.columns.is_empty() {
            self.write(" (");
            self.identifier_list(&node.columns);
            self.write(")");
        }
        self.space();
        match node.values {
            Some(values) => {
                self.keyword("VALUES");
                self.space();
                self.visit(ast, values)
            }
            None => {
                self.keyword("ROW");
                Ok(())
            }
        }
    }

    fn visit_merge_update(&mut self, ast: &Ast, _id: NodeId, node: &MergeUpdate) -> Result<()> {
        if node.assignments.is_empty() {
            return Err(Error::generate("UPDATE SET has no assignments"));
        }
        self.keyword("UPDATE SET");
        self.space();
        self.inline_list(ast, &node.assignments)
    }

    fn visit_merge_delete(&mut self, _ast: &Ast, _id: NodeId, _node: &MergeDelete) -> Result<()> {
        self.keyword("DELETE");
        Ok(())
    }

    fn visit_create_table(&mut self, ast: &Ast, _id: NodeId, node: &CreateTable) -> Result<()> {
        if node.columns.is_empty() && node.query.is_none() {
            return Err(Error::generate("CREATE TABLE needs columns or a query"));
        }
        self.keyword("CREATE");
        if node.or_replace {
            self.space();
            self.keyword("OR REPLACE");
        }
        self.space();
        self.keyword("TABLE");
        if node.if_not_exists {
            self.space();
            self.keyword("IF NOT EXISTS");
        }
        self.space();
        self.visit(ast, node.table)?;
        if !node.columns.is_empty() {
            self.write(" (");
            if self.expanded() {
                self.depth += 1;
                for (i, column) in node.columns.iter().enumerate() {
                    if i > 0 {
                        self.write(",");
                    }
                    self.newline();
                    self.visit(ast, *column)?;
                }
                self.depth -= 1;
                self.newline();
            } else {
                self.inline_list(ast, &node.columns)?;
            }
            self.write(")");
        }
        if let Some(query) = node.query {
            self.space();
            self.keyword("AS");
            self.clause_break();
            self.visit(ast, query)?;
        }
        Ok(())
    }

    fn visit_column_def(&mut self, _ast: &Ast, _id: NodeId, node: &ColumnDef) -> Result<()> {
        self.identifier(&node.name);
        self.space();
        self.write(&node.data_type);
        if node.not_null {
            self.space();
            self.keyword("NOT NULL");
        }
        Ok(())
    }

    fn visit_drop_table(&mut self, ast: &Ast, _id: NodeId, node: &DropTable) -> Result<()> {
        self.keyword("DROP TABLE");
        if node.if_exists {
            self.space();
            self.keyword("IF EXISTS");
        }
        self.space();
        self.visit(ast, node.table)
    }

    fn visit_script(&mut self, ast: &Ast, _id: NodeId, node: &Script) -> Result<()> {
        for (i, statement) in node.statements.iter().enumerate() {
            if i > 0 {
                self.write(";");
                if self.expanded() {
                    self.write("\n\n");
                } else {
                    self.space();
                }
            }
            self.visit(ast, *statement)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    fn render(expr: Expr, config: SerializerConfig) -> String {
        let mut ast = Ast::new();
        let id = expr.build(&mut ast);
        serialize(&ast, id, &config).unwrap()
    }

    #[test]
    fn test_identifier_quoting() {
        let config = SerializerConfig::compact();
        assert_eq!(render(col("select"), config.clone()), "`select`");
        assert_eq!(render(col("order_id"), config.clone()), "order_id");
        assert_eq!(render(col("my col"), config.clone()), "`my col`");
        assert_eq!(render(table("my-project.ds.t"), config.clone()), "`my-project`.ds.t");

        let unquoted = config.with_quote_identifiers(false);
        assert_eq!(render(col("select"), unquoted), "select");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(
            render(lit("it's\\"), SerializerConfig::compact()),
            "'it\\'s\\\\'"
        );
    }

    #[test]
    fn test_lowercase_keywords() {
        let config = SerializerConfig::compact().with_uppercase_keywords(false);
        let sql = render(
            col("a").is_not_null().and(col("b").between(lit(1), lit(2))),
            config,
        );
        assert_eq!(sql, "a is not null and b between 1 and 2");
    }

    #[test]
    fn test_operands_keep_their_grouping() {
        let compact = SerializerConfig::compact;
        let or_then_and = col("a").eq(lit(1)).or(col("b").eq(lit(2))).and(col("c").eq(lit(3)));
        assert_eq!(render(or_then_and, compact()), "(a = 1 OR b = 2) AND c = 3");

        let and_then_or = col("a").eq(lit(1)).and(col("b").eq(lit(2))).or(col("c").eq(lit(3)));
        assert_eq!(render(and_then_or, compact()), "a = 1 AND b = 2 OR c = 3");

        assert_eq!(render(col("a").add(lit(1)).mul(col("b")), compact()), "(a + 1) * b");
        assert_eq!(render(col("a").mul(col("b")).add(lit(1)), compact()), "a * b + 1");
        assert_eq!(render(col("a").sub(col("b").sub(col("c"))), compact()), "a - (b - c)");
        assert_eq!(render(col("a").add(col("b")).gt(lit(2)), compact()), "a + b > 2");
        assert_eq!(
            render(not(col("a").is_null().and(col("b").is_null())), compact()),
            "NOT (a IS NULL AND b IS NULL)"
        );
        assert_eq!(render(not(col("a").eq(lit(1))), compact()), "NOT a = 1");
    }

    #[test]
    fn test_negation_never_emits_a_comment() {
        let compact = SerializerConfig::compact;
        assert_eq!(render(lit(-5).neg(), compact()), "- -5");
        assert_eq!(render(col("x").neg().neg(), compact()), "- -x");
        assert_eq!(render(col("x").add(lit(1)).neg(), compact()), "-(x + 1)");
        assert_eq!(render(col("x").neg(), compact()), "-x");
    }

    #[test]
    fn test_case_and_cast() {
        let expr = case()
            .when(col("x").gt(lit(0)), lit("positive"))
            .else_(lit("other"))
            .build()
            .cast("STRING");
        assert_eq!(
            render(expr, SerializerConfig::compact()),
            "CAST(CASE WHEN x > 0 THEN 'positive' ELSE 'other' END AS STRING)"
        );
    }

    #[test]
    fn test_subquery_indentation() {
        let mut ast = Ast::new();
        let root = select(["id"])
            .from_expr(subquery(select(["id"]).from("t"), "d"))
            .build(&mut ast);
        assert_eq!(
            pretty(&ast, root).unwrap(),
            "SELECT\n  id\nFROM\n  (\n    SELECT\n      id\n    FROM\n      t\n  ) AS d"
        );
        assert_eq!(
            compact(&ast, root).unwrap(),
            "SELECT id FROM (SELECT id FROM t) AS d"
        );
    }

    #[test]
    fn test_empty_select_is_a_generate_error() {
        let mut ast = Ast::new();
        let root = ast.alloc(Node::Select(Select::default()));
        assert!(matches!(compact(&ast, root), Err(Error::Generate(_))));
    }

    #[test]
    fn test_config_rejects_unknown_options() {
        let err = SerializerConfig::from_json(r#"{"max_line_length": 80}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = SerializerConfig::from_json(r#"{"format_style": "compact"}"#).unwrap();
        assert_eq!(config, SerializerConfig::compact());

        assert!(SerializerConfig::from_json(r#"{"indent_unit": "--"}"#).is_err());
    }

    #[test]
    fn test_serializer_is_reusable() {
        let mut ast = Ast::new();
        let a = select(["a"]).from("t").build(&mut ast);
        let b = select(["b"]).from("u").build(&mut ast);
        let mut serializer = Serializer::new(SerializerConfig::compact());
        assert_eq!(serializer.serialize(&ast, a).unwrap(), "SELECT a FROM t");
        assert_eq!(serializer.serialize(&ast, b).unwrap(), "SELECT b FROM u");
    }
}
