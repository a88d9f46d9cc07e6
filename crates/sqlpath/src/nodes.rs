//! SQL syntax tree node model.
//!
//! This module defines every node kind the engine can position, edit and render.
//! The dialect family is BigQuery Standard SQL.
//!
//! # Architecture
//!
//! The central type is [`Node`], a closed tagged enum with one variant per SQL
//! construct. Nodes do not own their children directly: every child-bearing field
//! holds a [`NodeId`] handle into an [`Ast`](crate::arena::Ast) arena. A field is
//! either *Single* (`NodeId` when required, `Option<NodeId>` when optional) or
//! *List* (`Vec<NodeId>`). Scalar fields (names, flags, operators) are never
//! children.
//!
//! # Field descriptors
//!
//! Each kind publishes an ordered list of [`FieldSpec`] descriptors through
//! [`NodeKind::fields`]. The descriptors, the generic accessors on [`Node`] and the
//! visitor traits are all generated from one catalogue ([`node_catalogue!`]), so a
//! kind cannot exist without a descriptor and every `match` over kinds is checked
//! for exhaustiveness by the compiler.
//!
//! # Variant Groups
//!
//! | Group | Examples |
//! |---|---|
//! | **Leaves** | `StringLiteral`, `IntegerLiteral`, `Column`, `Table`, `Star`, `Parameter` |
//! | **Operators** | `Comparison`, `Logical`, `Arithmetic`, `Unary`, `Between`, `InList`, `Like` |
//! | **Functions** | `FunctionCall`, `WindowFunction`, `WindowSpec`, `Cast` |
//! | **Queries** | `Select`, `SetOperation`, `Subquery`, `With`, `Cte` |
//! | **Clauses** | `From`, `Join`, `Where`, `GroupBy`, `Having`, `Qualify`, `OrderBy`, `Limit` |
//! | **Statements** | `Insert`, `Update`, `Delete`, `Merge`, `CreateTable`, `DropTable`, `Script` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of a node inside an [`Ast`](crate::arena::Ast).
///
/// Two handles are equal iff they name the same node instance. Structurally
/// identical subtrees allocated separately have different handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in its arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a child field holds one node or an ordered sequence of nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Single,
    List,
}

/// Descriptor of one child-bearing field of a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub cardinality: Cardinality,
}

/// Borrowed view of the current content of a child field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRef<'a> {
    /// A single-valued field; `None` when an optional field is empty
    Single(Option<NodeId>),
    List(&'a [NodeId]),
}

/// The single source of truth for node kinds.
///
/// Invokes `$callback!` with one entry per kind:
/// `Variant => visit_method { field: cardinality, ... }` where cardinality is
/// `one` (required single), `opt` (optional single) or `list`. Field order is
/// descriptor order.
macro_rules! node_catalogue {
    ($callback:ident) => {
        $callback! {
            StringLiteral => visit_string_literal {},
            IntegerLiteral => visit_integer_literal {},
            FloatLiteral => visit_float_literal {},
            BooleanLiteral => visit_boolean_literal {},
            NullLiteral => visit_null_literal {},
            TypedLiteral => visit_typed_literal {},
            Parameter => visit_parameter {},
            Column => visit_column {},
            Star => visit_star {},
            Table => visit_table {},
            Interval => visit_interval { value: one },
            Array => visit_array { elements: list },
            Struct => visit_struct { fields: list },
            Comparison => visit_comparison { left: one, right: one },
            Logical => visit_logical { left: one, right: one },
            Arithmetic => visit_arithmetic { left: one, right: one },
            Unary => visit_unary { operand: one },
            Between => visit_between { expr: one, low: one, high: one },
            InList => visit_in_list { expr: one, list: list },
            InSubquery => visit_in_subquery { expr: one, query: one },
            IsNull => visit_is_null { expr: one },
            Like => visit_like { expr: one, pattern: one },
            Exists => visit_exists { query: one },
            Paren => visit_paren { expr: one },
            Cast => visit_cast { expr: one },
            Case => visit_case { operand: opt, whens: list, else_result: opt },
            When => visit_when { condition: one, result: one },
            Alias => visit_alias { expr: one },
            FunctionCall => visit_function_call { args: list },
            WindowFunction => visit_window_function { function: one, window: one },
            WindowSpec => visit_window_spec { partition_by: list, order_by: list },
            Select => visit_select {
                with: opt,
                columns: list,
                from: opt,
                joins: list,
                where_clause: opt,
                group_by: opt,
                having: opt,
                qualify: opt,
                order_by: opt,
                limit: opt,
            },
            SetOperation => visit_set_operation { left: one, right: one, order_by: opt, limit: opt },
            With => visit_with { ctes: list },
            Cte => visit_cte { query: one },
            Subquery => visit_subquery { query: one },
            From => visit_from { sources: list },
            Join => visit_join { source: one, condition: opt },
            TableFunction => visit_table_function { args: list },
            Where => visit_where { condition: one },
            GroupBy => visit_group_by { expressions: list },
            Having => visit_having { condition: one },
            Qualify => visit_qualify { condition: one },
            OrderBy => visit_order_by { items: list },
            Ordered => visit_ordered { expr: one },
            Limit => visit_limit { count: one, offset: opt },
            Insert => visit_insert { table: one, source: one },
            Values => visit_values { rows: list },
            Tuple => visit_tuple { expressions: list },
            Update => visit_update { table: one, assignments: list, from: opt, where_clause: opt },
            Assignment => visit_assignment { column: one, value: one },
            Delete => visit_delete { table: one, where_clause: opt },
            Merge => visit_merge { target: one, source: one, on: one, whens: list },
            MergeWhen => visit_merge_when { condition: opt, action: one },
            MergeInsert => visit_merge_insert { values: opt },
            MergeUpdate => visit_merge_update { assignments: list },
            MergeDelete => visit_merge_delete {},
            CreateTable => visit_create_table { table: one, columns: list, query: opt },
            ColumnDef => visit_column_def {},
            DropTable => visit_drop_table { table: one },
            Script => visit_script { statements: list },
        }
    };
}
pub(crate) use node_catalogue;

macro_rules! field_cardinality {
    (one) => {
        Cardinality::Single
    };
    (opt) => {
        Cardinality::Single
    };
    (list) => {
        Cardinality::List
    };
}

macro_rules! field_ref {
    (one, $e:expr) => {
        ChildRef::Single(Some($e))
    };
    (opt, $e:expr) => {
        ChildRef::Single($e)
    };
    (list, $e:expr) => {
        ChildRef::List(&$e)
    };
}

macro_rules! field_set {
    (one, $e:expr, $id:expr) => {{
        $e = $id;
        true
    }};
    (opt, $e:expr, $id:expr) => {{
        $e = Some($id);
        true
    }};
    (list, $e:expr, $id:expr) => {
        false
    };
}

macro_rules! field_clear {
    (one, $e:expr) => {
        false
    };
    (opt, $e:expr) => {{
        $e = None;
        true
    }};
    (list, $e:expr) => {
        false
    };
}

macro_rules! field_list_mut {
    (one, $e:expr) => {
        None
    };
    (opt, $e:expr) => {
        None
    };
    (list, $e:expr) => {
        Some(&mut $e)
    };
}

macro_rules! field_map {
    (one, $e:expr, $f:ident) => {
        $e = $f($e);
    };
    (opt, $e:expr, $f:ident) => {
        if let Some(id) = $e {
            $e = Some($f(id));
        }
    };
    (list, $e:expr, $f:ident) => {
        for id in $e.iter_mut() {
            *id = $f(*id);
        }
    };
}

macro_rules! define_node_model {
    ($($variant:ident => $visit:ident { $($field:ident : $card:ident),* $(,)? }),* $(,)?) => {
        /// Any SQL construct: expression, clause or statement.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Node {
            $($variant($variant),)*
        }

        /// Kind tag of a [`Node`], usable for dynamic type tests.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum NodeKind {
            $($variant,)*
        }

        impl NodeKind {
            /// Every kind, in catalogue order
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$variant,)*];

            /// Stable name of the kind
            pub fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$variant => stringify!($variant),)*
                }
            }

            /// Ordered child-field descriptors of the kind
            pub fn fields(self) -> &'static [FieldSpec] {
                match self {
                    $(NodeKind::$variant => &[
                        $(FieldSpec {
                            name: stringify!($field),
                            cardinality: field_cardinality!($card),
                        },)*
                    ],)*
                }
            }
        }

        impl Node {
            /// Kind tag of this node
            pub fn kind(&self) -> NodeKind {
                match self {
                    $(Node::$variant(_) => NodeKind::$variant,)*
                }
            }

            /// Current content of the child field named `field`
            pub fn child(&self, field: &str) -> Option<ChildRef<'_>> {
                match self {
                    $(Node::$variant(_node) => {
                        $(if field == stringify!($field) {
                            return Some(field_ref!($card, _node.$field));
                        })*
                        None
                    })*
                }
            }

            /// Overwrite a single-valued child field. Returns `false` if `field` is not
            /// a single-valued child field of this kind.
            pub(crate) fn set_single(&mut self, field: &str, id: NodeId) -> bool {
                match self {
                    $(Node::$variant(_node) => {
                        $(if field == stringify!($field) {
                            return field_set!($card, _node.$field, id);
                        })*
                        let _ = id;
                        false
                    })*
                }
            }

            /// Empty an optional child field. Returns `false` if `field` is not an
            /// optional child field of this kind.
            pub(crate) fn clear_single(&mut self, field: &str) -> bool {
                match self {
                    $(Node::$variant(_node) => {
                        $(if field == stringify!($field) {
                            return field_clear!($card, _node.$field);
                        })*
                        false
                    })*
                }
            }

            /// Mutable access to a list-valued child field
            pub(crate) fn list_mut(&mut self, field: &str) -> Option<&mut Vec<NodeId>> {
                match self {
                    $(Node::$variant(_node) => {
                        $(if field == stringify!($field) {
                            return field_list_mut!($card, _node.$field);
                        })*
                        None
                    })*
                }
            }

            /// Rewrite every child handle in place
            pub(crate) fn map_children(&mut self, remap: &mut dyn FnMut(NodeId) -> NodeId) {
                match self {
                    $(Node::$variant(_node) => {
                        $(field_map!($card, _node.$field, remap);)*
                    })*
                }
            }
        }
    };
}

node_catalogue!(define_node_model);

impl NodeKind {
    /// Kinds that open a new lexical scope for their subtree
    pub fn introduces_scope(self) -> bool {
        matches!(
            self,
            NodeKind::Select
                | NodeKind::Cte
                | NodeKind::Subquery
                | NodeKind::TableFunction
                | NodeKind::WindowSpec
        )
    }

    /// Look up a kind by its [`name`](NodeKind::name)
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Descriptor of the child field named `field`
    pub fn field(self, field: &str) -> Option<FieldSpec> {
        self.fields().iter().copied().find(|f| f.name == field)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Node {
    /// All child handles in descriptor order, list elements in list order
    pub fn child_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for spec in self.kind().fields() {
            match self.child(spec.name) {
                Some(ChildRef::Single(Some(id))) => ids.push(id),
                Some(ChildRef::List(list)) => ids.extend_from_slice(list),
                _ => {}
            }
        }
        ids
    }

    /// Returns `true` if this node is a top-level statement
    pub fn is_statement(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Select
                | NodeKind::SetOperation
                | NodeKind::Insert
                | NodeKind::Update
                | NodeKind::Delete
                | NodeKind::Merge
                | NodeKind::CreateTable
                | NodeKind::DropTable
                | NodeKind::Script
        )
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// A name, optionally written with quotes in the source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    #[serde(default)]
    pub quoted: bool,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: false,
        }
    }

    /// An identifier that must always be rendered quoted
    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: true,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "`{}`", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
            ArithmeticOp::Concat => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullsOrder {
    First,
    Last,
}

/// Which rows a `WHEN` branch of a MERGE applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMatch {
    Matched,
    NotMatchedByTarget,
    NotMatchedBySource,
}

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegerLiteral {
    pub value: i64,
}

/// Float literal, kept as written so rendering is exact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatLiteral {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanLiteral {
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullLiteral;

/// `DATE '2024-01-01'`, `TIMESTAMP '...'`, `JSON '...'`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedLiteral {
    pub data_type: String,
    pub value: String,
}

/// Query parameter: `@name` or positional `?`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Named(String),
    Positional,
}

/// Column reference, optionally qualified by a table or alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub table: Option<Identifier>,
    pub name: Identifier,
}

/// `*`, `t.*`, `* EXCEPT (a, b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub table: Option<Identifier>,
    #[serde(default)]
    pub except: Vec<Identifier>,
}

/// Table reference `project.dataset.table [AS alias]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Dotted path, the table name last
    pub path: Vec<Identifier>,
    pub alias: Option<Identifier>,
}

impl Table {
    /// The unqualified table name
    pub fn name(&self) -> Option<&Identifier> {
        self.path.last()
    }

    /// Name visible to the rest of the query: the alias if present, else the table name
    pub fn visible_name(&self) -> Option<&Identifier> {
        self.alias.as_ref().or_else(|| self.path.last())
    }
}

// ---------------------------------------------------------------------------
// Compound literals
// ---------------------------------------------------------------------------

/// `INTERVAL <value> <unit>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub value: NodeId,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Array {
    pub elements: Vec<NodeId>,
}

/// `STRUCT(1 AS a, 'x' AS b)`; named fields are `Alias` nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub fields: Vec<NodeId>,
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: NodeId,
    pub op: ComparisonOp,
    pub right: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logical {
    pub left: NodeId,
    pub op: LogicalOp,
    pub right: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arithmetic {
    pub left: NodeId,
    pub op: ArithmeticOp,
    pub right: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Between {
    pub expr: NodeId,
    pub low: NodeId,
    pub high: NodeId,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InList {
    pub expr: NodeId,
    pub list: Vec<NodeId>,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InSubquery {
    pub expr: NodeId,
    pub query: NodeId,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsNull {
    pub expr: NodeId,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub expr: NodeId,
    pub pattern: NodeId,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exists {
    pub query: NodeId,
    #[serde(default)]
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paren {
    pub expr: NodeId,
}

/// `CAST(x AS type)` or `SAFE_CAST(x AS type)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    pub expr: NodeId,
    pub data_type: String,
    #[serde(default)]
    pub safe: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub operand: Option<NodeId>,
    pub whens: Vec<NodeId>,
    pub else_result: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct When {
    pub condition: NodeId,
    pub result: NodeId,
}

/// `expr AS alias`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub expr: NodeId,
    pub alias: Identifier,
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<NodeId>,
    #[serde(default)]
    pub distinct: bool,
}

/// `function OVER (window)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFunction {
    pub function: NodeId,
    pub window: NodeId,
}

/// `[name] PARTITION BY ... ORDER BY ... [frame]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Reference to a named window (`OVER (w ORDER BY x)`)
    pub name: Option<Identifier>,
    pub partition_by: Vec<NodeId>,
    pub order_by: Vec<NodeId>,
    /// Frame clause kept verbatim, e.g. `ROWS BETWEEN 1 PRECEDING AND CURRENT ROW`
    pub frame: Option<String>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub with: Option<NodeId>,
    #[serde(default)]
    pub distinct: bool,
    pub columns: Vec<NodeId>,
    pub from: Option<NodeId>,
    #[serde(default)]
    pub joins: Vec<NodeId>,
    pub where_clause: Option<NodeId>,
    pub group_by: Option<NodeId>,
    pub having: Option<NodeId>,
    pub qualify: Option<NodeId>,
    pub order_by: Option<NodeId>,
    pub limit: Option<NodeId>,
}

/// `left UNION ALL right`, `left EXCEPT DISTINCT right`, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    pub op: SetOperator,
    /// `DISTINCT` when true, `ALL` otherwise
    pub distinct: bool,
    pub left: NodeId,
    pub right: NodeId,
    pub order_by: Option<NodeId>,
    pub limit: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct With {
    #[serde(default)]
    pub recursive: bool,
    pub ctes: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub name: Identifier,
    #[serde(default)]
    pub columns: Vec<Identifier>,
    pub query: NodeId,
}

/// Parenthesized query, as an expression or a derived table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subquery {
    pub query: NodeId,
    pub alias: Option<Identifier>,
}

// ---------------------------------------------------------------------------
// Clauses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct From {
    pub sources: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub source: NodeId,
    pub condition: Option<NodeId>,
    #[serde(default)]
    pub using: Vec<Identifier>,
}

/// Table-valued function in FROM, e.g. `UNNEST(arr) AS x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFunction {
    pub name: String,
    pub args: Vec<NodeId>,
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Where {
    pub condition: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub expressions: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Having {
    pub condition: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualify {
    pub condition: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub items: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordered {
    pub expr: NodeId,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub count: NodeId,
    pub offset: Option<NodeId>,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// `INSERT INTO table (columns) source`; source is `Values` or a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub table: NodeId,
    #[serde(default)]
    pub columns: Vec<Identifier>,
    pub source: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Values {
    pub rows: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    pub expressions: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub table: NodeId,
    pub assignments: Vec<NodeId>,
    pub from: Option<NodeId>,
    pub where_clause: Option<NodeId>,
}

/// `column = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: NodeId,
    pub value: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub table: NodeId,
    pub where_clause: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub target: NodeId,
    pub source: NodeId,
    pub on: NodeId,
    pub whens: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeWhen {
    pub matched: MergeMatch,
    pub condition: Option<NodeId>,
    /// `MergeInsert`, `MergeUpdate` or `MergeDelete`
    pub action: NodeId,
}

/// `INSERT (columns) VALUES (...)`; `INSERT ROW` when `values` is empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeInsert {
    #[serde(default)]
    pub columns: Vec<Identifier>,
    pub values: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeUpdate {
    pub assignments: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeDelete;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    #[serde(default)]
    pub or_replace: bool,
    #[serde(default)]
    pub if_not_exists: bool,
    pub table: NodeId,
    pub columns: Vec<NodeId>,
    /// `AS SELECT ...`
    pub query: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: Identifier,
    pub data_type: String,
    #[serde(default)]
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTable {
    #[serde(default)]
    pub if_exists: bool,
    pub table: NodeId,
}

/// Sequence of statements separated by `;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub statements: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NodeId {
        NodeId(n)
    }

    #[test]
    fn test_descriptors_follow_declaration_order() {
        let names: Vec<_> = NodeKind::Select.fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "with",
                "columns",
                "from",
                "joins",
                "where_clause",
                "group_by",
                "having",
                "qualify",
                "order_by",
                "limit"
            ]
        );
        assert_eq!(
            NodeKind::Select.field("columns").map(|f| f.cardinality),
            Some(Cardinality::List)
        );
        assert_eq!(
            NodeKind::Select.field("from").map(|f| f.cardinality),
            Some(Cardinality::Single)
        );
        assert!(NodeKind::Column.fields().is_empty());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(NodeKind::from_name("Nope"), None);
    }

    #[test]
    fn test_child_access() {
        let node = Node::Case(Case {
            operand: None,
            whens: vec![id(1), id(2)],
            else_result: Some(id(3)),
        });
        assert_eq!(node.child("operand"), Some(ChildRef::Single(None)));
        assert_eq!(node.child("whens"), Some(ChildRef::List(&[id(1), id(2)])));
        assert_eq!(node.child("else_result"), Some(ChildRef::Single(Some(id(3)))));
        assert_eq!(node.child("missing"), None);
        assert_eq!(node.child_ids(), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn test_set_single_and_list_mut() {
        let mut node = Node::Comparison(Comparison {
            left: id(1),
            op: ComparisonOp::Eq,
            right: id(2),
        });
        assert!(node.set_single("right", id(9)));
        assert!(!node.set_single("nope", id(9)));
        assert!(node.list_mut("right").is_none());
        assert_eq!(node.child_ids(), vec![id(1), id(9)]);

        let mut list = Node::Array(Array {
            elements: vec![id(4)],
        });
        assert!(!list.set_single("elements", id(5)));
        list.list_mut("elements").unwrap().push(id(5));
        assert_eq!(list.child_ids(), vec![id(4), id(5)]);
    }

    #[test]
    fn test_clear_single_only_empties_optional_fields() {
        let mut node = Node::Limit(Limit {
            count: id(1),
            offset: Some(id(2)),
        });
        assert!(!node.clear_single("count"));
        assert!(node.clear_single("offset"));
        assert_eq!(node.child("offset"), Some(ChildRef::Single(None)));
        assert_eq!(node.child_ids(), vec![id(1)]);
    }

    #[test]
    fn test_map_children() {
        let mut node = Node::Limit(Limit {
            count: id(1),
            offset: Some(id(2)),
        });
        node.map_children(&mut |old| NodeId(old.0 + 10));
        assert_eq!(node.child_ids(), vec![id(11), id(12)]);
    }

    #[test]
    fn test_scope_introducing_kinds() {
        let scoped: Vec<_> = NodeKind::ALL
            .iter()
            .filter(|k| k.introduces_scope())
            .map(|k| k.name())
            .collect();
        assert_eq!(
            scoped,
            vec!["WindowSpec", "Select", "Cte", "Subquery", "TableFunction"]
        );
    }
}
