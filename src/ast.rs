// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parse tree types
//!
//! The parser produces a [`Query`], which is either a single [`Statement`]
//! or a `UNION` of several branches. Clause contents are sequences of
//! [`ExpressionNode`], a tagged tree node that keeps the verbatim source
//! text of everything it consumed.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One lexeme plus its exact source substring, including any surrounding
/// whitespace the tokenizer attached to it. Concatenating the `text` of all
/// tokens of a statement reproduces the statement byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Token { text: text.into() }
    }

    /// The token text with surrounding whitespace removed. Used for all
    /// comparisons; the untrimmed form is kept for reconstruction.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Uppercased trimmed text, the form the keyword tables are keyed by.
    pub fn upper(&self) -> String {
        self.trimmed().to_uppercase()
    }

    /// True for tokens that are pure whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.trimmed().is_empty()
    }

    pub fn is_comma(&self) -> bool {
        self.trimmed() == ","
    }

    /// True for `-- ...`, `# ...` and `/* ... */` tokens.
    pub fn is_comment(&self) -> bool {
        let t = self.trimmed();
        t.starts_with("--") || t.starts_with("/*") || t.starts_with('#')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Byte range of a node within the original statement, attached by the
/// position annotation pass. `start` is a byte offset, `len` a byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

/// The kind tag of an [`ExpressionNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    ColumnReference,
    Constant,
    Operator,
    Reserved,
    SimpleFunction,
    AggregateFunction,
    /// Generic composite expression
    Expression,
    BracketedExpression,
    Subquery,
    /// The parenthesized value list following `IN`
    InList,
    MatchArguments,
    /// One `VALUES` tuple
    Record,
    /// Unary `+`/`-`
    Sign,
    UserVariable,
    SessionVariable,
    GlobalVariable,
    LocalVariable,
    /// Ordinal reference, e.g. `ORDER BY 2`
    Position,
    /// `ORDER BY`/`GROUP BY` item that names a SELECT-list alias
    AliasReference,
    Table,
    /// Derived table that is not a subquery (nested join graph in parens)
    TableExpression,
}

/// A column or table alias. `explicit` is true when the alias was
/// introduced with `AS`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Alias {
    pub explicit: bool,
    pub name: String,
    pub base_expr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinType {
    Join,
    Left,
    Right,
    Cross,
    StraightJoin,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            JoinType::Join => "JOIN",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Cross => "CROSS",
            JoinType::StraightJoin => "STRAIGHT_JOIN",
        })
    }
}

/// How a join term is qualified: `ON <expr>` or `USING (<columns>)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RefType {
    On,
    Using,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// A node of the parse tree.
///
/// `base_expr` holds the trimmed verbatim source text of the tokens the
/// node consumed. Atomic nodes carry `sub_tree: None` rather than an empty
/// child list. `subquery` is populated instead of `sub_tree` when the node
/// wraps a fully parsed nested query (subqueries and derived tables whose
/// body is a `SELECT`). The join-term fields are only ever set on nodes
/// produced for a FROM/USING/UPDATE clause, and `direction` only on
/// `ORDER BY` items.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExpressionNode {
    pub kind: NodeKind,
    pub base_expr: String,
    pub sub_tree: Option<Vec<ExpressionNode>>,
    pub subquery: Option<Box<Query>>,
    pub alias: Option<Alias>,
    pub table: Option<String>,
    pub join_type: Option<JoinType>,
    pub ref_type: Option<RefType>,
    pub ref_clause: Option<Vec<ExpressionNode>>,
    pub direction: Option<OrderDirection>,
    pub span: Option<Span>,
}

impl ExpressionNode {
    /// An atomic node: no children, no alias.
    pub fn new(kind: NodeKind, base_expr: impl Into<String>) -> Self {
        ExpressionNode {
            kind,
            base_expr: base_expr.into(),
            sub_tree: None,
            subquery: None,
            alias: None,
            table: None,
            join_type: None,
            ref_type: None,
            ref_clause: None,
            direction: None,
            span: None,
        }
    }

    pub fn with_children(
        kind: NodeKind,
        base_expr: impl Into<String>,
        children: Vec<ExpressionNode>,
    ) -> Self {
        let mut node = ExpressionNode::new(kind, base_expr);
        node.sub_tree = Some(children);
        node
    }

    pub fn with_subquery(
        kind: NodeKind,
        base_expr: impl Into<String>,
        subquery: Query,
    ) -> Self {
        let mut node = ExpressionNode::new(kind, base_expr);
        node.subquery = Some(Box::new(subquery));
        node
    }
}

/// Normalized `LIMIT` clause. Both `LIMIT offset, rowcount` and
/// `LIMIT rowcount OFFSET offset` end up here the same way; a missing
/// offset is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Limit {
    pub offset: String,
    pub rowcount: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InsertKind {
    Insert,
    Replace,
}

/// Target of an `INSERT`/`REPLACE`: the table, and the optional explicit
/// column list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InsertTarget {
    pub kind: InsertKind,
    pub table: String,
    pub columns: Option<Vec<ExpressionNode>>,
    pub base_expr: String,
}

/// Tables a `DELETE` statement removes rows from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeleteTarget {
    pub tables: Vec<String>,
}

/// Every bucket the clause classifier can open. Most of these are
/// single-token statement markers; the ones with structural builders
/// (SELECT, FROM, WHERE, ...) are replaced by typed fields on
/// [`Statement`] during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Clause {
    Select,
    From,
    Where,
    Group,
    Order,
    Having,
    Limit,
    Set,
    Duplicate,
    Values,
    Into,
    Using,
    Update,
    Delete,
    Insert,
    Replace,
    Options,
    Rename,
    Call,
    Procedure,
    Function,
    Database,
    Server,
    Logfile,
    Definer,
    Returns,
    Tablespace,
    Trigger,
    Do,
    Plugin,
    Flush,
    Kill,
    Reset,
    Start,
    Stop,
    Purge,
    Execute,
    Prepare,
    Deallocate,
    Event,
    Data,
    Password,
    User,
    View,
    Alter,
    Truncate,
    Create,
    Optimize,
    Grant,
    Revoke,
    Show,
    Handler,
    Load,
    Rollback,
    Savepoint,
    Unlock,
    Install,
    Uninstall,
    Analyze,
    Backup,
    Check,
    Checksum,
    Repair,
    Restore,
    Describe,
    Explain,
    Use,
    Help,
    Cache,
    Lock,
    Drop,
}

impl Clause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Clause::Select => "SELECT",
            Clause::From => "FROM",
            Clause::Where => "WHERE",
            Clause::Group => "GROUP",
            Clause::Order => "ORDER",
            Clause::Having => "HAVING",
            Clause::Limit => "LIMIT",
            Clause::Set => "SET",
            Clause::Duplicate => "DUPLICATE",
            Clause::Values => "VALUES",
            Clause::Into => "INTO",
            Clause::Using => "USING",
            Clause::Update => "UPDATE",
            Clause::Delete => "DELETE",
            Clause::Insert => "INSERT",
            Clause::Replace => "REPLACE",
            Clause::Options => "OPTIONS",
            Clause::Rename => "RENAME",
            Clause::Call => "CALL",
            Clause::Procedure => "PROCEDURE",
            Clause::Function => "FUNCTION",
            Clause::Database => "DATABASE",
            Clause::Server => "SERVER",
            Clause::Logfile => "LOGFILE",
            Clause::Definer => "DEFINER",
            Clause::Returns => "RETURNS",
            Clause::Tablespace => "TABLESPACE",
            Clause::Trigger => "TRIGGER",
            Clause::Do => "DO",
            Clause::Plugin => "PLUGIN",
            Clause::Flush => "FLUSH",
            Clause::Kill => "KILL",
            Clause::Reset => "RESET",
            Clause::Start => "START",
            Clause::Stop => "STOP",
            Clause::Purge => "PURGE",
            Clause::Execute => "EXECUTE",
            Clause::Prepare => "PREPARE",
            Clause::Deallocate => "DEALLOCATE",
            Clause::Event => "EVENT",
            Clause::Data => "DATA",
            Clause::Password => "PASSWORD",
            Clause::User => "USER",
            Clause::View => "VIEW",
            Clause::Alter => "ALTER",
            Clause::Truncate => "TRUNCATE",
            Clause::Create => "CREATE",
            Clause::Optimize => "OPTIMIZE",
            Clause::Grant => "GRANT",
            Clause::Revoke => "REVOKE",
            Clause::Show => "SHOW",
            Clause::Handler => "HANDLER",
            Clause::Load => "LOAD",
            Clause::Rollback => "ROLLBACK",
            Clause::Savepoint => "SAVEPOINT",
            Clause::Unlock => "UNLOCK",
            Clause::Install => "INSTALL",
            Clause::Uninstall => "UNINSTALL",
            Clause::Analyze => "ANALYZE",
            Clause::Backup => "BACKUP",
            Clause::Check => "CHECK",
            Clause::Checksum => "CHECKSUM",
            Clause::Repair => "REPAIR",
            Clause::Restore => "RESTORE",
            Clause::Describe => "DESCRIBE",
            Clause::Explain => "EXPLAIN",
            Clause::Use => "USE",
            Clause::Help => "HELP",
            Clause::Cache => "CACHE",
            Clause::Lock => "LOCK",
            Clause::Drop => "DROP",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully assembled statement. Clauses the statement does not contain
/// are `None`; buckets with no structural builder (SHOW, CALL, PREPARE and
/// the other statement markers) keep their raw token lists in `other`, in
/// classification order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statement {
    pub options: Vec<String>,
    pub select: Option<Vec<ExpressionNode>>,
    pub from: Option<Vec<ExpressionNode>>,
    pub using: Option<Vec<ExpressionNode>>,
    pub update: Option<Vec<ExpressionNode>>,
    pub where_clause: Option<Vec<ExpressionNode>>,
    pub group_by: Option<Vec<ExpressionNode>>,
    pub order_by: Option<Vec<ExpressionNode>>,
    pub having: Option<Vec<ExpressionNode>>,
    pub limit: Option<Limit>,
    pub set: Option<Vec<ExpressionNode>>,
    pub on_duplicate: Option<Vec<ExpressionNode>>,
    pub insert: Option<InsertTarget>,
    pub delete: Option<DeleteTarget>,
    pub values: Option<Vec<ExpressionNode>>,
    pub into: Option<Vec<String>>,
    pub other: Vec<(Clause, Vec<Token>)>,
}

impl Statement {
    /// Raw tokens of a bucket kept in `other`, if the statement has one.
    pub fn bucket(&self, clause: Clause) -> Option<&[Token]> {
        self.other
            .iter()
            .find(|(c, _)| *c == clause)
            .map(|(_, tokens)| tokens.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnionType {
    Union,
    UnionAll,
}

impl fmt::Display for UnionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            UnionType::Union => "UNION",
            UnionType::UnionAll => "UNION ALL",
        })
    }
}

/// The result of parsing one SQL string: a single statement, or the
/// branches of a `UNION`. A query is never both; any `UNION` at the top
/// level means the statement form is absent.
///
/// When boundaries mix `UNION` and `UNION ALL`, `union_type` records the
/// last boundary's type. This loses the per-boundary distinction and is
/// kept for compatibility with the behavior this parser reproduces.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Query {
    Statement(Box<Statement>),
    Union {
        union_type: UnionType,
        branches: Vec<Query>,
    },
}

impl Query {
    /// The single statement, when the query is not a union.
    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Query::Statement(stmt) => Some(stmt),
            Query::Union { .. } => None,
        }
    }
}
