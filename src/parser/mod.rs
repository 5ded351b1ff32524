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

//! SQL Parser
//!
//! The pipeline runs in two stages. First the raw token stream is split on
//! top-level `UNION`/`UNION ALL` boundaries and each branch is walked once
//! by the clause classifier, which partitions tokens into named clause
//! buckets. Then each bucket is handed to its structural builder (SELECT
//! list, FROM/JOIN graph, ORDER/GROUP BY, expression lists, ...), which
//! replaces the tokens with a typed tree. Subqueries, bracketed groups and
//! `(select ...) union (select ...)` branches re-enter the whole pipeline
//! recursively, bounded by an explicit depth counter.
//!
//! The parser is permissive and non-validating: structurally odd input
//! produces a best-effort tree, never an "invalid SQL" error.

mod classifier;
mod expr;
mod from;
mod order;
mod select;
mod statement;

use core::fmt;
use std::sync::Arc;

use crate::ast::{Clause, Query, Statement, Token, UnionType};
use crate::keywords::SymbolTables;
use crate::tokenizer::{Tokenizer, TokenizerError};

use classifier::{Buckets, Classifier};

/// Default ceiling for parenthesis/subquery/union nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// The classifier produced no clause buckets for a statement.
    UnparsableStatement,
    /// Recursion guard tripped; the input nests deeper than the
    /// configured ceiling.
    NestingTooDeep,
    /// Strict mode only: `IN` was not followed by a parenthesized list.
    MalformedInList(String),
    /// Strict mode only: a subquery trigger was not followed by a
    /// parenthesized `SELECT`.
    MalformedSubquery(String),
    TokenizerError(TokenizerError),
}

impl From<TokenizerError> for ParserError {
    fn from(e: TokenizerError) -> Self {
        ParserError::TokenizerError(e)
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParserError::UnparsableStatement => {
                write!(f, "sql parser error: no clause could be classified")
            }
            ParserError::NestingTooDeep => {
                write!(f, "sql parser error: nesting exceeds the recursion limit")
            }
            ParserError::MalformedInList(s) => {
                write!(f, "sql parser error: IN is not followed by a list: {s}")
            }
            ParserError::MalformedSubquery(s) => {
                write!(f, "sql parser error: expected a parenthesized subquery: {s}")
            }
            ParserError::TokenizerError(e) => write!(f, "sql parser error: {e}"),
        }
    }
}

impl std::error::Error for ParserError {}

/// Parse `sql` with the standard MySQL symbol tables.
pub fn parse(sql: &str) -> Result<Query, ParserError> {
    Parser::new().parse(sql)
}

/// Parse a bare expression list (for partial input such as a lone `WHERE`
/// condition) with the standard MySQL symbol tables.
pub fn parse_expression(sql: &str) -> Result<Vec<crate::ast::ExpressionNode>, ParserError> {
    Parser::new().parse_expression(sql)
}

/// The parser. Holds the shared read-only symbol tables and the recursion
/// ceiling; each `parse` call owns its own token buffers and tree, so one
/// parser can be reused freely.
pub struct Parser {
    tables: Arc<SymbolTables>,
    max_depth: usize,
    strict: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser::with_tables(SymbolTables::standard())
    }

    pub fn with_tables(tables: Arc<SymbolTables>) -> Parser {
        Parser {
            tables,
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }

    /// Change the nesting ceiling (default [`DEFAULT_MAX_DEPTH`]).
    pub fn max_depth(mut self, max_depth: usize) -> Parser {
        self.max_depth = max_depth;
        self
    }

    /// In strict mode, a trigger keyword without its expected `(...)`
    /// group is an error instead of degrading to an ordinary token.
    pub fn strict(mut self, strict: bool) -> Parser {
        self.strict = strict;
        self
    }

    /// Parse one statement (possibly several UNIONed branches).
    pub fn parse(&self, sql: &str) -> Result<Query, ParserError> {
        log::debug!("parsing sql '{}'", sql);
        self.parse_str(sql, 0)
    }

    /// Parse a bare expression list.
    pub fn parse_expression(
        &self,
        sql: &str,
    ) -> Result<Vec<crate::ast::ExpressionNode>, ParserError> {
        let tokens = Tokenizer::new(sql).tokenize()?;
        self.expr_list(&tokens, 0)
    }

    pub(crate) fn tables(&self) -> &SymbolTables {
        &self.tables
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.strict
    }

    /// Bump the depth counter, failing once the ceiling is reached. Every
    /// recursive re-entry into the pipeline goes through here.
    pub(crate) fn nested(&self, depth: usize) -> Result<usize, ParserError> {
        if depth >= self.max_depth {
            Err(ParserError::NestingTooDeep)
        } else {
            Ok(depth + 1)
        }
    }

    /// Tokenize and parse a statement string; the re-entry point for
    /// subqueries and bracketed union branches.
    pub(crate) fn parse_str(&self, sql: &str, depth: usize) -> Result<Query, ParserError> {
        let tokens = Tokenizer::new(sql).tokenize()?;
        self.parse_tokens(&tokens, depth)
    }

    pub(crate) fn parse_tokens(
        &self,
        tokens: &[Token],
        depth: usize,
    ) -> Result<Query, ParserError> {
        let depth = self.nested(depth)?;
        let (union_type, branches) = split_union(tokens);
        match union_type {
            None => {
                let branch = branches.into_iter().next().unwrap_or_default();
                Ok(Query::Statement(Box::new(
                    self.parse_statement(&branch, depth)?,
                )))
            }
            Some(union_type) => {
                let mut parsed = Vec::with_capacity(branches.len());
                for branch in &branches {
                    parsed.push(self.parse_branch(branch, depth)?);
                }
                Ok(Query::Union {
                    union_type,
                    branches: parsed,
                })
            }
        }
    }

    /// One union branch: the bracketed `(select ...)` form re-enters the
    /// whole pipeline, anything else goes through the classifier.
    fn parse_branch(&self, branch: &[Token], depth: usize) -> Result<Query, ParserError> {
        if let Some(first) = branch.iter().find(|t| !t.is_whitespace()) {
            if starts_with_subselect(first.trimmed()) {
                return self.parse_str(remove_parenthesis(first.trimmed()), depth);
            }
        }
        Ok(Query::Statement(Box::new(
            self.parse_statement(branch, depth)?,
        )))
    }

    fn parse_statement(&self, tokens: &[Token], depth: usize) -> Result<Statement, ParserError> {
        let buckets = Classifier::classify(tokens);
        self.assemble(buckets, depth)
    }

    /// Replace every classified bucket with its structured form.
    fn assemble(&self, mut buckets: Buckets, depth: usize) -> Result<Statement, ParserError> {
        if buckets.is_empty() {
            return Err(ParserError::UnparsableStatement);
        }

        let is_update = buckets.has(Clause::Update);
        let mut stmt = Statement::default();

        if let Some(tokens) = buckets.take(Clause::Select) {
            stmt.select = Some(self.select_list(&tokens, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::From) {
            stmt.from = Some(self.from_list(&tokens, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Using) {
            stmt.using = Some(self.from_list(&tokens, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Update) {
            stmt.update = Some(self.from_list(&tokens, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Group) {
            let select = stmt.select.as_deref().unwrap_or(&[]);
            stmt.group_by = Some(self.group_list(&tokens, select, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Order) {
            let select = stmt.select.as_deref().unwrap_or(&[]);
            stmt.order_by = Some(self.order_list(&tokens, select, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Limit) {
            stmt.limit = Some(statement::limit_clause(&tokens));
        }
        if let Some(tokens) = buckets.take(Clause::Where) {
            stmt.where_clause = Some(self.expr_list(&tokens, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Having) {
            stmt.having = Some(self.expr_list(&tokens, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Set) {
            stmt.set = Some(self.set_list(&tokens, is_update, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Duplicate) {
            stmt.on_duplicate = Some(self.set_list(&tokens, false, depth)?);
        }
        if buckets.take(Clause::Insert).is_some() {
            let into = buckets.take(Clause::Into).unwrap_or_default();
            stmt.insert = Some(self.insert_target(crate::ast::InsertKind::Insert, &into));
        }
        if buckets.take(Clause::Replace).is_some() {
            let into = buckets.take(Clause::Into).unwrap_or_default();
            stmt.insert = Some(self.insert_target(crate::ast::InsertKind::Replace, &into));
        }
        if let Some(tokens) = buckets.take(Clause::Delete) {
            stmt.delete = Some(statement::delete_target(&tokens, stmt.from.as_deref()));
        }
        if let Some(tokens) = buckets.take(Clause::Values) {
            stmt.values = Some(self.values_list(&tokens, depth)?);
        }
        if let Some(tokens) = buckets.take(Clause::Into) {
            stmt.into = Some(statement::into_list(&tokens));
        }
        if let Some(tokens) = buckets.take(Clause::Options) {
            stmt.options = tokens.iter().map(|t| t.trimmed().to_string()).collect();
        }

        stmt.other = buckets.into_entries();
        Ok(stmt)
    }
}

/// Split a token stream on top-level `UNION` boundaries. Returns the union
/// type (`None` when the statement has no union) and the branches; with no
/// union the single branch is the input itself. When boundaries mix
/// `UNION` and `UNION ALL` the last boundary's type wins.
fn split_union(tokens: &[Token]) -> (Option<UnionType>, Vec<Vec<Token>>) {
    let mut union_type = None;
    let mut branches = Vec::new();
    let mut current = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.upper() != "UNION" {
            current.push(token.clone());
            i += 1;
            continue;
        }

        // one-token lookahead for ALL, skipping whitespace
        let mut boundary = UnionType::Union;
        let mut next = i + 1;
        while next < tokens.len() && tokens[next].is_whitespace() {
            next += 1;
        }
        if next < tokens.len() && tokens[next].upper() == "ALL" {
            boundary = UnionType::UnionAll;
            i = next; // overread until ALL
        }
        union_type = Some(boundary);
        branches.push(std::mem::take(&mut current));
        i += 1;
    }

    // the branch after the last boundary; dropped when it has no tokens
    if current.iter().any(|t| !t.is_whitespace()) || union_type.is_none() {
        branches.push(current);
    }

    (union_type, branches)
}

/// True for tokens shaped like `(select ...`, any case, any whitespace.
pub(crate) fn starts_with_subselect(text: &str) -> bool {
    let trimmed = text.trim_start();
    match trimmed.strip_prefix('(') {
        Some(rest) => {
            let rest = rest.trim_start();
            rest.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("select"))
        }
        None => false,
    }
}

/// Strip one enclosing parenthesis pair, if present.
pub(crate) fn remove_parenthesis(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => inner,
        None => trimmed,
    }
}

/// Remove surrounding backtick escaping from an identifier.
pub(crate) fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Tokenizer::new(sql).tokenize().unwrap()
    }

    #[test]
    fn split_union_no_union() {
        let (ty, branches) = split_union(&tokens("SELECT 1"));
        assert_eq!(ty, None);
        assert_eq!(branches.len(), 1);
    }

    #[test]
    fn split_union_two_branches() {
        let (ty, branches) = split_union(&tokens("SELECT 1 UNION SELECT 2"));
        assert_eq!(ty, Some(UnionType::Union));
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn split_union_all_lookahead() {
        let (ty, branches) = split_union(&tokens("SELECT 1 UNION ALL SELECT 2"));
        assert_eq!(ty, Some(UnionType::UnionAll));
        assert_eq!(branches.len(), 2);
        // ALL must not leak into the second branch
        assert!(branches[1].iter().all(|t| t.upper() != "ALL"));
    }

    #[test]
    fn split_union_mixed_records_last_type() {
        let (ty, branches) =
            split_union(&tokens("SELECT 1 UNION ALL SELECT 2 UNION SELECT 3"));
        assert_eq!(ty, Some(UnionType::Union));
        assert_eq!(branches.len(), 3);
    }

    #[test]
    fn subselect_shape() {
        assert!(starts_with_subselect("(select 1)"));
        assert!(starts_with_subselect("( SELECT a FROM t )"));
        assert!(!starts_with_subselect("(1 + 2)"));
        assert!(!starts_with_subselect("select 1"));
    }

    #[test]
    fn parenthesis_removal() {
        assert_eq!(remove_parenthesis("(a + b)"), "a + b");
        assert_eq!(remove_parenthesis(" (x) "), "x");
        assert_eq!(remove_parenthesis("plain"), "plain");
    }

    #[test]
    fn recursion_guard_trips() {
        let parser = Parser::new().max_depth(4);
        let mut sql = String::from("SELECT a FROM t WHERE x = ");
        sql.push_str(&"(SELECT b FROM u WHERE y = ".repeat(8));
        sql.push('1');
        sql.push_str(&")".repeat(8));
        assert_eq!(parser.parse(&sql).unwrap_err(), ParserError::NestingTooDeep);
    }

    #[test]
    fn empty_input_is_unparsable() {
        assert_eq!(parse("").unwrap_err(), ParserError::UnparsableStatement);
        assert_eq!(parse("   ").unwrap_err(), ParserError::UnparsableStatement);
    }
}
