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

//! Statement-level clauses without expression grammar of their own:
//! LIMIT, SET assignments, INSERT/REPLACE targets, VALUES records,
//! DELETE target tables and the INTO list.

use super::*;
use crate::ast::{DeleteTarget, ExpressionNode, InsertKind, InsertTarget, Limit, NodeKind};

/// Normalize both `LIMIT offset, rowcount` and `LIMIT rowcount OFFSET
/// offset`. A bare `LIMIT n` leaves the offset empty.
pub(crate) fn limit_clause(tokens: &[Token]) -> Limit {
    let mut split = None;
    let mut exchange = false;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_comma() {
            split = Some(i);
            break;
        }
        if token.upper() == "OFFSET" {
            split = Some(i);
            exchange = true;
            break;
        }
    }

    let (before, after) = match split {
        Some(i) => (&tokens[..i], &tokens[i + 1..]),
        None => (&tokens[..0], tokens),
    };
    let join = |ts: &[Token]| -> String {
        ts.iter().map(|t| t.text.as_str()).collect::<String>().trim().to_string()
    };

    if exchange {
        Limit {
            rowcount: join(before),
            offset: join(after),
        }
    } else {
        Limit {
            offset: join(before),
            rowcount: join(after),
        }
    }
}

/// Tables a DELETE removes rows from: the tokens between `DELETE` and
/// `FROM` with any `.*` suffix trimmed, or every FROM table when none are
/// named.
pub(crate) fn delete_target(
    tokens: &[Token],
    from: Option<&[ExpressionNode]>,
) -> DeleteTarget {
    let mut tables: Vec<String> = tokens
        .iter()
        .filter(|t| t.upper() != "DELETE" && !t.is_comma() && !t.is_whitespace())
        .map(|t| t.text.trim_matches(|c| c == ' ' || c == '.' || c == '*').to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if tables.is_empty() {
        if let Some(from) = from {
            tables = from.iter().filter_map(|term| term.table.clone()).collect();
        }
    }
    DeleteTarget { tables }
}

/// A `SELECT ... INTO @a, @b` target list.
pub(crate) fn into_list(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !t.is_whitespace() && !t.is_comma())
        .map(|t| t.trimmed().to_string())
        .collect()
}

impl Parser {
    /// SET assignments (UPDATE and standalone SET). Outside an UPDATE a
    /// leading `GLOBAL`/`SESSION`/`LOCAL` keyword retags the assigned
    /// variable instead of becoming part of the expression.
    pub(crate) fn set_list(
        &self,
        tokens: &[Token],
        is_update: bool,
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        let mut result = Vec::new();
        let mut base = String::new();
        let mut var_kind = None;

        for token in tokens {
            match token.upper().as_str() {
                scope @ ("GLOBAL" | "SESSION" | "LOCAL") if !is_update => {
                    var_kind = Some(match scope {
                        "GLOBAL" => NodeKind::GlobalVariable,
                        "LOCAL" => NodeKind::LocalVariable,
                        _ => NodeKind::SessionVariable,
                    });
                    base.clear();
                    continue;
                }
                "," => {
                    result.push(self.assignment(&base, var_kind.take(), depth)?);
                    base.clear();
                    continue;
                }
                _ => {}
            }
            base.push_str(&token.text);
        }
        if !base.trim().is_empty() {
            result.push(self.assignment(&base, var_kind, depth)?);
        }
        Ok(result)
    }

    fn assignment(
        &self,
        base: &str,
        var_kind: Option<NodeKind>,
        depth: usize,
    ) -> Result<ExpressionNode, ParserError> {
        let tokens = Tokenizer::new(base).tokenize()?;
        let mut sub_tree = self.expr_list(&tokens, depth)?;
        if let (Some(kind), Some(first)) = (var_kind, sub_tree.first_mut()) {
            first.kind = kind;
        }
        Ok(ExpressionNode::with_children(
            NodeKind::Expression,
            base.trim(),
            sub_tree,
        ))
    }

    /// The table and optional column list of an INSERT or REPLACE, taken
    /// from the INTO bucket.
    pub(crate) fn insert_target(&self, kind: InsertKind, tokens: &[Token]) -> InsertTarget {
        let mut words = tokens.iter().filter(|t| !t.is_whitespace());
        let table = words
            .next()
            .map(|t| t.trimmed().to_string())
            .unwrap_or_default();
        let columns = words.next().map(|group| {
            remove_parenthesis(group.trimmed())
                .split(',')
                .map(|col| ExpressionNode::new(NodeKind::ColumnReference, col.trim()))
                .collect()
        });
        InsertTarget {
            kind,
            base_expr: table.clone(),
            table,
            columns,
        }
    }

    /// VALUES: one record node per parenthesized tuple.
    pub(crate) fn values_list(
        &self,
        tokens: &[Token],
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        let joined: String = tokens
            .iter()
            .filter(|t| !t.is_whitespace())
            .map(|t| t.text.as_str())
            .collect();
        let groups = Tokenizer::new(&joined).tokenize()?;

        let mut records = Vec::new();
        for group in groups.iter().filter(|t| !t.is_comma()) {
            let inner = Tokenizer::new(remove_parenthesis(group.trimmed())).tokenize()?;
            let inner: Vec<Token> = inner.into_iter().filter(|t| !t.is_comma()).collect();
            let data = self.expr_list(&inner, depth)?;
            records.push(ExpressionNode::with_children(
                NodeKind::Record,
                group.trimmed(),
                data,
            ));
        }
        Ok(records)
    }
}
