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

//! Helpers for annotating a parse tree with source positions.
//!
//! Spans are attached after parsing by searching the original statement
//! for each node's verbatim `base_expr`, walking the tree in clause order
//! with a forward-only cursor so repeated names resolve to their own
//! occurrence. The pass is best-effort: a node whose text cannot be found
//! ahead of the cursor (rewritten keywords, merged sign literals) keeps
//! `span: None`.

use crate::ast::{ExpressionNode, Query, Span, Statement};

/// Attach a [`Span`] to every node of `query` whose text can be located
/// in `sql`.
pub fn set_positions(sql: &str, query: &mut Query) {
    let mut cursor = 0;
    annotate_query(sql, query, &mut cursor);
}

fn annotate_query(sql: &str, query: &mut Query, cursor: &mut usize) {
    match query {
        Query::Statement(stmt) => annotate_statement(sql, stmt, cursor),
        Query::Union { branches, .. } => {
            for branch in branches {
                annotate_query(sql, branch, cursor);
            }
        }
    }
}

// clause order follows the textual layout of the statement forms the
// parser produces, so the cursor only ever moves forward
fn annotate_statement(sql: &str, stmt: &mut Statement, cursor: &mut usize) {
    let clauses = [
        stmt.select.as_mut(),
        stmt.update.as_mut(),
        stmt.from.as_mut(),
        stmt.using.as_mut(),
        stmt.set.as_mut(),
        stmt.where_clause.as_mut(),
        stmt.group_by.as_mut(),
        stmt.having.as_mut(),
        stmt.order_by.as_mut(),
        stmt.values.as_mut(),
        stmt.on_duplicate.as_mut(),
    ];
    for clause in clauses.into_iter().flatten() {
        annotate_nodes(sql, clause, cursor);
    }
}

fn annotate_nodes(sql: &str, nodes: &mut [ExpressionNode], cursor: &mut usize) {
    for node in nodes {
        annotate_node(sql, node, cursor);
    }
}

fn annotate_node(sql: &str, node: &mut ExpressionNode, cursor: &mut usize) {
    if node.base_expr.is_empty() {
        return;
    }
    let Some(found) = sql.get(*cursor..).and_then(|rest| rest.find(&node.base_expr)) else {
        return;
    };
    let start = *cursor + found;
    node.span = Some(Span {
        start,
        len: node.base_expr.len(),
    });

    // children live inside or right after the node's own text
    *cursor = start;
    if let Some(children) = node.sub_tree.as_mut() {
        annotate_nodes(sql, children, cursor);
    }
    if let Some(refs) = node.ref_clause.as_mut() {
        annotate_nodes(sql, refs, cursor);
    }
    if let Some(subquery) = node.subquery.as_mut() {
        annotate_query(sql, subquery, cursor);
    }
    *cursor = (*cursor).max(start + node.base_expr.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn spans_of(sql: &str) -> Query {
        let mut query = parse(sql).unwrap();
        set_positions(sql, &mut query);
        query
    }

    #[test]
    fn select_columns_are_located() {
        let sql = "SELECT a, b FROM t WHERE a = 1";
        let query = spans_of(sql);
        let stmt = query.as_statement().unwrap();

        let select = stmt.select.as_ref().unwrap();
        assert_eq!(select[0].span, Some(Span { start: 7, len: 1 }));
        assert_eq!(select[1].span, Some(Span { start: 10, len: 1 }));

        // the second `a` resolves past the first one
        let where_clause = stmt.where_clause.as_ref().unwrap();
        assert_eq!(where_clause[0].span, Some(Span { start: 25, len: 1 }));
    }

    #[test]
    fn from_term_is_located() {
        let sql = "SELECT a FROM tbl";
        let query = spans_of(sql);
        let stmt = query.as_statement().unwrap();
        let from = stmt.from.as_ref().unwrap();
        assert_eq!(from[0].span, Some(Span { start: 14, len: 3 }));
    }

    #[test]
    fn subquery_nodes_are_located() {
        let sql = "SELECT a FROM t WHERE x = (SELECT y FROM u)";
        let query = spans_of(sql);
        let stmt = query.as_statement().unwrap();
        let where_clause = stmt.where_clause.as_ref().unwrap();
        let sub = where_clause[2].subquery.as_ref().unwrap();
        let inner = sub.as_statement().unwrap();
        let y = &inner.select.as_ref().unwrap()[0];
        assert_eq!(y.span, Some(Span { start: 34, len: 1 }));
    }

    #[test]
    fn missing_text_leaves_span_empty() {
        // the sign is folded into the literal, `-  5` is not a substring
        let sql = "SELECT a FROM t WHERE x = -  5";
        let query = spans_of(sql);
        let stmt = query.as_statement().unwrap();
        let where_clause = stmt.where_clause.as_ref().unwrap();
        assert_eq!(where_clause[2].base_expr, "-5");
        assert_eq!(where_clause[2].span, None);
    }
}
