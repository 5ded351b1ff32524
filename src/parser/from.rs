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

//! FROM clause and join graph.
//!
//! The clause is a flat list of join terms separated by commas and `JOIN`
//! keywords. A term's join type is buffered one term ahead: `LEFT`,
//! `RIGHT`, `STRAIGHT_JOIN` and the comma (which reads as `CROSS`) set the
//! type of the term that follows the separator, while the first term and a
//! plain or explicit-`CROSS` `JOIN` get the default `JOIN`. Everything a
//! term consumed, its `ON`/`USING` text included, stays in `base_expr`;
//! the qualifier expression is additionally parsed into `ref_clause`.
//!
//! A parenthesized term is a derived table: a `(SELECT ...)` body re-enters
//! the statement parser, any other body is a nested join graph and re-enters
//! this builder.

use super::*;
use crate::ast::{Alias, ExpressionNode, JoinType, NodeKind, RefType};

/// Accumulator for one join term.
struct FromState {
    expression: String,
    token_count: usize,
    table: String,
    alias: Option<Alias>,
    next_join_type: Option<JoinType>,
    saved_join_type: JoinType,
    ref_type: Option<RefType>,
    ref_expr: Option<String>,
}

impl FromState {
    fn new() -> FromState {
        FromState {
            expression: String::new(),
            token_count: 0,
            table: String::new(),
            alias: None,
            next_join_type: None,
            saved_join_type: JoinType::Join,
            ref_type: None,
            ref_expr: None,
        }
    }

    /// Reset the per-term fields; the buffered join type carries over.
    fn next_term(&mut self) {
        self.expression.clear();
        self.token_count = 0;
        self.table.clear();
        self.alias = None;
        self.ref_type = None;
        self.ref_expr = None;
    }

    fn is_empty(&self) -> bool {
        self.expression.trim().is_empty() && self.table.trim().is_empty()
    }
}

impl Parser {
    pub(crate) fn from_list(
        &self,
        tokens: &[Token],
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        let depth = self.nested(depth)?;
        let mut expr = Vec::new();
        let mut state = FromState::new();
        let mut skip_next = false;

        for (i, token) in tokens.iter().enumerate() {
            let upper = token.upper();

            if skip_next {
                if !token.is_whitespace() {
                    state.token_count += 1;
                    skip_next = false;
                }
                continue;
            }

            // join separators and type keywords never reach the term text
            if !matches!(
                upper.as_str(),
                "OUTER" | "LEFT" | "RIGHT" | "NATURAL" | "CROSS" | "," | "JOIN" | "INNER"
            ) {
                state.expression.push_str(&token.text);
                if let Some(ref_expr) = &mut state.ref_expr {
                    ref_expr.push_str(&token.text);
                }
            }

            match upper.as_str() {
                "AS" => {
                    let mut base = token.text.clone();
                    let mut name = String::new();
                    for next in &tokens[i + 1..] {
                        base.push_str(&next.text);
                        if !next.is_whitespace() {
                            name = next.trimmed().to_string();
                            break;
                        }
                    }
                    state.alias = Some(Alias {
                        explicit: true,
                        name,
                        base_expr: base.trim().to_string(),
                    });
                    state.token_count += 1;
                }

                "ON" | "USING" => {
                    state.ref_type = Some(if upper == "ON" {
                        RefType::On
                    } else {
                        RefType::Using
                    });
                    state.ref_expr = Some(String::new());
                    state.token_count += 1;
                }

                "CROSS" | "USE" | "FORCE" | "IGNORE" | "INNER" | "OUTER" | "NATURAL" => {
                    state.token_count += 1;
                }

                // USE INDEX (...), FORCE INDEX (...): hint text only
                "INDEX" => {}

                "FOR" => {
                    state.token_count += 1;
                    skip_next = true;
                }

                "LEFT" | "RIGHT" | "STRAIGHT_JOIN" => {
                    state.next_join_type = Some(match upper.as_str() {
                        "LEFT" => JoinType::Left,
                        "RIGHT" => JoinType::Right,
                        _ => JoinType::StraightJoin,
                    });
                }

                "," | "JOIN" => {
                    if upper == "," {
                        state.next_join_type = Some(JoinType::Cross);
                    }
                    expr.push(self.from_term(&mut state, depth)?);
                    state.next_term();
                }

                "" => {}

                _ => {
                    if state.token_count == 0 {
                        if state.table.is_empty() {
                            state.table = token.trimmed().to_string();
                        }
                    } else if state.token_count == 1 {
                        state.alias = Some(Alias {
                            explicit: false,
                            name: token.trimmed().to_string(),
                            base_expr: token.trimmed().to_string(),
                        });
                    }
                    state.token_count += 1;
                }
            }
        }

        if !state.is_empty() || expr.is_empty() {
            expr.push(self.from_term(&mut state, depth)?);
        }
        Ok(expr)
    }

    /// Close the current term: exchange the buffered join type, parse the
    /// qualifier, and resolve derived tables.
    fn from_term(
        &self,
        state: &mut FromState,
        depth: usize,
    ) -> Result<ExpressionNode, ParserError> {
        let join_type = state.saved_join_type;
        state.saved_join_type = state.next_join_type.take().unwrap_or(JoinType::Join);

        let ref_clause = match state.ref_expr.take() {
            Some(raw) => {
                let tokens = Tokenizer::new(remove_parenthesis(&raw)).tokenize()?;
                let tokens: Vec<Token> =
                    tokens.into_iter().filter(|t| !t.is_comma()).collect();
                Some(self.expr_list(&tokens, depth)?)
            }
            None => None,
        };

        let table = state.table.trim().to_string();
        let mut node = if table.starts_with('(') {
            let inner = remove_parenthesis(&table).to_string();
            if starts_with_select(&inner) {
                let parsed = self.parse_str(&inner, depth)?;
                ExpressionNode::with_subquery(NodeKind::Subquery, inner.trim(), parsed)
            } else {
                let tokens = Tokenizer::new(&inner).tokenize()?;
                let branches = self.from_list(&tokens, depth)?;
                ExpressionNode::with_children(NodeKind::TableExpression, inner.trim(), branches)
            }
        } else {
            let mut node = ExpressionNode::new(NodeKind::Table, state.expression.trim());
            node.table = Some(table);
            node
        };

        node.alias = state.alias.take();
        node.join_type = Some(join_type);
        node.ref_type = state.ref_type.take();
        node.ref_clause = ref_clause;
        Ok(node)
    }
}

fn starts_with_select(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed
        .get(..6)
        .is_some_and(|p| p.eq_ignore_ascii_case("select"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{JoinType, NodeKind, RefType};
    use crate::tokenizer::Tokenizer;

    fn from(sql: &str) -> Vec<ExpressionNode> {
        let tokens = Tokenizer::new(sql).tokenize().unwrap();
        Parser::new().from_list(&tokens, 0).unwrap()
    }

    #[test]
    fn single_table() {
        let terms = from("t");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].kind, NodeKind::Table);
        assert_eq!(terms[0].table.as_deref(), Some("t"));
        assert_eq!(terms[0].join_type, Some(JoinType::Join));
        assert!(terms[0].alias.is_none());
    }

    #[test]
    fn implicit_and_explicit_alias() {
        let terms = from("t1 x JOIN t2 AS y ON t1.a = t2.a");
        let a0 = terms[0].alias.as_ref().unwrap();
        assert!(!a0.explicit);
        assert_eq!(a0.name, "x");
        let a1 = terms[1].alias.as_ref().unwrap();
        assert!(a1.explicit);
        assert_eq!(a1.name, "y");
        assert_eq!(a1.base_expr, "AS y");
    }

    #[test]
    fn comma_buffers_a_cross_join() {
        let terms = from("a, b JOIN c");
        let types: Vec<_> = terms.iter().map(|t| t.join_type.unwrap()).collect();
        assert_eq!(types, vec![JoinType::Join, JoinType::Cross, JoinType::Join]);
    }

    #[test]
    fn explicit_cross_join_reads_as_join() {
        let terms = from("a CROSS JOIN b");
        assert_eq!(terms[1].join_type, Some(JoinType::Join));
    }

    #[test]
    fn left_join_buffers_one_term_ahead() {
        let terms = from("a JOIN b LEFT JOIN c");
        let types: Vec<_> = terms.iter().map(|t| t.join_type.unwrap()).collect();
        assert_eq!(types, vec![JoinType::Join, JoinType::Join, JoinType::Left]);
    }

    #[test]
    fn on_clause_is_parsed_and_kept_in_text() {
        let terms = from("a JOIN b ON a.id = b.id");
        assert_eq!(terms[1].ref_type, Some(RefType::On));
        let on = terms[1].ref_clause.as_ref().unwrap();
        assert_eq!(on.len(), 3);
        assert_eq!(on[0].base_expr, "a.id");
        assert!(terms[1].base_expr.contains("ON a.id = b.id"));
    }

    #[test]
    fn using_columns() {
        let terms = from("a JOIN b USING (id, org)");
        assert_eq!(terms[1].ref_type, Some(RefType::Using));
        let cols = terms[1].ref_clause.as_ref().unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[1].base_expr, "org");
    }

    #[test]
    fn derived_table_is_a_subquery() {
        let terms = from("(SELECT a FROM t) AS d");
        assert_eq!(terms[0].kind, NodeKind::Subquery);
        assert!(terms[0].subquery.is_some());
        assert_eq!(terms[0].alias.as_ref().unwrap().name, "d");
    }

    #[test]
    fn parenthesized_join_graph_is_a_table_expression() {
        let terms = from("(a JOIN b ON a.x = b.x) JOIN c");
        assert_eq!(terms[0].kind, NodeKind::TableExpression);
        let inner = terms[0].sub_tree.as_ref().unwrap();
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[1].ref_type, Some(RefType::On));
        assert_eq!(terms[1].table.as_deref(), Some("c"));
    }

    #[test]
    fn natural_join_does_not_become_an_alias() {
        let terms = from("a NATURAL JOIN b");
        assert!(terms[0].alias.is_none());
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn index_hints_stay_in_the_term_text() {
        let terms = from("t USE INDEX (i)");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].table.as_deref(), Some("t"));
        assert!(terms[0].base_expr.contains("USE INDEX (i)"));
        assert!(terms[0].alias.is_none());
    }
}
