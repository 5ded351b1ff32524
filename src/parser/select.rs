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

//! SELECT list.
//!
//! The clause is split at top-level commas; every item gets its alias
//! detected (explicit `AS`, or a trailing bare column reference) and its
//! expression built. Items whose expression is a single non-subquery node
//! are flattened to that node so `SELECT a` yields a plain column
//! reference rather than a one-child expression wrapper.

use super::*;
use crate::ast::{Alias, ExpressionNode, NodeKind};

impl Parser {
    pub(crate) fn select_list(
        &self,
        tokens: &[Token],
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        let mut items = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        for token in tokens {
            if token.is_comma() {
                if current.iter().any(|t| !t.is_whitespace()) {
                    items.push(self.select_item(&current, depth)?);
                }
                current.clear();
            } else {
                current.push(token.clone());
            }
        }
        if current.iter().any(|t| !t.is_whitespace()) {
            items.push(self.select_item(&current, depth)?);
        }
        Ok(items)
    }

    /// One SELECT-list item: alias plus expression. Also used for ORDER
    /// BY/GROUP BY items that are full expressions.
    pub(crate) fn select_item(
        &self,
        tokens: &[Token],
        depth: usize,
    ) -> Result<ExpressionNode, ParserError> {
        // explicit alias: everything from AS on is the alias, the name
        // being the concatenation of its non-whitespace non-comment tokens
        let mut alias = None;
        let mut expression = tokens;
        if let Some(as_idx) = tokens.iter().position(|t| t.upper() == "AS") {
            let name: String = tokens[as_idx + 1..]
                .iter()
                .filter(|t| !t.is_whitespace() && !t.is_comment())
                .map(|t| t.text.clone())
                .collect();
            let base: String = tokens[as_idx..].iter().map(|t| t.text.clone()).collect();
            alias = Some(Alias {
                explicit: true,
                name: unquote(name.trim()).to_string(),
                base_expr: base.trim().to_string(),
            });
            expression = &tokens[..as_idx];
        }

        let mut nodes = self.expr_list(expression, depth)?;

        // no AS: a trailing column reference after a complete operand is an
        // implicit alias
        if alias.is_none() && nodes.len() >= 2 {
            let last_is_alias = nodes[nodes.len() - 1].kind == NodeKind::ColumnReference
                && matches!(
                    nodes[nodes.len() - 2].kind,
                    NodeKind::Reserved
                        | NodeKind::Constant
                        | NodeKind::AggregateFunction
                        | NodeKind::SimpleFunction
                        | NodeKind::Expression
                        | NodeKind::Subquery
                        | NodeKind::ColumnReference
                        | NodeKind::BracketedExpression
                );
            if last_is_alias {
                if let Some(last) = nodes.pop() {
                    alias = Some(Alias {
                        explicit: false,
                        name: unquote(&last.base_expr).to_string(),
                        base_expr: last.base_expr,
                    });
                }
                // drop the alias token from the reconstructed text as well
                if let Some(idx) = expression.iter().rposition(|t| !t.is_whitespace()) {
                    expression = &expression[..idx];
                }
            }
        }

        let base_expr: String = expression.iter().map(|t| t.text.clone()).collect();
        let mut item = if nodes.len() == 1 && nodes[0].kind != NodeKind::Subquery {
            match nodes.pop() {
                Some(node) => node,
                None => ExpressionNode::new(NodeKind::Expression, base_expr.trim()),
            }
        } else {
            ExpressionNode::with_children(NodeKind::Expression, base_expr.trim(), nodes)
        };
        item.alias = alias;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::tokenizer::Tokenizer;

    fn select(sql: &str) -> Vec<ExpressionNode> {
        let tokens = Tokenizer::new(sql).tokenize().unwrap();
        Parser::new().select_list(&tokens, 0).unwrap()
    }

    #[test]
    fn plain_columns() {
        let items = select("a, b.c");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, NodeKind::ColumnReference);
        assert_eq!(items[0].base_expr, "a");
        assert!(items[0].alias.is_none());
        assert_eq!(items[1].base_expr, "b.c");
    }

    #[test]
    fn explicit_alias() {
        let items = select("a AS x");
        let alias = items[0].alias.as_ref().unwrap();
        assert!(alias.explicit);
        assert_eq!(alias.name, "x");
        assert_eq!(alias.base_expr, "AS x");
        assert_eq!(items[0].base_expr, "a");
    }

    #[test]
    fn explicit_alias_is_unquoted() {
        let items = select("a AS `the alias`");
        assert_eq!(items[0].alias.as_ref().unwrap().name, "the alias");
    }

    #[test]
    fn implicit_alias() {
        let items = select("a x");
        let alias = items[0].alias.as_ref().unwrap();
        assert!(!alias.explicit);
        assert_eq!(alias.name, "x");
        assert_eq!(items[0].kind, NodeKind::ColumnReference);
        assert_eq!(items[0].base_expr, "a");
    }

    #[test]
    fn single_column_is_not_its_own_alias() {
        let items = select("a");
        assert!(items[0].alias.is_none());
    }

    #[test]
    fn star_has_no_alias() {
        let items = select("t.*");
        assert_eq!(items.len(), 1);
        assert!(items[0].alias.is_none());
        assert_eq!(items[0].base_expr, "t.*");
    }

    #[test]
    fn function_item_is_flattened() {
        let items = select("concat(a, b) name");
        assert_eq!(items[0].kind, NodeKind::SimpleFunction);
        assert_eq!(items[0].base_expr, "concat");
        assert_eq!(items[0].alias.as_ref().unwrap().name, "name");
        assert_eq!(items[0].sub_tree.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn arithmetic_item_is_an_expression() {
        let items = select("a + b");
        assert_eq!(items[0].kind, NodeKind::Expression);
        assert_eq!(items[0].base_expr, "a + b");
        assert_eq!(items[0].sub_tree.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn subquery_item_keeps_the_wrapper() {
        let items = select("(SELECT max(b) FROM t) m");
        assert_eq!(items[0].kind, NodeKind::Expression);
        let inner = items[0].sub_tree.as_ref().unwrap();
        assert_eq!(inner[0].kind, NodeKind::Subquery);
        assert_eq!(items[0].alias.as_ref().unwrap().name, "m");
    }

    #[test]
    fn multi_token_alias_name() {
        let items = select("a AS `x` /* c */");
        assert_eq!(items[0].alias.as_ref().unwrap().name, "x");
    }
}
