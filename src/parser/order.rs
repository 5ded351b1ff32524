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

//! ORDER BY and GROUP BY.
//!
//! Items are resolved against the SELECT list first: a bare number is an
//! ordinal position, a name matching a SELECT-list alias is an alias
//! reference, anything else is a full expression. Only ORDER BY items
//! carry a direction; `ASC` is the default.

use super::expr::is_numeric;
use super::*;
use crate::ast::{ExpressionNode, NodeKind, OrderDirection};

impl Parser {
    pub(crate) fn order_list(
        &self,
        tokens: &[Token],
        select: &[ExpressionNode],
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        self.order_group(tokens, select, depth, true)
    }

    pub(crate) fn group_list(
        &self,
        tokens: &[Token],
        select: &[ExpressionNode],
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        self.order_group(tokens, select, depth, false)
    }

    fn order_group(
        &self,
        tokens: &[Token],
        select: &[ExpressionNode],
        depth: usize,
        with_direction: bool,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        let mut out = Vec::new();
        let mut expr = String::new();
        let mut direction = OrderDirection::Asc;

        for token in tokens {
            match token.upper().as_str() {
                "," => {
                    if let Some(item) =
                        self.order_item(&expr, direction, select, depth, with_direction)?
                    {
                        out.push(item);
                    }
                    expr.clear();
                    direction = OrderDirection::Asc;
                }
                "ASC" if with_direction => direction = OrderDirection::Asc,
                "DESC" if with_direction => direction = OrderDirection::Desc,
                _ => expr.push_str(&token.text),
            }
        }
        if let Some(item) = self.order_item(&expr, direction, select, depth, with_direction)? {
            out.push(item);
        }
        Ok(out)
    }

    fn order_item(
        &self,
        expr: &str,
        direction: OrderDirection,
        select: &[ExpressionNode],
        depth: usize,
        with_direction: bool,
    ) -> Result<Option<ExpressionNode>, ParserError> {
        let expr = unquote(expr.trim()).trim();
        if expr.is_empty() {
            return Ok(None);
        }

        let mut node = if is_numeric(expr) {
            ExpressionNode::new(NodeKind::Position, expr)
        } else if names_select_alias(expr, select) {
            ExpressionNode::new(NodeKind::AliasReference, expr)
        } else {
            let tokens = Tokenizer::new(expr).tokenize()?;
            let mut item = self.select_item(&tokens, depth)?;
            item.alias = None;
            item
        };

        if with_direction {
            node.direction = Some(direction);
        }
        Ok(Some(node))
    }
}

fn names_select_alias(expr: &str, select: &[ExpressionNode]) -> bool {
    select
        .iter()
        .filter_map(|item| item.alias.as_ref())
        .any(|alias| alias.name == expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeKind, OrderDirection};
    use crate::tokenizer::Tokenizer;

    fn order(order_sql: &str, select_sql: &str) -> Vec<ExpressionNode> {
        let parser = Parser::new();
        let select_tokens = Tokenizer::new(select_sql).tokenize().unwrap();
        let select = parser.select_list(&select_tokens, 0).unwrap();
        let tokens = Tokenizer::new(order_sql).tokenize().unwrap();
        parser.order_list(&tokens, &select, 0).unwrap()
    }

    #[test]
    fn default_direction_is_ascending() {
        let items = order("a", "a, b");
        assert_eq!(items[0].kind, NodeKind::ColumnReference);
        assert_eq!(items[0].direction, Some(OrderDirection::Asc));
    }

    #[test]
    fn desc_is_captured() {
        let items = order("a DESC, b", "a, b");
        assert_eq!(items[0].direction, Some(OrderDirection::Desc));
        assert_eq!(items[1].direction, Some(OrderDirection::Asc));
    }

    #[test]
    fn ordinal_position() {
        let items = order("2", "a, b");
        assert_eq!(items[0].kind, NodeKind::Position);
        assert_eq!(items[0].base_expr, "2");
    }

    #[test]
    fn select_alias_is_a_reference() {
        let items = order("total", "SUM(x) AS total");
        assert_eq!(items[0].kind, NodeKind::AliasReference);
        assert_eq!(items[0].base_expr, "total");
    }

    #[test]
    fn expression_item() {
        let items = order("LOWER(name)", "id");
        assert_eq!(items[0].kind, NodeKind::SimpleFunction);
        assert_eq!(items[0].base_expr, "LOWER");
        assert!(items[0].alias.is_none());
    }

    #[test]
    fn backticks_are_stripped() {
        let items = order("`a`", "x");
        assert_eq!(items[0].base_expr, "a");
    }

    #[test]
    fn group_by_carries_no_direction() {
        let parser = Parser::new();
        let tokens = Tokenizer::new("a, b").tokenize().unwrap();
        let items = parser.group_list(&tokens, &[], 0).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.direction.is_none()));
    }
}
