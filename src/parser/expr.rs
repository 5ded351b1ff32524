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

//! Expression lists.
//!
//! WHERE and HAVING clauses, function arguments, `IN` lists and the bodies
//! of bracketed groups are all flat expression lists: each token becomes a
//! node, classified with one token of lookback. A parenthesis group after
//! a column reference turns that reference into a function call; after
//! `IN` it becomes the value list; a group shaped like `(select ...)`
//! re-enters the parser as a subquery.

use super::*;
use crate::ast::{ExpressionNode, NodeKind};

/// Keywords and symbols that always classify as [`NodeKind::Operator`].
const OPERATORS: &[&str] = &[
    "!", "!=", "%", "&", "&&", "/", ":=", "<", "<<", "<=", "<=>", "<>", "=", ">", ">=", ">>", "AND",
    "BETWEEN", "BINARY", "DIV", "IN", "IS", "LIKE", "NOT", "OR", "REGEXP", "RLIKE", "SOUNDS",
    "XOR", "^", "|", "||", "~",
];

impl Parser {
    /// Build an expression list from the tokens of one clause.
    pub(crate) fn expr_list(
        &self,
        tokens: &[Token],
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        let depth = self.nested(depth)?;
        let mut expr: Vec<ExpressionNode> = Vec::new();
        let mut prev_upper = String::new();
        let mut prev_kind: Option<NodeKind> = None;

        for token in tokens {
            let trim = token.trimmed();
            if trim.is_empty() || token.is_comment() {
                continue;
            }
            let upper = token.upper();
            let is_group = trim.starts_with('(') && trim.ends_with(')');

            if self.is_strict() && prev_upper == "IN" && !is_group {
                return Err(ParserError::MalformedInList(trim.to_string()));
            }
            if self.is_strict() && prev_upper == "EXISTS" && !starts_with_subselect(trim) {
                return Err(ParserError::MalformedSubquery(trim.to_string()));
            }

            let mut kind: Option<NodeKind> = None;
            let mut children: Option<Vec<ExpressionNode>> = None;
            let mut subquery: Option<Query> = None;
            let mut base = trim.to_string();

            if starts_with_subselect(trim) {
                subquery = Some(self.parse_str(remove_parenthesis(trim), depth)?);
                kind = Some(NodeKind::Subquery);
            } else if is_group {
                // a column reference followed by a parenthesis pair is not
                // a column reference, it is a function call
                if matches!(
                    prev_kind,
                    Some(NodeKind::ColumnReference)
                        | Some(NodeKind::SimpleFunction)
                        | Some(NodeKind::AggregateFunction)
                ) {
                    children = Some(self.argument_list(trim, depth)?);
                    if let Some(name) = expr.pop() {
                        base = name.base_expr;
                    }
                    kind = Some(match prev_kind {
                        Some(NodeKind::AggregateFunction) => NodeKind::AggregateFunction,
                        _ => NodeKind::SimpleFunction,
                    });
                    prev_upper.clear();
                    prev_kind = None;
                }
                if prev_upper == "IN" {
                    children = Some(self.argument_list(trim, depth)?);
                    kind = Some(NodeKind::InList);
                    prev_upper.clear();
                    prev_kind = None;
                }
                if prev_upper == "AGAINST" {
                    children = Some(self.argument_list(trim, depth)?);
                    kind = Some(NodeKind::MatchArguments);
                    prev_upper.clear();
                    prev_kind = None;
                }
            } else if trim.starts_with('@') {
                kind = Some(variable_kind(&upper));
            } else {
                kind = Some(match upper.as_str() {
                    // `*` is the all-columns operand only at the start of a
                    // list or after something that cannot be a left operand;
                    // a preceding dangling-dot reference absorbs it
                    "*" => match expr.last_mut() {
                        None => NodeKind::ColumnReference,
                        Some(last) => {
                            if last.kind == NodeKind::ColumnReference
                                && last.base_expr.ends_with('.')
                            {
                                last.base_expr.push('*');
                                continue;
                            }
                            if matches!(
                                last.kind,
                                NodeKind::ColumnReference
                                    | NodeKind::Constant
                                    | NodeKind::Expression
                            ) {
                                NodeKind::Operator
                            } else {
                                NodeKind::ColumnReference
                            }
                        }
                    },
                    "NULL" => NodeKind::Constant,
                    // preceding sign or binary operator, depending on what
                    // came before
                    "-" | "+" => {
                        if matches!(
                            prev_kind,
                            Some(NodeKind::ColumnReference)
                                | Some(NodeKind::SimpleFunction)
                                | Some(NodeKind::AggregateFunction)
                                | Some(NodeKind::Constant)
                                | Some(NodeKind::Subquery)
                                | Some(NodeKind::Expression)
                                | Some(NodeKind::BracketedExpression)
                        ) {
                            NodeKind::Operator
                        } else {
                            NodeKind::Sign
                        }
                    }
                    u if OPERATORS.contains(&u) => NodeKind::Operator,
                    _ => match trim.as_bytes()[0] {
                        b'\'' | b'"' => NodeKind::Constant,
                        b'`' => NodeKind::ColumnReference,
                        _ => {
                            if is_numeric(trim) {
                                // fold a preceding sign into the literal
                                if prev_kind == Some(NodeKind::Sign) {
                                    expr.pop();
                                    base = format!("{prev_upper}{trim}");
                                }
                                NodeKind::Constant
                            } else {
                                NodeKind::ColumnReference
                            }
                        }
                    },
                });
            }

            // reserved words trump the default classification
            if let Some(k) = kind {
                if !matches!(
                    k,
                    NodeKind::Operator
                        | NodeKind::InList
                        | NodeKind::SimpleFunction
                        | NodeKind::AggregateFunction
                ) && self.tables().is_reserved(&upper)
                {
                    kind = Some(if self.tables().is_aggregate(&upper) {
                        NodeKind::AggregateFunction
                    } else if upper == "NULL" {
                        // reserved, but a constant is more useful
                        NodeKind::Constant
                    } else if self.tables().is_function(&upper) {
                        NodeKind::SimpleFunction
                    } else {
                        NodeKind::Reserved
                    });
                }
            }

            // a parenthesis group nothing above claimed
            let kind = match kind {
                Some(k) => k,
                None => {
                    let inner = remove_parenthesis(trim);
                    let inner_tokens = Tokenizer::new(inner).tokenize()?;
                    children = Some(self.expr_list(&inner_tokens, depth)?);
                    NodeKind::BracketedExpression
                }
            };

            let mut node = ExpressionNode::new(kind, base);
            node.sub_tree = children;
            node.subquery = subquery.map(Box::new);
            expr.push(node);
            prev_upper = upper;
            prev_kind = Some(kind);
        }

        Ok(expr)
    }

    /// The expressions inside a parenthesis group, with list commas
    /// dropped. Used for function arguments, `IN` lists and `AGAINST`
    /// arguments.
    fn argument_list(
        &self,
        group: &str,
        depth: usize,
    ) -> Result<Vec<ExpressionNode>, ParserError> {
        let tokens = Tokenizer::new(remove_parenthesis(group)).tokenize()?;
        let tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.is_comma()).collect();
        self.expr_list(&tokens, depth)
    }
}

/// Variable kind from the `@`/`@@` prefix; `@@` without a scope qualifier
/// is a session variable.
fn variable_kind(upper: &str) -> NodeKind {
    if !upper.starts_with("@@") {
        return NodeKind::UserVariable;
    }
    let scope = &upper[2..upper.find('.').unwrap_or(upper.len())];
    match scope {
        "GLOBAL" => NodeKind::GlobalVariable,
        "LOCAL" => NodeKind::LocalVariable,
        _ => NodeKind::SessionVariable,
    }
}

/// A numeric literal. `f64` parsing also accepts the words `nan` and
/// `inf`, which must stay column references, so a digit is required.
pub(crate) fn is_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit()) && s.parse::<f64>().is_ok()
}
