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

//! A permissive, non-validating parser for the MySQL dialect of SQL.
//!
//! The parser splits a statement into clause buckets, builds a typed tree
//! for each clause, and keeps the verbatim source text on every node so
//! the statement can be reassembled from the tree. It does not check the
//! input against the SQL grammar: structurally odd statements produce a
//! best-effort tree instead of an error, which makes it suitable for
//! query logging, rewriting and analysis tools that must accept whatever
//! a server accepted.
//!
//! Example:
//!
//! ```
//! use mysqlparse::{parse, NodeKind};
//!
//! let query = parse("SELECT a, SUM(b) AS total FROM t GROUP BY a").unwrap();
//! let stmt = query.as_statement().unwrap();
//!
//! let select = stmt.select.as_ref().unwrap();
//! assert_eq!(select[0].kind, NodeKind::ColumnReference);
//! assert_eq!(select[1].kind, NodeKind::AggregateFunction);
//! assert_eq!(select[1].alias.as_ref().unwrap().name, "total");
//!
//! let from = stmt.from.as_ref().unwrap();
//! assert_eq!(from[0].table.as_deref(), Some("t"));
//! ```

#![warn(clippy::all)]

pub mod annotate;
pub mod ast;
pub mod keywords;
pub mod parser;
pub mod tokenizer;

pub use crate::annotate::set_positions;
pub use crate::ast::{
    Alias, Clause, DeleteTarget, ExpressionNode, InsertKind, InsertTarget, JoinType, Limit,
    NodeKind, OrderDirection, Query, RefType, Span, Statement, Token, UnionType,
};
pub use crate::keywords::SymbolTables;
pub use crate::parser::{parse, parse_expression, Parser, ParserError};
pub use crate::tokenizer::{Tokenizer, TokenizerError};
