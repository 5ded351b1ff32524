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

//! SQL Tokenizer
//!
//! Splits a statement into string lexemes the clause classifier and the
//! expression builder can consume. The tokenizer is deliberately coarse:
//! it preserves every byte of the input (concatenating all token texts
//! reproduces the statement), keeps whitespace and comments as their own
//! tokens, emits quoted strings and backtick identifiers as single atomic
//! tokens, merges dotted identifier paths (`db.tbl.col`, trailing `t.`)
//! and finally collapses every balanced parenthesis span into one token,
//! so the parser sees `(...)` groups whole.

use core::fmt;
use core::iter::Peekable;
use core::str::CharIndices;

use crate::ast::Token;

/// Tokenizer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerError {
    pub message: String,
    pub line: u64,
    pub col: u64,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at Line: {}, Column {}",
            self.message, self.line, self.col
        )
    }
}

impl std::error::Error for TokenizerError {}

/// SQL Tokenizer
pub struct Tokenizer<'a> {
    sql: &'a str,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the specified SQL statement
    pub fn new(sql: &'a str) -> Self {
        Tokenizer { sql }
    }

    /// Tokenize the statement and produce a vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>, TokenizerError> {
        let mut chars = self.sql.char_indices().peekable();
        let mut tokens = Vec::new();

        while let Some(&(start, ch)) = chars.peek() {
            let token = match ch {
                c if c.is_whitespace() => {
                    consume_while(&mut chars, |c| c.is_whitespace());
                    self.slice(start, &mut chars)
                }
                '-' => {
                    chars.next();
                    if matches!(chars.peek(), Some((_, '-'))) {
                        consume_while(&mut chars, |c| c != '\n');
                        self.slice(start, &mut chars)
                    } else {
                        self.slice(start, &mut chars)
                    }
                }
                '#' => {
                    consume_while(&mut chars, |c| c != '\n');
                    self.slice(start, &mut chars)
                }
                '/' => {
                    chars.next();
                    if matches!(chars.peek(), Some((_, '*'))) {
                        chars.next();
                        self.consume_block_comment(start, &mut chars)?
                    } else {
                        self.slice(start, &mut chars)
                    }
                }
                '\'' | '"' | '`' => {
                    let quoted = self.consume_quoted(start, &mut chars)?;
                    // a backtick identifier may start a dotted path
                    if ch == '`' {
                        self.continue_path(start, &mut chars)
                    } else {
                        quoted
                    }
                }
                '@' => {
                    chars.next();
                    if matches!(chars.peek(), Some((_, '@'))) {
                        chars.next();
                    }
                    consume_while(&mut chars, |c| {
                        is_identifier_part(c) || c == '.'
                    });
                    self.slice(start, &mut chars)
                }
                c if c.is_ascii_digit() => {
                    consume_while(&mut chars, |c| c.is_ascii_digit());
                    if matches!(chars.peek(), Some((_, '.'))) {
                        let mut ahead = chars.clone();
                        ahead.next();
                        if matches!(ahead.peek(), Some((_, d)) if d.is_ascii_digit()) {
                            chars.next();
                            consume_while(&mut chars, |c| c.is_ascii_digit());
                        }
                    }
                    self.slice(start, &mut chars)
                }
                c if is_identifier_start(c) => {
                    consume_while(&mut chars, is_identifier_part);
                    self.continue_path(start, &mut chars)
                }
                '<' => {
                    chars.next();
                    match chars.peek() {
                        Some((_, '=')) => {
                            chars.next();
                            if matches!(chars.peek(), Some((_, '>'))) {
                                chars.next();
                            }
                        }
                        Some((_, '>')) | Some((_, '<')) => {
                            chars.next();
                        }
                        _ => {}
                    }
                    self.slice(start, &mut chars)
                }
                '>' => {
                    chars.next();
                    if matches!(chars.peek(), Some((_, '=')) | Some((_, '>'))) {
                        chars.next();
                    }
                    self.slice(start, &mut chars)
                }
                '!' => {
                    chars.next();
                    if matches!(chars.peek(), Some((_, '='))) {
                        chars.next();
                    }
                    self.slice(start, &mut chars)
                }
                '&' | '|' => {
                    chars.next();
                    if matches!(chars.peek(), Some(&(_, c2)) if c2 == ch) {
                        chars.next();
                    }
                    self.slice(start, &mut chars)
                }
                ':' => {
                    chars.next();
                    if matches!(chars.peek(), Some((_, '='))) {
                        chars.next();
                    }
                    self.slice(start, &mut chars)
                }
                _ => {
                    chars.next();
                    self.slice(start, &mut chars)
                }
            };
            tokens.push(token);
        }

        Ok(balance_parenthesis(tokens))
    }

    /// The source substring from `start` to the current scan position.
    fn slice(&self, start: usize, chars: &mut Peekable<CharIndices>) -> Token {
        let end = chars.peek().map(|&(i, _)| i).unwrap_or(self.sql.len());
        Token::new(&self.sql[start..end])
    }

    fn consume_block_comment(
        &self,
        start: usize,
        chars: &mut Peekable<CharIndices>,
    ) -> Result<Token, TokenizerError> {
        let mut last = ' ';
        for (_, c) in chars.by_ref() {
            if last == '*' && c == '/' {
                return Ok(self.slice(start, chars));
            }
            last = c;
        }
        Err(self.error(start, "Unterminated multi-line comment"))
    }

    /// Consume a `'...'`, `"..."` or `` `...` `` literal, honoring
    /// backslash escapes and doubled closing quotes.
    fn consume_quoted(
        &self,
        start: usize,
        chars: &mut Peekable<CharIndices>,
    ) -> Result<Token, TokenizerError> {
        let (_, quote) = chars.next().expect("caller peeked the quote");
        while let Some((_, c)) = chars.next() {
            if c == '\\' && quote != '`' {
                chars.next();
            } else if c == quote {
                if matches!(chars.peek(), Some(&(_, c2)) if c2 == quote) {
                    chars.next();
                } else {
                    return Ok(self.slice(start, chars));
                }
            }
        }
        Err(self.error(start, &format!("Unterminated quote {quote}")))
    }

    /// Extend an identifier token across `.`-separated segments, so
    /// `db.tbl.col` and the trailing-dot form `t.` stay single tokens.
    /// A segment may itself be a backtick-quoted identifier.
    fn continue_path(&self, start: usize, chars: &mut Peekable<CharIndices>) -> Token {
        while matches!(chars.peek(), Some((_, '.'))) {
            chars.next();
            match chars.peek() {
                Some(&(seg, '`')) => {
                    // recover from a lexical error inside the path by
                    // stopping before the backtick
                    if self.consume_quoted(seg, chars).is_err() {
                        break;
                    }
                }
                Some(&(_, c)) if is_identifier_start(c) => {
                    consume_while(chars, is_identifier_part);
                }
                _ => break, // trailing dot, e.g. `t.` before `*`
            }
        }
        self.slice(start, chars)
    }

    fn error(&self, offset: usize, message: &str) -> TokenizerError {
        let prefix = &self.sql[..offset];
        let line = prefix.matches('\n').count() as u64 + 1;
        let col = prefix.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) as u64 + 1;
        TokenizerError {
            message: message.to_string(),
            line,
            col,
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

fn consume_while(chars: &mut Peekable<CharIndices>, pred: impl Fn(char) -> bool) {
    while matches!(chars.peek(), Some(&(_, c)) if pred(c)) {
        chars.next();
    }
}

/// Collapse every balanced parenthesis span into a single token, nested
/// groups included. Unbalanced parens are left untouched; the parser
/// degrades gracefully on them.
fn balance_parenthesis(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].text == "(" {
            if let Some(close) = find_matching(&tokens, i) {
                let merged: String = tokens[i..=close].iter().map(|t| t.text.as_str()).collect();
                out.push(Token::new(merged));
                i = close + 1;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn find_matching(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.text.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sql: &str) -> Vec<String> {
        Tokenizer::new(sql)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn round_trips_every_byte() {
        let sql = "SELECT a.b, -- note\n 'it''s' FROM t /* x */ WHERE a >= 1.5";
        assert_eq!(texts(sql).concat(), sql);
    }

    #[test]
    fn whitespace_and_comments_are_tokens() {
        let tokens = texts("a -- rest\nb");
        assert_eq!(tokens, vec!["a", " ", "-- rest", "\n", "b"]);
    }

    #[test]
    fn dotted_paths_are_single_tokens() {
        assert_eq!(texts("db.tbl.col"), vec!["db.tbl.col"]);
        assert_eq!(texts("t.*"), vec!["t.", "*"]);
        assert_eq!(texts("db.`odd name`"), vec!["db.`odd name`"]);
    }

    #[test]
    fn parenthesis_groups_collapse() {
        assert_eq!(
            texts("foo(a, b) + (1)"),
            vec!["foo", "(a, b)", " ", "+", " ", "(1)"]
        );
        assert_eq!(texts("((a) + (b))"), vec!["((a) + (b))"]);
    }

    #[test]
    fn unbalanced_parens_are_left_alone() {
        assert_eq!(texts("(a"), vec!["(", "a"]);
    }

    #[test]
    fn variables() {
        assert_eq!(texts("@x @@session.sort_buffer_size"), vec![
            "@x",
            " ",
            "@@session.sort_buffer_size"
        ]);
    }

    #[test]
    fn multi_char_operators() {
        assert_eq!(
            texts("a<=>b<>c!=d<<e"),
            vec!["a", "<=>", "b", "<>", "c", "!=", "d", "<<", "e"]
        );
        assert_eq!(texts("x&&y||z"), vec!["x", "&&", "y", "||", "z"]);
        assert_eq!(texts("a&b|c"), vec!["a", "&", "b", "|", "c"]);
    }

    #[test]
    fn unterminated_quote_errors() {
        let err = Tokenizer::new("SELECT 'oops").tokenize().unwrap_err();
        assert!(err.message.contains("Unterminated"));
        assert_eq!(err.line, 1);
    }
}
