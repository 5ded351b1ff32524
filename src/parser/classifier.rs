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

//! Top-level clause classification.
//!
//! A single left-to-right walk over a statement's tokens, assigning each
//! token to a named clause bucket. Most keywords open a bucket
//! unconditionally; a handful are context-sensitive (`EVENT` only after
//! `CREATE`/`ALTER`/`DROP`, `DATA` only after `LOAD`, `USING` only inside
//! `EXECUTE` or a `DELETE`'s `FROM`, ...) and some are rewritten on the
//! way in (`LOCK` mid-statement becomes the `LOCK IN SHARE MODE` option).
//! The machine state is three values: the current bucket, the bucket of
//! the previously classified token, and a one-token skip flag.

use crate::ast::{Clause, Token};

/// Ordered collection of clause buckets, keyed by [`Clause`]. Buckets keep
/// their first-opened order, which is also the order leftovers appear in
/// [`crate::ast::Statement::other`].
#[derive(Debug, Default)]
pub(crate) struct Buckets {
    entries: Vec<(Clause, Vec<Token>)>,
}

impl Buckets {
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn has(&self, clause: Clause) -> bool {
        self.entries.iter().any(|(c, _)| *c == clause)
    }

    pub(crate) fn take(&mut self, clause: Clause) -> Option<Vec<Token>> {
        let idx = self.entries.iter().position(|(c, _)| *c == clause)?;
        Some(self.entries.remove(idx).1)
    }

    pub(crate) fn into_entries(self) -> Vec<(Clause, Vec<Token>)> {
        self.entries
    }

    fn append(&mut self, clause: Clause, token: Token) {
        match self.entries.iter_mut().find(|(c, _)| *c == clause) {
            Some((_, tokens)) => tokens.push(token),
            None => self.entries.push((clause, vec![token])),
        }
    }

    /// Store a statement marker: the bucket's sole content is the keyword
    /// itself.
    fn set_marker(&mut self, clause: Clause, text: &str) {
        if !self.has(clause) {
            self.entries.push((clause, vec![Token::new(text)]));
        }
    }

    fn append_option(&mut self, option: &str) {
        self.append(Clause::Options, Token::new(option));
    }
}

/// The classification state machine.
#[derive(Debug, Default)]
pub(crate) struct Classifier {
    current: Option<Clause>,
    prev: Option<Clause>,
    skip_next: bool,
}

impl Classifier {
    pub(crate) fn classify(tokens: &[Token]) -> Buckets {
        let mut classifier = Classifier::default();
        let mut out = Buckets::default();
        for token in tokens {
            classifier.feed(token, &mut out);
        }
        out
    }

    fn feed(&mut self, token: &Token, out: &mut Buckets) {
        let trim = token.trimmed();

        // a leading parenthesis group can only follow from a SELECT
        if !trim.is_empty() && trim.starts_with('(') && self.current.is_none() {
            self.current = Some(Clause::Select);
        }

        // the skip flag swallows the next real token; whitespace in
        // between still lands in the current bucket
        if self.skip_next {
            if trim.is_empty() {
                if let Some(current) = self.current {
                    out.append(current, token.clone());
                }
                return;
            }
            self.skip_next = false;
            self.prev = self.current;
            return;
        }

        let upper = token.upper();
        match upper.as_str() {
            // keywords that open a bucket with subclauses of its own
            "SELECT" | "ORDER" | "LIMIT" | "SET" | "DUPLICATE" | "VALUES" | "GROUP"
            | "HAVING" | "WHERE" | "RENAME" | "CALL" | "PROCEDURE" | "FUNCTION"
            | "DATABASE" | "SERVER" | "LOGFILE" | "DEFINER" | "RETURNS" | "TABLESPACE"
            | "TRIGGER" | "DO" | "PLUGIN" | "FROM" | "FLUSH" | "KILL" | "RESET" | "STOP"
            | "PURGE" | "EXECUTE" | "PREPARE" | "DEALLOCATE" => {
                if upper == "DEALLOCATE" {
                    self.skip_next = true;
                }
                // PREPARE stmt FROM 'text': this FROM is not a join FROM
                if upper == "FROM" && self.current == Some(Clause::Prepare) {
                    return;
                }
                self.current = Some(opener(&upper));
            }

            // context-gated openers
            "EVENT" => {
                if matches!(
                    self.prev,
                    Some(Clause::Drop) | Some(Clause::Alter) | Some(Clause::Create)
                ) {
                    self.current = Some(Clause::Event);
                }
            }
            "DATA" => {
                if self.prev == Some(Clause::Load) {
                    self.current = Some(Clause::Data);
                }
            }
            "PASSWORD" => {
                if self.prev == Some(Clause::Set) {
                    self.current = Some(Clause::Password);
                }
            }
            "INTO" => {
                // LOAD INDEX INTO CACHE keeps INTO inside the LOAD bucket
                if self.prev == Some(Clause::Load) {
                    out.append(Clause::Load, Token::new("INTO"));
                    return;
                }
                self.current = Some(Clause::Into);
            }
            "USER" => {
                if matches!(
                    self.prev,
                    Some(Clause::Create) | Some(Clause::Rename) | Some(Clause::Drop)
                ) {
                    self.current = Some(Clause::User);
                }
            }
            "VIEW" => {
                if matches!(
                    self.prev,
                    Some(Clause::Create) | Some(Clause::Alter) | Some(Clause::Drop)
                ) {
                    self.current = Some(Clause::View);
                }
            }

            // statement markers: the keyword identifies the statement and
            // is stored as the bucket's own content
            "DELETE" | "ALTER" | "INSERT" | "REPLACE" | "TRUNCATE" | "CREATE" | "OPTIMIZE"
            | "GRANT" | "REVOKE" | "SHOW" | "HANDLER" | "LOAD" | "ROLLBACK" | "SAVEPOINT"
            | "UNLOCK" | "INSTALL" | "UNINSTALL" | "ANALYZE" | "BACKUP" | "CHECK"
            | "CHECKSUM" | "REPAIR" | "RESTORE" | "DESCRIBE" | "EXPLAIN" | "USE" | "HELP" => {
                let clause = opener(&upper);
                self.current = Some(clause);
                out.set_marker(clause, &upper);
                return;
            }

            "CACHE" => {
                if matches!(
                    self.prev,
                    None | Some(Clause::Reset) | Some(Clause::Flush) | Some(Clause::Load)
                ) {
                    self.current = Some(Clause::Cache);
                    return;
                }
            }

            // LOCK TABLES at statement start, LOCK IN SHARE MODE elsewhere
            "LOCK" => {
                if self.current.is_none() {
                    self.current = Some(Clause::Lock);
                    out.set_marker(Clause::Lock, "LOCK");
                } else {
                    self.skip_next = true;
                    out.append_option("LOCK IN SHARE MODE");
                }
                return;
            }

            // USING with a prepared statement or a multi-table DELETE is a
            // clause of its own; in a FROM join it is an ordinary token
            "USING" => {
                if self.current == Some(Clause::Execute)
                    || (self.current == Some(Clause::From) && out.has(Clause::Delete))
                {
                    self.current = Some(Clause::Using);
                    return;
                }
            }

            // DROP TABLE vs ALTER TABLE DROP ...
            "DROP" => {
                if self.current != Some(Clause::Alter) {
                    self.current = Some(Clause::Drop);
                    out.set_marker(Clause::Drop, "DROP");
                    return;
                }
            }

            "FOR" => {
                self.skip_next = true;
                out.append_option("FOR UPDATE");
                return;
            }

            "UPDATE" => {
                if self.current.is_none() {
                    self.current = Some(Clause::Update);
                    return;
                }
                if self.current == Some(Clause::Duplicate) {
                    return;
                }
            }

            "START" => {
                self.current = Some(Clause::Start);
                out.set_marker(Clause::Start, "BEGIN");
                self.skip_next = true;
                return;
            }

            // discarded everywhere
            "BY" | "ALL" | "SHARE" | "MODE" | "TO" | ";" => return,

            "KEY" => {
                if self.current == Some(Clause::Duplicate) {
                    return;
                }
            }

            // statement options; these never open a bucket of their own
            "DISTINCT" | "DISTINCTROW" | "HIGH_PRIORITY" | "LOW_PRIORITY" | "DELAYED"
            | "IGNORE" | "FORCE" | "STRAIGHT_JOIN" | "SQL_SMALL_RESULT" | "SQL_BIG_RESULT"
            | "QUICK" | "SQL_BUFFER_RESULT" | "SQL_CACHE" | "SQL_NO_CACHE"
            | "SQL_CALC_FOUND_ROWS" => {
                let option = if upper == "DISTINCTROW" { "DISTINCT" } else { &upper };
                out.append_option(option);
                return;
            }

            "WITH" => {
                if self.current == Some(Clause::Group) {
                    self.skip_next = true;
                    out.append_option("WITH ROLLUP");
                    return;
                }
            }

            _ => {}
        }

        // the opener itself is suppressed (prev lags one token behind);
        // continuation tokens land in the open bucket
        if let Some(current) = self.current {
            if self.prev == self.current {
                out.append(current, token.clone());
            }
        }
        self.prev = self.current;
    }
}

fn opener(upper: &str) -> Clause {
    match upper {
        "SELECT" => Clause::Select,
        "ORDER" => Clause::Order,
        "LIMIT" => Clause::Limit,
        "SET" => Clause::Set,
        "DUPLICATE" => Clause::Duplicate,
        "VALUES" => Clause::Values,
        "GROUP" => Clause::Group,
        "HAVING" => Clause::Having,
        "WHERE" => Clause::Where,
        "RENAME" => Clause::Rename,
        "CALL" => Clause::Call,
        "PROCEDURE" => Clause::Procedure,
        "FUNCTION" => Clause::Function,
        "DATABASE" => Clause::Database,
        "SERVER" => Clause::Server,
        "LOGFILE" => Clause::Logfile,
        "DEFINER" => Clause::Definer,
        "RETURNS" => Clause::Returns,
        "TABLESPACE" => Clause::Tablespace,
        "TRIGGER" => Clause::Trigger,
        "DO" => Clause::Do,
        "PLUGIN" => Clause::Plugin,
        "FROM" => Clause::From,
        "FLUSH" => Clause::Flush,
        "KILL" => Clause::Kill,
        "RESET" => Clause::Reset,
        "STOP" => Clause::Stop,
        "PURGE" => Clause::Purge,
        "EXECUTE" => Clause::Execute,
        "PREPARE" => Clause::Prepare,
        "DEALLOCATE" => Clause::Deallocate,
        "DELETE" => Clause::Delete,
        "ALTER" => Clause::Alter,
        "INSERT" => Clause::Insert,
        "REPLACE" => Clause::Replace,
        "TRUNCATE" => Clause::Truncate,
        "CREATE" => Clause::Create,
        "OPTIMIZE" => Clause::Optimize,
        "GRANT" => Clause::Grant,
        "REVOKE" => Clause::Revoke,
        "SHOW" => Clause::Show,
        "HANDLER" => Clause::Handler,
        "LOAD" => Clause::Load,
        "ROLLBACK" => Clause::Rollback,
        "SAVEPOINT" => Clause::Savepoint,
        "UNLOCK" => Clause::Unlock,
        "INSTALL" => Clause::Install,
        "UNINSTALL" => Clause::Uninstall,
        "ANALYZE" => Clause::Analyze,
        "BACKUP" => Clause::Backup,
        "CHECK" => Clause::Check,
        "CHECKSUM" => Clause::Checksum,
        "REPAIR" => Clause::Repair,
        "RESTORE" => Clause::Restore,
        "DESCRIBE" => Clause::Describe,
        "EXPLAIN" => Clause::Explain,
        "USE" => Clause::Use,
        "HELP" => Clause::Help,
        _ => unreachable!("not a bucket-opening keyword: {upper}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn classify(sql: &str) -> Buckets {
        let tokens = Tokenizer::new(sql).tokenize().unwrap();
        Classifier::classify(&tokens)
    }

    fn bucket_text(buckets: &mut Buckets, clause: Clause) -> String {
        buckets
            .take(clause)
            .unwrap_or_default()
            .iter()
            .map(|t| t.text.clone())
            .collect::<String>()
            .trim()
            .to_string()
    }

    #[test]
    fn select_from_where_split() {
        let mut buckets = classify("SELECT a, b FROM t WHERE a = 1");
        assert_eq!(bucket_text(&mut buckets, Clause::Select), "a, b");
        assert_eq!(bucket_text(&mut buckets, Clause::From), "t");
        assert_eq!(bucket_text(&mut buckets, Clause::Where), "a = 1");
        assert!(buckets.is_empty());
    }

    #[test]
    fn group_by_discards_by() {
        let mut buckets = classify("SELECT a FROM t GROUP BY a");
        assert_eq!(bucket_text(&mut buckets, Clause::Group), "a");
    }

    #[test]
    fn options_are_collected() {
        let mut buckets = classify("SELECT DISTINCT SQL_NO_CACHE a FROM t");
        let options = buckets.take(Clause::Options).unwrap();
        let options: Vec<_> = options.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(options, vec!["DISTINCT", "SQL_NO_CACHE"]);
        assert_eq!(bucket_text(&mut buckets, Clause::Select), "a");
    }

    #[test]
    fn lock_in_share_mode_is_an_option() {
        let mut buckets = classify("SELECT a FROM t LOCK IN SHARE MODE");
        let options = buckets.take(Clause::Options).unwrap();
        assert_eq!(options[0].text, "LOCK IN SHARE MODE");
        assert!(!buckets.has(Clause::Lock));
    }

    #[test]
    fn lock_tables_is_a_statement() {
        let mut buckets = classify("LOCK TABLES t READ");
        let lock = buckets.take(Clause::Lock).unwrap();
        assert_eq!(lock[0].text, "LOCK");
    }

    #[test]
    fn for_update_swallows_update() {
        let mut buckets = classify("SELECT a FROM t FOR UPDATE");
        let options = buckets.take(Clause::Options).unwrap();
        assert_eq!(options[0].text, "FOR UPDATE");
        assert!(!buckets.has(Clause::Update));
    }

    #[test]
    fn delete_using_opens_bucket() {
        let mut buckets = classify("DELETE t1 FROM t1, t2 USING x");
        assert!(buckets.has(Clause::Delete));
        assert!(buckets.has(Clause::Using));
        assert_eq!(bucket_text(&mut buckets, Clause::Using), "x");
    }

    #[test]
    fn plain_using_stays_in_from() {
        let mut buckets = classify("SELECT * FROM a JOIN b USING (id)");
        assert!(!buckets.has(Clause::Using));
        assert!(bucket_text(&mut buckets, Clause::From).contains("USING"));
    }

    #[test]
    fn prepare_from_is_discarded() {
        let mut buckets = classify("PREPARE stmt FROM 'SELECT 1'");
        assert!(!buckets.has(Clause::From));
        assert_eq!(bucket_text(&mut buckets, Clause::Prepare), "stmt  'SELECT 1'");
    }

    #[test]
    fn load_into_is_folded() {
        let mut buckets = classify("LOAD INDEX INTO CACHE t");
        let load = buckets.take(Clause::Load).unwrap();
        assert!(load.iter().any(|t| t.text == "INTO"));
        assert!(!buckets.has(Clause::Into));
    }

    #[test]
    fn with_rollup_inside_group() {
        let mut buckets = classify("SELECT a FROM t GROUP BY a WITH ROLLUP");
        let options = buckets.take(Clause::Options).unwrap();
        assert_eq!(options[0].text, "WITH ROLLUP");
    }

    #[test]
    fn on_duplicate_key_update() {
        let mut buckets =
            classify("INSERT INTO t VALUES (1) ON DUPLICATE KEY UPDATE a = 1");
        assert_eq!(bucket_text(&mut buckets, Clause::Duplicate), "a = 1");
    }

    #[test]
    fn drop_after_alter_is_plain() {
        let mut buckets = classify("ALTER TABLE t DROP COLUMN c");
        assert!(!buckets.has(Clause::Drop));
        assert!(buckets.has(Clause::Alter));
    }

    #[test]
    fn statement_marker_keeps_following_tokens() {
        let mut buckets = classify("DELETE a, b FROM t");
        let delete = buckets.take(Clause::Delete).unwrap();
        // the marker keyword is stored bare and the whitespace right after
        // it is dropped, so the joined text has no gap after DELETE
        let text: String = delete.iter().map(|t| t.text.clone()).collect();
        assert_eq!(text.trim(), "DELETEa, b");
        assert_eq!(delete[0].text, "DELETE");
        let words: Vec<&str> = delete
            .iter()
            .filter(|t| !t.is_whitespace() && !t.is_comma())
            .map(|t| t.trimmed())
            .collect();
        assert_eq!(words, vec!["DELETE", "a", "b"]);
    }
}
