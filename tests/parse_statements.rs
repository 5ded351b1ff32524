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

//! Tests for DML and administrative statements: INSERT/REPLACE, UPDATE,
//! DELETE, SET, options, and the statements kept as raw clause buckets.

use pretty_assertions::assert_eq;

use mysqlparse::{parse, Clause, InsertKind, NodeKind, Query, Statement};

fn parsed(sql: &str) -> Statement {
    match parse(sql).unwrap() {
        Query::Statement(stmt) => *stmt,
        Query::Union { .. } => panic!("expected a single statement: {sql}"),
    }
}

#[test]
fn insert_with_columns_and_values() {
    let stmt = parsed("INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y')");

    let insert = stmt.insert.as_ref().unwrap();
    assert_eq!(insert.kind, InsertKind::Insert);
    assert_eq!(insert.table, "t");
    let cols = insert.columns.as_ref().unwrap();
    assert_eq!(cols.len(), 2);
    assert_eq!(cols[0].base_expr, "a");

    let values = stmt.values.as_ref().unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].kind, NodeKind::Record);
    let record = values[0].sub_tree.as_ref().unwrap();
    assert_eq!(record[0].base_expr, "1");
    assert_eq!(record[1].kind, NodeKind::Constant);
}

#[test]
fn insert_without_columns() {
    let stmt = parsed("INSERT INTO db.t VALUES (1)");
    let insert = stmt.insert.as_ref().unwrap();
    assert_eq!(insert.table, "db.t");
    assert!(insert.columns.is_none());
}

#[test]
fn replace_statement() {
    let stmt = parsed("REPLACE INTO t (a) VALUES (1)");
    let insert = stmt.insert.as_ref().unwrap();
    assert_eq!(insert.kind, InsertKind::Replace);
    assert_eq!(insert.table, "t");
}

#[test]
fn insert_on_duplicate_key_update() {
    let stmt = parsed("INSERT INTO t (a) VALUES (1) ON DUPLICATE KEY UPDATE a = a + 1");
    let dup = stmt.on_duplicate.as_ref().unwrap();
    assert_eq!(dup.len(), 1);
    assert_eq!(dup[0].kind, NodeKind::Expression);
    assert_eq!(dup[0].base_expr, "a = a + 1");
}

#[test]
fn update_with_set_and_where() {
    let stmt = parsed("UPDATE t SET a = 1, b = b + 1 WHERE id = 7");

    let update = stmt.update.as_ref().unwrap();
    assert_eq!(update[0].table.as_deref(), Some("t"));

    let set = stmt.set.as_ref().unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set[0].base_expr, "a = 1");
    assert_eq!(set[1].base_expr, "b = b + 1");

    assert!(stmt.where_clause.is_some());
    assert!(stmt.select.is_none());
}

#[test]
fn standalone_set_global() {
    let stmt = parsed("SET GLOBAL sort_buffer_size = 1000000");
    let set = stmt.set.as_ref().unwrap();
    let parts = set[0].sub_tree.as_ref().unwrap();
    assert_eq!(parts[0].kind, NodeKind::GlobalVariable);
    assert_eq!(parts[0].base_expr, "sort_buffer_size");
}

#[test]
fn delete_single_table() {
    let stmt = parsed("DELETE FROM t WHERE a = 1");
    let delete = stmt.delete.as_ref().unwrap();
    assert_eq!(delete.tables, vec!["t"]);
    assert!(stmt.where_clause.is_some());
}

#[test]
fn multi_table_delete_with_using() {
    let stmt = parsed("DELETE t1.* FROM t1 USING t2");
    let delete = stmt.delete.as_ref().unwrap();
    assert_eq!(delete.tables, vec!["t1"]);
    let using = stmt.using.as_ref().unwrap();
    assert_eq!(using[0].table.as_deref(), Some("t2"));
}

#[test]
fn select_into_variables() {
    let stmt = parsed("SELECT a, b INTO @a, @b FROM t");
    let into = stmt.into.as_ref().unwrap();
    assert_eq!(into, &vec!["@a".to_string(), "@b".to_string()]);
    assert!(stmt.insert.is_none());
}

#[test]
fn select_options() {
    let stmt = parsed("SELECT DISTINCT SQL_CALC_FOUND_ROWS a FROM t");
    assert_eq!(stmt.options, vec!["DISTINCT", "SQL_CALC_FOUND_ROWS"]);
    // option keywords never leak into the select list
    assert_eq!(stmt.select.as_ref().unwrap().len(), 1);
}

#[test]
fn distinctrow_normalizes_to_distinct() {
    let stmt = parsed("SELECT DISTINCTROW a FROM t");
    assert_eq!(stmt.options, vec!["DISTINCT"]);
}

#[test]
fn lock_in_share_mode_and_for_update() {
    let stmt = parsed("SELECT a FROM t LOCK IN SHARE MODE");
    assert_eq!(stmt.options, vec!["LOCK IN SHARE MODE"]);

    let stmt = parsed("SELECT a FROM t FOR UPDATE");
    assert_eq!(stmt.options, vec!["FOR UPDATE"]);
    assert!(stmt.update.is_none());
}

#[test]
fn show_statement_keeps_raw_tokens() {
    let stmt = parsed("SHOW TABLES");
    let show = stmt.bucket(Clause::Show).unwrap();
    assert_eq!(show[0].text, "SHOW");
    assert!(show.iter().any(|t| t.text == "TABLES"));
}

#[test]
fn drop_statement() {
    let stmt = parsed("DROP TABLE t");
    let drop = stmt.bucket(Clause::Drop).unwrap();
    assert_eq!(drop[0].text, "DROP");
}

#[test]
fn alter_drop_column_is_one_statement() {
    let stmt = parsed("ALTER TABLE t DROP COLUMN c");
    assert!(stmt.bucket(Clause::Alter).is_some());
    assert!(stmt.bucket(Clause::Drop).is_none());
}

#[test]
fn start_transaction_reads_as_begin() {
    let stmt = parsed("START TRANSACTION");
    let start = stmt.bucket(Clause::Start).unwrap();
    assert_eq!(start[0].text, "BEGIN");
    assert!(start.iter().all(|t| t.upper() != "TRANSACTION"));
}

#[test]
fn prepare_and_execute() {
    let stmt = parsed("PREPARE stmt FROM 'SELECT 1'");
    assert!(stmt.bucket(Clause::Prepare).is_some());
    assert!(stmt.from.is_none());

    let stmt = parsed("EXECUTE stmt USING @a");
    assert!(stmt.bucket(Clause::Execute).is_some());
    // USING after EXECUTE is its own clause, parsed like a FROM list
    assert!(stmt.using.is_some());
}

#[test]
fn truncate_statement() {
    let stmt = parsed("TRUNCATE TABLE t");
    let truncate = stmt.bucket(Clause::Truncate).unwrap();
    assert_eq!(truncate[0].text, "TRUNCATE");
}

#[test]
fn describe_statement() {
    let stmt = parsed("DESCRIBE t");
    assert!(stmt.bucket(Clause::Describe).is_some());
}

#[test]
fn insert_from_select() {
    let stmt = parsed("INSERT INTO t (a) SELECT b FROM u");
    let insert = stmt.insert.as_ref().unwrap();
    assert_eq!(insert.table, "t");
    assert!(stmt.select.is_some());
    let from = stmt.from.as_ref().unwrap();
    assert_eq!(from[0].table.as_deref(), Some("u"));
}

#[test]
fn garbage_is_unparsable_not_a_panic() {
    assert!(parse("").is_err());
    assert!(parse("   \t \n").is_err());
}
