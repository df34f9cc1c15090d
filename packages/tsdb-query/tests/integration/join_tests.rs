//! Joins driven by `from`, `where`, and projected columns.

use ntest::timeout;
use tsdb_core::Value;
use tsdb_query::{select, QueryError};

use super::helpers::{first_column, ints, rows, sample_db};

#[timeout(1000)]
#[test]
fn test_from_join() {
    let (_temp_dir, db) = sample_db();
    let selection = select("select * from item parse.", &db).unwrap();
    assert_eq!(selection.table().name(), "item+parse");
    assert_eq!(
        selection.columns(),
        &["i-id", "i-origin", "i-input", "i-wf", "i-date", "parse-id", "readings"]
    );
    // inner join: item 40 has no parse
    assert_eq!(first_column(&selection), ints(&[10, 20, 30]));
}

#[timeout(1000)]
#[test]
fn test_projection_join() {
    let (_temp_dir, db) = sample_db();
    let selection = select("i-input readings", &db).unwrap();
    assert_eq!(
        rows(&selection),
        vec![
            vec![Value::from("It rained."), Value::Integer(1)],
            vec![Value::from("Abrams slept."), Value::Integer(2)],
            vec![Value::from("Browne barked."), Value::Integer(0)],
        ]
    );
}

#[timeout(1000)]
#[test]
fn test_transitive_join() {
    let (_temp_dir, db) = sample_db();
    // item and result share no key; parse connects them
    let selection = select("i-id mrs from item result", &db).unwrap();
    assert_eq!(selection.table().name(), "item+parse+result");
    assert_eq!(
        rows(&selection),
        vec![
            vec![Value::Integer(10), Value::from("[ LTOP: h0 rain ]")],
            vec![Value::Integer(20), Value::from("[ LTOP: h1 sleep ]")],
            vec![Value::Integer(20), Value::from("[ LTOP: h2 sleep ]")],
        ]
    );
}

#[timeout(1000)]
#[test]
fn test_where_join_is_left_join() {
    let (_temp_dir, db) = sample_db();
    // items without a parse are kept for the filter to decide
    let selection = select("i-id from item where readings != 1", &db).unwrap();
    assert_eq!(first_column(&selection), ints(&[20, 30, 40]));

    // without a from clause the filter starts from the relation declaring
    // the column
    let selection = select("i-id where readings != 1", &db).unwrap();
    assert_eq!(selection.table().name(), "parse");
    assert_eq!(first_column(&selection), ints(&[20, 30]));

    let selection = select("i-id from item where readings < 2", &db).unwrap();
    assert_eq!(first_column(&selection), ints(&[10, 30]));
}

#[timeout(1000)]
#[test]
fn test_where_then_projection_join() {
    let (_temp_dir, db) = sample_db();
    let selection = select("i-id result-id where mrs ~ 'sleep'", &db).unwrap();
    assert_eq!(
        rows(&selection),
        vec![
            vec![Value::Integer(20), Value::Integer(0)],
            vec![Value::Integer(20), Value::Integer(1)],
        ]
    );
}

#[timeout(1000)]
#[test]
fn test_qualified_column_joins_its_table() {
    let (_temp_dir, db) = sample_db();
    // i-id is already present from item, but the qualifier asks for parse
    let selection = select("parse:i-id from item", &db).unwrap();
    assert_eq!(selection.table().name(), "item+parse");
    assert_eq!(first_column(&selection), ints(&[10, 20, 30]));
}

#[timeout(1000)]
#[test]
fn test_unjoinable_tables() {
    let (_temp_dir, db) = sample_db();
    let err = select("* from item fold", &db).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Unjoinable { ref left, ref right } if left == "item" && right == "fold"
    ));
}
