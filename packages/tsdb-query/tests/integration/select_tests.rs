//! Single-relation selects.

use ntest::timeout;
use tsdb_core::Value;
use tsdb_query::{execute, parse_query, select, Projection, Query, QueryError};

use super::helpers::{first_column, ints, rows, sample_db};

#[timeout(1000)]
#[test]
fn test_select_all_from_item() {
    let (_temp_dir, db) = sample_db();
    let selection = select("select * from item.", &db).unwrap();
    assert_eq!(
        selection.columns(),
        &["i-id", "i-origin", "i-input", "i-wf", "i-date"]
    );
    let rows = rows(&selection);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0][2], Value::from("It rained."));
    assert_eq!(rows[3][2], Value::from("Dogs bark @ night."));
    assert_eq!(rows[1][4], Value::Null);
}

#[timeout(1000)]
#[test]
fn test_select_where_projection() {
    let (_temp_dir, db) = sample_db();
    let selection = select("select i-id i-input where i-wf == 1.", &db).unwrap();
    assert_eq!(selection.columns(), &["i-id", "i-input"]);
    assert_eq!(
        rows(&selection),
        vec![
            vec![Value::Integer(10), Value::from("It rained.")],
            vec![Value::Integer(20), Value::from("Abrams slept.")],
            vec![Value::Integer(40), Value::from("Dogs bark @ night.")],
        ]
    );
}

#[timeout(1000)]
#[test]
fn test_select_star_needs_from_or_where() {
    let (_temp_dir, db) = sample_db();
    let err = select("select * .", &db).unwrap_err();
    assert!(matches!(err, QueryError::Syntax { .. }));
}

#[timeout(1000)]
#[test]
fn test_body_without_query_type() {
    let (_temp_dir, db) = sample_db();
    let selection = select("i-id where i-origin == esd", &db).unwrap();
    assert_eq!(first_column(&selection), ints(&[30, 40]));
}

#[timeout(1000)]
#[test]
fn test_conditions() {
    let (_temp_dir, db) = sample_db();
    let cases = [
        ("i-id where i-input ~ 'bark'", vec![30, 40]),
        ("i-id where i-input !~ 'bark' and i-wf = 1", vec![10, 20]),
        ("i-id where i-id > 10 && i-id <= 30", vec![20, 30]),
        ("i-id where i-date < 2000-01-01", vec![10]),
        ("i-id where i-date >= 1-jan-21", vec![30]),
        ("i-id where not (i-origin = csli or i-wf = 0)", vec![40]),
        ("i-id from item where i-date != 8-sep-1993", vec![20, 30, 40]),
    ];
    for (query, expected) in cases {
        let selection = select(query, &db).unwrap();
        assert_eq!(first_column(&selection), ints(&expected), "{query}");
    }
}

#[timeout(1000)]
#[test]
fn test_qualified_columns() {
    let (_temp_dir, db) = sample_db();
    let selection = select("item:i-id@i-origin where item:i-wf = 0", &db).unwrap();
    assert_eq!(selection.columns(), &["item:i-id", "item:i-origin"]);
    assert_eq!(
        rows(&selection),
        vec![vec![Value::Integer(30), Value::from("esd")]]
    );
}

#[timeout(1000)]
#[test]
fn test_rows_can_be_read_twice() {
    let (_temp_dir, db) = sample_db();
    let selection = select("i-input from item", &db).unwrap();
    assert_eq!(rows(&selection), rows(&selection));
}

#[timeout(1000)]
#[test]
fn test_execute_parsed_query() {
    let (_temp_dir, db) = sample_db();
    let query = parse_query("select i-id from item where i-wf = 0.").unwrap();
    let selection = execute(&query, &db).unwrap();
    assert_eq!(first_column(&selection), ints(&[30]));
}

#[timeout(1000)]
#[test]
fn test_unknown_columns_and_tables() {
    let (_temp_dir, db) = sample_db();
    assert!(matches!(
        select("nothing from item", &db).unwrap_err(),
        QueryError::UnresolvedColumn(ref c) if c == "nothing"
    ));
    assert!(matches!(
        select("i-id where nothing = 1", &db).unwrap_err(),
        QueryError::UnresolvedColumn(_)
    ));
    assert!(matches!(
        select("* from missing", &db).unwrap_err(),
        QueryError::Db(tsdb_core::DbError::RelationNotFound(_))
    ));
    assert!(matches!(
        select("item:readings from item", &db).unwrap_err(),
        QueryError::UnresolvedColumn(ref c) if c == "item:readings"
    ));
}

#[timeout(1000)]
#[test]
fn test_built_query_without_relations() {
    let (_temp_dir, db) = sample_db();
    let query = Query::select(Projection::Columns(Vec::new()), Vec::new(), None);
    let err = execute(&query, &db).unwrap_err();
    assert!(matches!(err, QueryError::NoRelation));
}
