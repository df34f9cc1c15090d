//! Opening databases and reading relations.

use std::fs;

use chrono::NaiveDate;
use ntest::timeout;
use tempfile::tempdir;

use tsdb_core::config::DbConfig;
use tsdb_core::database::is_database_directory;
use tsdb_core::{Database, DbError, ErrorCategory, Value};

use super::helpers::{create_sample_db, file_names};

#[timeout(1000)]
#[test]
fn test_open_and_list_relations() {
    let temp_dir = tempdir().unwrap();
    create_sample_db(temp_dir.path());
    assert!(is_database_directory(temp_dir.path()));

    let db = Database::open(temp_dir.path()).unwrap();
    let names: Vec<String> = db.relations().map(|r| r.name().to_string()).collect();
    assert_eq!(names, vec!["item", "parse", "result"]);
    assert_eq!(db.schema().keys("parse"), vec!["parse-id", "i-id"]);
}

#[timeout(1000)]
#[test]
fn test_not_a_database() {
    let temp_dir = tempdir().unwrap();
    assert!(!is_database_directory(temp_dir.path()));
    let err = Database::open(temp_dir.path()).unwrap_err();
    assert!(matches!(err, DbError::NotADatabase { .. }));
    assert_eq!(err.category(), ErrorCategory::Schema);
}

#[timeout(1000)]
#[test]
fn test_read_typed_rows() {
    let temp_dir = tempdir().unwrap();
    create_sample_db(temp_dir.path());
    let db = Database::open(temp_dir.path()).unwrap();

    let items: Vec<_> = db
        .relation("item")
        .unwrap()
        .records()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[0][3],
        Value::Date(
            NaiveDate::from_ymd_opt(1993, 9, 8)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        )
    );
    assert_eq!(items[1][3], Value::Null);
    assert_eq!(items[2][1], Value::from("Browne@Home barked."));
    assert_eq!(items[2][3].to_string(), "2-jan-2021 13:30:00");

    // compressed relations read the same way
    let parses: Vec<_> = db
        .relation("parse")
        .unwrap()
        .select(&["readings"])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        parses,
        vec![
            vec![Value::Integer(1)],
            vec![Value::Integer(2)],
            vec![Value::Integer(0)],
        ]
    );
}

#[timeout(1000)]
#[test]
fn test_unknown_relation() {
    let temp_dir = tempdir().unwrap();
    create_sample_db(temp_dir.path());
    let db = Database::open(temp_dir.path()).unwrap();
    let err = db.relation("fold").unwrap_err();
    assert!(matches!(err, DbError::RelationNotFound(ref name) if name == "fold"));
    assert_eq!(err.category(), ErrorCategory::Data);
}

#[timeout(1000)]
#[test]
fn test_write_relation_uses_configured_compression() {
    let temp_dir = tempdir().unwrap();
    create_sample_db(temp_dir.path());
    let db = Database::with_config(&DbConfig {
        data_dir: temp_dir.path().to_path_buf(),
        gzip: Some(true),
    })
    .unwrap();

    db.write_relation(
        "item",
        vec![vec![
            Value::Integer(40),
            Value::from("Dogs bark."),
            Value::Null,
            Value::Null,
        ]],
    )
    .unwrap();

    assert_eq!(
        file_names(temp_dir.path()),
        vec!["item.gz", "parse.gz", "relations", "result"]
    );
    let rows: Vec<_> = db
        .relation("item")
        .unwrap()
        .raw_records()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    // nulls are written as field defaults
    assert_eq!(
        rows,
        vec![vec![
            Value::from("40"),
            Value::from("Dogs bark."),
            Value::from("1"),
            Value::Null,
        ]]
    );
}

#[timeout(1000)]
#[test]
fn test_schema_is_read_once() {
    let temp_dir = tempdir().unwrap();
    create_sample_db(temp_dir.path());
    let db = Database::open(temp_dir.path()).unwrap();

    fs::write(temp_dir.path().join("relations"), "other:\n  x :string\n").unwrap();
    assert!(db.schema().contains("item"));
    assert!(!db.schema().contains("other"));
}
