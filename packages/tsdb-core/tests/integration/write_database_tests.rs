//! Writing whole databases.

use std::fs;

use ntest::timeout;
use tempfile::tempdir;

use tsdb_core::persistence::write_database;
use tsdb_core::schema::read_schema;
use tsdb_core::{Database, DbError, Schema, Value};

use super::helpers::{create_sample_db, file_names, ITEM_ROWS, PARSE_ROWS};

fn rows(db: &Database, name: &str) -> Vec<Vec<Value>> {
    db.relation(name)
        .unwrap()
        .raw_records()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[timeout(1000)]
#[test]
fn test_copy_database() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source");
    let dest = temp_dir.path().join("dest");
    create_sample_db(&source);
    let db = Database::open(&source).unwrap();

    write_database(&db, &dest, None, None, None).unwrap();

    // relations are copied as stored; a fresh destination is uncompressed
    assert_eq!(fs::read_to_string(dest.join("item")).unwrap(), ITEM_ROWS);
    assert_eq!(
        file_names(&dest),
        vec!["item", "parse", "relations", "result"]
    );
    let copy = Database::open(&dest).unwrap();
    assert_eq!(copy.schema(), db.schema());
    assert_eq!(rows(&copy, "parse"), rows(&db, "parse"));
}

#[timeout(1000)]
#[test]
fn test_copy_with_compression() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source");
    let dest = temp_dir.path().join("dest");
    create_sample_db(&source);
    let db = Database::open(&source).unwrap();

    write_database(&db, &dest, None, None, Some(true)).unwrap();
    assert_eq!(
        file_names(&dest),
        vec!["item.gz", "parse.gz", "relations", "result.gz"]
    );
    let copy = Database::open(&dest).unwrap();
    assert_eq!(rows(&copy, "parse"), rows(&db, "parse"));

    // rewriting uncompressed replaces the gzip files
    write_database(&copy, &dest, None, None, Some(false)).unwrap();
    assert_eq!(fs::read_to_string(dest.join("parse")).unwrap(), PARSE_ROWS);
    assert!(!dest.join("parse.gz").exists());
}

#[timeout(1000)]
#[test]
fn test_rewrite_in_place() {
    let temp_dir = tempdir().unwrap();
    create_sample_db(temp_dir.path());
    let db = Database::open(temp_dir.path()).unwrap();

    write_database(&db, temp_dir.path(), None, None, Some(true)).unwrap();

    assert_eq!(
        file_names(temp_dir.path()),
        vec!["item.gz", "parse.gz", "relations", "result.gz"]
    );
    let reopened = Database::open(temp_dir.path()).unwrap();
    assert_eq!(rows(&reopened, "item").len(), 3);
    assert_eq!(rows(&reopened, "result").len(), 3);
}

#[timeout(1000)]
#[test]
fn test_names_subset_removes_other_relations() {
    let temp_dir = tempdir().unwrap();
    create_sample_db(temp_dir.path());
    let db = Database::open(temp_dir.path()).unwrap();

    write_database(&db, temp_dir.path(), Some(&["item"]), None, None).unwrap();

    assert_eq!(file_names(temp_dir.path()), vec!["item", "relations"]);
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("item")).unwrap(),
        ITEM_ROWS
    );
}

#[timeout(1000)]
#[test]
fn test_remap_to_new_schema() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source");
    let dest = temp_dir.path().join("dest");
    create_sample_db(&source);
    let db = Database::open(&source).unwrap();

    let schema = Schema::parse(
        "item:\n  i-id :integer :key\n  i-length :integer\n  i-input :string\n\nfold:\n  fold-id :integer :key\n",
    )
    .unwrap();
    write_database(&db, &dest, None, Some(&schema), None).unwrap();

    assert_eq!(read_schema(&dest).unwrap(), schema);
    // dropped columns disappear, new ones take their defaults
    assert_eq!(
        fs::read_to_string(dest.join("item")).unwrap(),
        "10@-1@It rained.\n20@-1@Abrams slept.\n30@-1@Browne\\sHome barked.\n"
    );
    // relations only in the new schema start empty
    assert_eq!(fs::read_to_string(dest.join("fold")).unwrap(), "");
    assert!(!dest.join("parse.gz").exists());
}

#[timeout(1000)]
#[test]
fn test_destination_rows_kept_for_new_relations() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source");
    let dest = temp_dir.path().join("dest");
    create_sample_db(&source);
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("fold"), "1\n2\n").unwrap();
    let db = Database::open(&source).unwrap();

    let schema = Schema::parse("fold:\n  fold-id :integer :key\n").unwrap();
    write_database(&db, &dest, None, Some(&schema), None).unwrap();
    assert_eq!(fs::read_to_string(dest.join("fold")).unwrap(), "1\n2\n");
}

#[timeout(1000)]
#[test]
fn test_destination_must_be_directory() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source");
    create_sample_db(&source);
    let db = Database::open(&source).unwrap();

    let file = temp_dir.path().join("file");
    fs::write(&file, "").unwrap();
    let err = write_database(&db, &file, None, None, None).unwrap_err();
    assert!(matches!(err, DbError::NotADirectory { .. }));

    let err = write_database(&db, temp_dir.path().join("x"), Some(&["fold"]), None, None)
        .unwrap_err();
    assert!(matches!(err, DbError::RelationNotFound(ref name) if name == "fold"));
}
