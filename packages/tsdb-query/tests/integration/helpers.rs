//! Sample database fixture.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tsdb_core::{Database, Record, Value};
use tsdb_query::Selection;

const SCHEMA: &str = "\
item:
  i-id :integer :key
  i-origin :string
  i-input :string
  i-wf :integer
  i-date :date

parse:
  parse-id :integer :key
  i-id :integer :key
  readings :integer

result:
  parse-id :integer :key
  result-id :integer
  mrs :string

fold:
  fold-id :integer :key
  f-name :string
";

const ITEM: &str = "\
10@csli@It rained.@1@8-sep-1993
20@csli@Abrams slept.@1@
30@esd@Browne barked.@0@2-jan-2021
40@esd@Dogs bark \\s night.@1@
";

const PARSE: &str = "\
100@10@1
200@20@2
300@30@0
";

const RESULT: &str = "\
100@0@[ LTOP: h0 rain ]
200@0@[ LTOP: h1 sleep ]
200@1@[ LTOP: h2 sleep ]
";

const FOLD: &str = "1@first\n";

/// Creates the sample database in a fresh temporary directory.
pub fn sample_db() -> (TempDir, Database) {
    let temp_dir = tempfile::tempdir().unwrap();
    write_db(temp_dir.path());
    let db = Database::open(temp_dir.path()).unwrap();
    (temp_dir, db)
}

fn write_db(dir: &Path) {
    fs::write(dir.join("relations"), SCHEMA).unwrap();
    fs::write(dir.join("item"), ITEM).unwrap();
    fs::write(dir.join("parse"), PARSE).unwrap();
    fs::write(dir.join("result"), RESULT).unwrap();
    fs::write(dir.join("fold"), FOLD).unwrap();
}

pub fn rows(selection: &Selection) -> Vec<Record> {
    selection.collect_rows().unwrap()
}

/// Values of the first column.
pub fn first_column(selection: &Selection) -> Vec<Value> {
    rows(selection).into_iter().map(|mut r| r.remove(0)).collect()
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&i| Value::Integer(i)).collect()
}
