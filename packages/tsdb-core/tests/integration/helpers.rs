//! Shared fixtures for integration tests.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

pub const SCHEMA: &str = "\
item:
  i-id :integer :key                    # unique item identifier
  i-input :string                       # item string
  i-wf :integer                         # grammaticality
  i-date :date

parse:
  parse-id :integer :key
  i-id :integer :key
  readings :integer

result:
  parse-id :integer :key
  result-id :integer
  mrs :string
";

pub const ITEM_ROWS: &str = "\
10@It rained.@1@8-sep-1993
20@Abrams slept.@1@
30@Browne\\sHome barked.@0@2-jan-2021 13:30:00
";

pub const PARSE_ROWS: &str = "\
100@10@1
200@20@2
300@30@0
";

pub const RESULT_ROWS: &str = "\
100@0@[ LTOP: h0 ]
200@0@[ LTOP: h1 ]
200@1@[ LTOP: h2 ]
";

/// Creates the sample database in `dir`, with `parse` gzip-compressed.
pub fn create_sample_db(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("relations"), SCHEMA).unwrap();
    fs::write(dir.join("item"), ITEM_ROWS).unwrap();
    write_gzip(&dir.join("parse.gz"), PARSE_ROWS);
    fs::write(dir.join("result"), RESULT_ROWS).unwrap();
}

pub fn write_gzip(path: &Path, contents: &str) {
    let file = fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
