//! Database schemas and the `relations` file format.
//!
//! A schema file lists each relation as a header line followed by one
//! indented line per field:
//!
//! ```text
//! item:
//!   i-id :integer :key                    # unique item identifier
//!   i-input :string                       # item string
//!
//! parse:
//!   parse-id :integer :key
//!   i-id :integer :key
//! ```

mod field;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

pub use field::{field_index, Field, CODED_ATTRIBUTES};

use crate::config::SCHEMA_FILENAME;
use crate::error::{DbError, Result};
use crate::persistence::io_utils::{classify_io_error, write_atomic};

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<table>\w\S*):$").unwrap());

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^\s#]+)(?P<flags>[^#]*)(?:#\s*(?P<comment>.*))?$").unwrap()
});

/// Field list of a single relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Relation name
    pub name: String,
    /// Field definitions in column order
    pub fields: Vec<Field>,
}

impl TableSchema {
    /// Iterates over the names of key fields.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.is_key)
            .map(|f| f.name.as_str())
    }
}

/// Ordered collection of relation definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<TableSchema>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a relation definition, rejecting duplicate names.
    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<Field>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(DbError::TableRedefined(name));
        }
        self.tables.push(TableSchema { name, fields });
        Ok(())
    }

    /// Returns the field list for `name`.
    pub fn get(&self, name: &str) -> Option<&[Field]> {
        self.table(name).map(|t| t.fields.as_slice())
    }

    /// Returns the definition of relation `name`.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Relation definitions in declaration order.
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Relation names in declaration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Names of the relations declaring a field called `column`, in
    /// declaration order.
    pub fn find(&self, column: &str) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| t.fields.iter().any(|f| f.name == column))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Key field names of relation `name` (empty if undefined).
    pub fn keys(&self, name: &str) -> Vec<&str> {
        self.table(name)
            .map(|t| t.keys().collect())
            .unwrap_or_default()
    }

    /// Parses schema text.
    pub fn parse(s: &str) -> Result<Self> {
        let mut schema = Schema::new();
        for (idx, raw) in s.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let syntax_error = || DbError::SchemaSyntax {
                lineno: idx + 1,
                line: line.to_string(),
            };

            if let Some(caps) = TABLE_RE.captures(line) {
                schema.insert(&caps["table"], Vec::new())?;
                continue;
            }

            let current = schema.tables.last_mut().ok_or_else(syntax_error)?;
            let caps = FIELD_RE.captures(line).ok_or_else(syntax_error)?;
            let mut flags = caps["flags"].split_whitespace();
            let datatype = flags
                .next()
                .ok_or_else(syntax_error)?
                .parse()
                .map_err(|_| syntax_error())?;
            let comment = caps
                .name("comment")
                .map(|m| m.as_str().trim_end().to_string());
            current
                .fields
                .push(Field::new(&caps["name"], datatype, flags, comment));
        }
        Ok(schema)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, table) in self.tables.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}:", table.name)?;
            for field in &table.fields {
                write!(f, "\n{field}")?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Schema {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        Schema::parse(s)
    }
}

fn schema_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(SCHEMA_FILENAME)
    } else {
        path.to_path_buf()
    }
}

/// Reads a schema from a database directory or a schema file path.
pub fn read_schema(path: impl AsRef<Path>) -> Result<Schema> {
    let path = schema_path(path.as_ref());
    if !path.is_file() {
        return Err(DbError::SchemaNotFound { path });
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|e| classify_io_error(e, "Failed to read schema file"))?;
    Schema::parse(&text)
}

/// Writes `schema` to a database directory's schema file, or to `path`
/// directly if it is not a directory.
pub fn write_schema(path: impl AsRef<Path>, schema: &Schema) -> Result<()> {
    let path = schema_path(path.as_ref());
    write_atomic(&path, format!("{schema}\n").as_bytes())
}
