//! Read-only view of one relation file.

use std::collections::HashMap;
use std::io::{BufRead, Lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::{decode, Record};
use crate::error::{DbError, Result};
use crate::persistence::{self, io_utils::classify_io_error};
use crate::schema::{field_index, Field};

/// Read-only, lazily iterated view of one relation.
///
/// A relation holds no row data; every call to [`records`](Self::records),
/// [`raw_records`](Self::raw_records), or [`select`](Self::select) reopens the
/// backing file and streams it from the start.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Database directory
    dir: PathBuf,
    /// Relation name
    name: String,
    /// Field definitions in column order
    fields: Arc<[Field]>,
    /// Field name to column position
    field_index: HashMap<String, usize>,
}

impl Relation {
    /// Creates a view of relation `name` in `dir` described by `fields`.
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>, fields: impl Into<Arc<[Field]>>) -> Self {
        let fields = fields.into();
        let field_index = field_index(&fields);
        Self {
            dir: dir.into(),
            name: name.into(),
            fields,
            field_index,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the column position of field `name`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.field_index
            .get(name)
            .copied()
            .ok_or_else(|| DbError::FieldNotFound {
                table: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Streams every record, cast to the field datatypes.
    pub fn records(&self) -> Result<Records> {
        self.open(true, None)
    }

    /// Streams every record as untyped text, exactly as stored.
    pub fn raw_records(&self) -> Result<Records> {
        self.open(false, None)
    }

    /// Streams typed records restricted to the columns `names`, in that
    /// order. No names selects every column.
    pub fn select(&self, names: &[&str]) -> Result<Records> {
        if names.is_empty() {
            return self.records();
        }
        let indices = names
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        self.open(true, Some(indices))
    }

    fn open(&self, typed: bool, projection: Option<Vec<usize>>) -> Result<Records> {
        let reader = persistence::open(&self.dir, &self.name)?;
        Ok(Records {
            lines: reader.lines(),
            fields: Arc::clone(&self.fields),
            typed,
            projection,
        })
    }
}

/// Single forward pass over a relation file.
pub struct Records {
    lines: Lines<Box<dyn BufRead>>,
    fields: Arc<[Field]>,
    typed: bool,
    projection: Option<Vec<usize>>,
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(classify_io_error(e, "Failed to read relation"))),
        };
        let fields = self.typed.then_some(&*self.fields);
        let record = match decode(&line, fields) {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(match &self.projection {
            Some(indices) => indices.iter().map(|&i| record[i].clone()).collect(),
            None => record,
        }))
    }
}
