//! Database directory with its schema and relations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::Record;
use crate::config::{DbConfig, WriteOptions, SCHEMA_FILENAME};
use crate::error::{DbError, Result};
use crate::persistence;
use crate::schema::{read_schema, Schema};
use crate::table::Relation;

/// Returns true if `path` is a directory containing a schema file.
///
/// The schema file itself is not checked for validity.
pub fn is_database_directory(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    path.is_dir() && path.join(SCHEMA_FILENAME).is_file()
}

/// A database directory and its parsed schema.
///
/// Opening a database only reads the schema; relations are created on
/// demand and hold no cached rows.
#[derive(Debug, Clone)]
pub struct Database {
    /// Database directory
    path: PathBuf,
    /// Parsed schema
    schema: Arc<Schema>,
    /// Compression policy for [`write_relation`](Self::write_relation)
    gzip: Option<bool>,
}

impl Database {
    /// Opens the database at `path` with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(&DbConfig {
            data_dir: path.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    /// Opens the database described by `config`.
    ///
    /// Fails immediately if the directory has no schema file.
    pub fn with_config(config: &DbConfig) -> Result<Self> {
        let path = config.data_dir.clone();
        if !is_database_directory(&path) {
            return Err(DbError::NotADatabase { path });
        }
        let schema = read_schema(&path)?;
        tracing::debug!(
            "Opened database {} with {} relations",
            path.display(),
            schema.len()
        );
        Ok(Self {
            path,
            schema: Arc::new(schema),
            gzip: config.gzip,
        })
    }

    /// The database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns a view of relation `name`.
    pub fn relation(&self, name: &str) -> Result<Relation> {
        let fields = self
            .schema
            .get(name)
            .ok_or_else(|| DbError::RelationNotFound(name.to_string()))?;
        Ok(Relation::new(&self.path, name, fields.to_vec()))
    }

    /// Views of every relation in schema order.
    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.schema
            .tables()
            .iter()
            .map(|t| Relation::new(&self.path, t.name.as_str(), t.fields.clone()))
    }

    /// Replaces the rows of relation `name` using the configured compression
    /// policy.
    pub fn write_relation<I>(&self, name: &str, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        let fields = self
            .schema
            .get(name)
            .ok_or_else(|| DbError::RelationNotFound(name.to_string()))?;
        persistence::write(
            &self.path,
            name,
            records,
            fields,
            WriteOptions {
                append: false,
                gzip: self.gzip,
            },
        )
    }
}
