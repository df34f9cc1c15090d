//! Database configuration.

use std::path::PathBuf;

/// Name of the schema file inside a database directory.
pub const SCHEMA_FILENAME: &str = "relations";

/// Column delimiter in relation files.
pub const FIELD_DELIMITER: char = '@';

/// Suffix of gzip-compressed relation files.
pub const GZIP_SUFFIX: &str = ".gz";

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database directory holding the schema and relation files
    pub data_dir: PathBuf,
    /// Compression for rewritten relations (`None` mirrors the existing file)
    pub gzip: Option<bool>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            gzip: None,
        }
    }
}

/// Per-call options for writing a relation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Keep existing rows and add the new ones after them
    pub append: bool,
    /// `Some(true)` compresses non-empty output, `Some(false)` never
    /// compresses, `None` follows the current on-disk format
    pub gzip: Option<bool>,
}
