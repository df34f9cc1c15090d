//! Database error types.

use std::path::PathBuf;

use thiserror::Error;

/// Broad failure classes a caller can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed, missing, or inconsistent schema
    Schema,
    /// Bad row data, unknown columns, failed casts, missing table files
    Data,
    /// Underlying filesystem failure
    Io,
}

/// Database operation errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// No schema file where one was expected
    #[error("no valid schema file at {}", path.display())]
    SchemaNotFound { path: PathBuf },

    /// Schema line that is neither a table header nor a field definition
    #[error("invalid line {lineno} in schema file: {line}")]
    SchemaSyntax { lineno: usize, line: String },

    /// Table defined twice in one schema
    #[error("table '{0}' redefined")]
    TableRedefined(String),

    /// Directory that is not a database (no schema file)
    #[error("not a valid TSDB database: {}", path.display())]
    NotADatabase { path: PathBuf },

    /// Relation requested that the schema does not define
    #[error("relation not defined in schema: {0}")]
    RelationNotFound(String),

    /// Column requested that the relation does not define
    #[error("no such field '{field}' in relation '{table}'")]
    FieldNotFound { table: String, field: String },

    /// Record width differs from the field list it is paired with
    #[error("number of columns ({columns}) != number of fields ({fields})")]
    ColumnCountMismatch { columns: usize, fields: usize },

    /// Unknown datatype tag
    #[error("invalid datatype: {0}")]
    InvalidDatatype(String),

    /// Raw text that cannot be cast to the declared datatype
    #[error("cannot cast '{value}' to {datatype}")]
    Cast { datatype: String, value: String },

    /// Date text matching none of the accepted shapes
    #[error("invalid date: '{0}'")]
    InvalidDate(String),

    /// Neither the plain nor the compressed file exists for a relation
    #[error("file does not exist at {}(.gz)", path.display())]
    TableFileNotFound { path: PathBuf },

    /// Write destination is not a directory
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// I/O error with the failing operation as context
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl DbError {
    /// Returns the broad class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DbError::SchemaNotFound { .. }
            | DbError::SchemaSyntax { .. }
            | DbError::TableRedefined(_)
            | DbError::NotADatabase { .. } => ErrorCategory::Schema,
            DbError::Io { .. } => ErrorCategory::Io,
            _ => ErrorCategory::Data,
        }
    }
}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, DbError>;
