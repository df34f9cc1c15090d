//! Query error types.

use thiserror::Error;
use tsdb_core::DbError;

/// Query parsing and execution errors.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Lexical, grammatical, or operator/operand type error
    #[error("{message} (line {lineno}){}", show_text(.text))]
    Syntax {
        message: String,
        lineno: usize,
        /// Byte offset within the line, for lexical errors
        offset: Option<usize>,
        /// Offending token or line
        text: Option<String>,
    },

    /// Tables with no shared key field and no join path between them
    #[error("cannot join '{left}' and '{right}': no shared key")]
    Unjoinable { left: String, right: String },

    /// Column that no relation in the schema declares
    #[error("unresolved column: {0}")]
    UnresolvedColumn(String),

    /// Query naming no table, column, or condition to select from
    #[error("query selects from no relation")]
    NoRelation,

    /// Regex in a condition that does not compile
    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl QueryError {
    pub(crate) fn syntax(message: impl Into<String>, lineno: usize, text: Option<&str>) -> Self {
        QueryError::Syntax {
            message: message.into(),
            lineno,
            offset: None,
            text: text.map(str::to_string),
        }
    }
}

fn show_text(text: &Option<String>) -> String {
    text.as_ref().map(|t| format!(": {t}")).unwrap_or_default()
}

/// Result alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
