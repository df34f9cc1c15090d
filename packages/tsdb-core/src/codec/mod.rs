//! Encoding and decoding of relation lines.
//!
//! A relation line holds one record: columns joined by
//! [`FIELD_DELIMITER`](crate::config::FIELD_DELIMITER), with reserved
//! characters escaped as
//!
//! ```text
//! \          ->  \\
//! (newline)  ->  \n
//! @          ->  \s
//! ```

mod date;
mod value;

use std::collections::HashMap;

pub use date::{format_datetime, month_number, parse_datetime, MONTHS};
pub use value::{cast, format, Datatype, Value};

use crate::config::FIELD_DELIMITER;
use crate::error::{DbError, Result};
use crate::schema::Field;

/// A row of column values, positionally aligned with a field list.
pub type Record = Vec<Value>;

/// Replaces reserved characters with their escape sequences.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            FIELD_DELIMITER => out.push_str("\\s"),
            c => out.push(c),
        }
    }
    out
}

/// Replaces escape sequences with the characters they stand for.
///
/// The input is scanned left to right, so `\\` is consumed as a unit before
/// the character after it is considered. Unknown sequences and a trailing
/// lone backslash are kept verbatim.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('s') => out.push(FIELD_DELIMITER),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Decodes a raw relation line into a record.
///
/// Empty columns are null. With `fields`, each column is cast to its
/// field's datatype; without, columns stay untyped text.
pub fn decode(line: &str, fields: Option<&[Field]>) -> Result<Record> {
    let line = line
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line);
    let raw: Vec<Option<String>> = line
        .split(FIELD_DELIMITER)
        .map(|col| (!col.is_empty()).then(|| unescape(col)))
        .collect();

    match fields {
        Some(fields) => {
            check_counts(raw.len(), fields.len())?;
            raw.iter()
                .zip(fields)
                .map(|(col, field)| cast(field.datatype, col.as_deref()))
                .collect()
        }
        None => Ok(raw.into_iter().map(Value::from).collect()),
    }
}

/// Encodes a record as a relation line (without the trailing newline).
///
/// With `fields`, nulls are replaced by each field's default and values are
/// formatted by datatype; without, nulls become empty columns.
pub fn encode(record: &[Value], fields: Option<&[Field]>) -> Result<String> {
    let raw: Vec<String> = match fields {
        Some(fields) => {
            check_counts(record.len(), fields.len())?;
            record
                .iter()
                .zip(fields)
                .map(|(value, field)| format(field.datatype, value, Some(&field.default)))
                .collect()
        }
        None => record.iter().map(Value::to_string).collect(),
    };
    let escaped: Vec<String> = raw.iter().map(|col| escape(col)).collect();
    Ok(escaped.join(&FIELD_DELIMITER.to_string()))
}

/// Builds a record in `fields` order from a column-name map, leaving absent
/// columns null.
pub fn make_record(columns: &HashMap<String, Value>, fields: &[Field]) -> Record {
    fields
        .iter()
        .map(|field| columns.get(&field.name).cloned().unwrap_or(Value::Null))
        .collect()
}

fn check_counts(columns: usize, fields: usize) -> Result<()> {
    if columns != fields {
        return Err(DbError::ColumnCountMismatch { columns, fields });
    }
    Ok(())
}
