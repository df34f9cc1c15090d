//! Field definition within a relation.

use std::fmt;

use crate::codec::Datatype;

/// Fields whose null placeholder differs from their datatype's default.
pub const CODED_ATTRIBUTES: [(&str, &str); 3] =
    [("i-wf", "1"), ("i-difficulty", "1"), ("polarity", "-1")];

/// Column from which serialized field comments start.
const COMMENT_COLUMN: usize = 40;

/// Field definition within a relation.
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Declared datatype
    pub datatype: Datatype,
    /// Additional flags such as `:key` or `:foreign`
    pub flags: Vec<String>,
    /// Free-text description
    pub comment: Option<String>,
    /// True when a flag marks this field as a key
    pub is_key: bool,
    /// Text written in place of a null value
    pub default: String,
}

impl Field {
    /// Creates a new field, deriving `is_key` from the flags and `default`
    /// from the coded attributes or datatype.
    pub fn new<I>(
        name: impl Into<String>,
        datatype: Datatype,
        flags: I,
        comment: Option<String>,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let name = name.into();
        let flags: Vec<String> = flags.into_iter().map(Into::into).collect();
        let is_key = flags
            .iter()
            .any(|f| f == ":key" || f == ":primary" || f.starts_with(":foreign"));
        let default = CODED_ATTRIBUTES
            .iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, default)| default.to_string())
            .unwrap_or_else(|| datatype.default_text().to_string());
        Self {
            name,
            datatype,
            flags,
            comment,
            is_key,
            default,
        }
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.datatype == other.datatype && self.flags == other.flags
    }
}

impl Eq for Field {}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = format!("  {} {}", self.name, self.datatype);
        for flag in &self.flags {
            line.push(' ');
            line.push_str(flag);
        }
        match &self.comment {
            Some(comment) => write!(f, "{:<width$}# {}", line, comment, width = COMMENT_COLUMN),
            None => f.write_str(&line),
        }
    }
}

/// Maps field names to their column positions.
pub fn field_index(fields: &[Field]) -> std::collections::HashMap<String, usize> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| (field.name.clone(), i))
        .collect()
}
