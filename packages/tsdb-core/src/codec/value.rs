//! Typed column values and datatype casting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::date::{format_datetime, parse_datetime};
use crate::error::{DbError, Result};

/// Column datatype as declared in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    Integer,
    String,
    Float,
    Date,
}

impl Datatype {
    /// Returns the schema tag for this datatype (e.g. `:integer`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Integer => ":integer",
            Datatype::String => ":string",
            Datatype::Float => ":float",
            Datatype::Date => ":date",
        }
    }

    /// Text substituted for a null value when no field default is known.
    pub fn default_text(&self) -> &'static str {
        match self {
            Datatype::Integer => "-1",
            _ => "",
        }
    }
}

impl FromStr for Datatype {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ":integer" => Ok(Datatype::Integer),
            ":string" => Ok(Datatype::String),
            ":float" => Ok(Datatype::Float),
            ":date" => Ok(Datatype::Date),
            other => Err(DbError::InvalidDatatype(other.to_string())),
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Orders two values of comparable kinds.
    ///
    /// Integers and floats compare numerically with each other; text,
    /// dates, and everything involving null are only comparable within
    /// their own kind (null with nothing).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(dt) => f.write_str(&format_datetime(dt)),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Casts raw column text into `datatype`.
///
/// `None` and the empty string are null for every datatype.
pub fn cast(datatype: Datatype, raw: Option<&str>) -> Result<Value> {
    let raw = match raw {
        None | Some("") => return Ok(Value::Null),
        Some(raw) => raw,
    };
    let cast_error = || DbError::Cast {
        datatype: datatype.to_string(),
        value: raw.to_string(),
    };
    match datatype {
        Datatype::Integer => raw.trim().parse().map(Value::Integer).map_err(|_| cast_error()),
        Datatype::Float => raw.trim().parse().map(Value::Float).map_err(|_| cast_error()),
        Datatype::Date => parse_datetime(raw).map(Value::Date),
        Datatype::String => Ok(Value::Text(raw.to_string())),
    }
}

/// Formats `value` as column text for `datatype`.
///
/// Null becomes `default` when given, otherwise the datatype's default
/// (`-1` for integers, empty otherwise).
pub fn format(datatype: Datatype, value: &Value, default: Option<&str>) -> String {
    match value {
        Value::Null => default.unwrap_or(datatype.default_text()).to_string(),
        other => other.to_string(),
    }
}
