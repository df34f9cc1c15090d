//! Parsed TSQL queries.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tsdb_core::codec::format_datetime;
use tsdb_core::Value;

/// Kind of query. `retrieve` parses to [`QueryType::Select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
}

/// A parsed select query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub query_type: QueryType,
    pub projection: Projection,
    /// Tables named in the `from` clause, in order
    pub tables: Vec<String>,
    /// Filter from the `where` clause
    pub condition: Option<Condition>,
}

impl Query {
    /// Creates a select query.
    pub fn select(
        projection: Projection,
        tables: Vec<String>,
        condition: Option<Condition>,
    ) -> Self {
        Self {
            query_type: QueryType::Select,
            projection,
            tables,
            condition,
        }
    }
}

/// Requested result columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// `*`: every column of the joined table
    All,
    Columns(Vec<ColumnRef>),
}

/// Column name with an optional table qualifier (`table:column`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(table: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            table: table.map(str::to_string),
            name: name.into(),
        }
    }

    /// Splits `table:column` at the last colon.
    pub fn parse(s: &str) -> Self {
        match s.rsplit_once(':') {
            Some((table, name)) if !table.is_empty() => Self::new(Some(table), name),
            Some((_, name)) => Self::new(None, name),
            None => Self::new(None, s),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}:{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Comparison operators. `=` parses to [`Operator::Eq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Regex search
    Match,
    /// Negated regex search
    NotMatch,
}

impl Operator {
    /// Looks up a comparison operator by its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" | "=" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "~" => Operator::Match,
            "!~" => Operator::NotMatch,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Match => "~",
            Operator::NotMatch => "!~",
        }
    }

    /// True for `<`, `<=`, `>`, and `>=`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge
        )
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Operator::Match | Operator::NotMatch)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Integer(i64),
    Date(NaiveDateTime),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::Text(s.clone()),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Date(dt) => Value::Date(*dt),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Date(dt) => f.write_str(&format_datetime(dt)),
        }
    }
}

/// Boolean filter tree of a `where` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Compare {
        op: Operator,
        column: ColumnRef,
        value: Literal,
    },
}

impl Condition {
    pub fn compare(op: Operator, column: ColumnRef, value: Literal) -> Self {
        Condition::Compare { op, column, value }
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Columns referenced by the tree, left to right, repeats included.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Condition::And(l, r) | Condition::Or(l, r) => {
                l.collect_columns(out);
                r.collect_columns(out);
            }
            Condition::Not(inner) => inner.collect_columns(out),
            Condition::Compare { column, .. } => out.push(column),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::And(l, r) => write!(f, "({l} and {r})"),
            Condition::Or(l, r) => write!(f, "({l} or {r})"),
            Condition::Not(inner) => write!(f, "not {inner}"),
            Condition::Compare { op, column, value } => write!(f, "{column} {op} {value}"),
        }
    }
}
