//! Query execution.
//!
//! A query runs in three stages over a growing joined table: the `from`
//! relations are inner-joined, relations supplying condition columns are
//! left-joined and the rows filtered, and relations supplying projected
//! columns are inner-joined last.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;
use tsdb_core::{Database, Record, Value};

use crate::ast::{ColumnRef, Condition, Literal, Operator, Projection, Query};
use crate::error::{QueryError, Result};
use crate::join::{join_if_missing, transitive_join, JoinKind, JoinedTable};
use crate::parser::parse;

/// Projected result of a query.
#[derive(Debug)]
pub struct Selection {
    /// Result column labels
    columns: Vec<String>,
    /// Positions of the result columns in the joined table
    indices: Vec<usize>,
    table: JoinedTable,
}

impl Selection {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The fully joined table the rows are projected from.
    pub fn table(&self) -> &JoinedTable {
        &self.table
    }

    /// Streams the projected rows.
    pub fn rows(&self) -> Result<impl Iterator<Item = Result<Record>> + '_> {
        let indices = &self.indices;
        Ok(self.table.rows()?.map(move |record| {
            record.map(|record| indices.iter().map(|&i| record[i].clone()).collect())
        }))
    }

    /// Collects every projected row.
    pub fn collect_rows(&self) -> Result<Vec<Record>> {
        self.rows()?.collect()
    }
}

/// Parses and runs `query` against `db`. The leading query type is optional.
pub fn select(query: &str, db: &Database) -> Result<Selection> {
    execute(&parse(query)?, db)
}

/// Runs a parsed query against `db`.
pub fn execute(query: &Query, db: &Database) -> Result<Selection> {
    let table = select_from(&query.tables, None, db)?;
    let table = select_where(query.condition.as_ref(), table, db)?;
    let table = select_projection(&query.projection, table, db)?;
    let table = table.ok_or(QueryError::NoRelation)?;

    let (columns, indices) = match &query.projection {
        Projection::All => table
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (f.field.name.clone(), i))
            .unzip(),
        Projection::Columns(columns) => columns
            .iter()
            .map(|column| {
                table
                    .column_index(column)
                    .map(|i| (column.to_string(), i))
                    .ok_or_else(|| QueryError::UnresolvedColumn(column.to_string()))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip(),
    };
    Ok(Selection {
        columns,
        indices,
        table,
    })
}

fn select_from(
    tables: &[String],
    mut table: Option<JoinedTable>,
    db: &Database,
) -> Result<Option<JoinedTable>> {
    for name in tables {
        if table.as_ref().is_some_and(|t| t.contains_table(name)) {
            continue;
        }
        table = Some(transitive_join(table, name, db, JoinKind::Inner)?);
    }
    Ok(table)
}

fn select_where(
    condition: Option<&Condition>,
    mut table: Option<JoinedTable>,
    db: &Database,
) -> Result<Option<JoinedTable>> {
    let Some(condition) = condition else {
        return Ok(table);
    };
    let columns = condition.columns();
    for column in &columns {
        table = Some(join_if_missing(table, column, db, JoinKind::Left)?);
    }
    let Some(table) = table else {
        return Ok(None);
    };

    let positions = columns
        .into_iter()
        .map(|column| {
            table
                .column_index(column)
                .map(|i| (column, i))
                .ok_or_else(|| QueryError::UnresolvedColumn(column.to_string()))
        })
        .collect::<Result<HashMap<_, _>>>()?;
    let predicate = Predicate::new(condition)?;

    let mut rows = Vec::new();
    let mut total = 0usize;
    for record in table.rows()? {
        let record = record?;
        total += 1;
        let row = IndexedRow {
            record: &record,
            positions: &positions,
        };
        if predicate.evaluate(&row) {
            rows.push(record);
        }
    }
    tracing::debug!(
        "Filter on {} kept {} of {} rows",
        table.name(),
        rows.len(),
        total
    );
    Ok(Some(table.with_rows(rows)))
}

fn select_projection(
    projection: &Projection,
    mut table: Option<JoinedTable>,
    db: &Database,
) -> Result<Option<JoinedTable>> {
    if let Projection::Columns(columns) = projection {
        for column in columns {
            table = Some(join_if_missing(table, column, db, JoinKind::Inner)?);
        }
    }
    Ok(table)
}

/// Column access for evaluating conditions against one row.
pub trait RowLookup {
    /// Returns the value of `column`, or `None` if the row lacks it.
    fn lookup(&self, column: &ColumnRef) -> Option<&Value>;
}

struct IndexedRow<'a> {
    record: &'a Record,
    positions: &'a HashMap<&'a ColumnRef, usize>,
}

impl RowLookup for IndexedRow<'_> {
    fn lookup(&self, column: &ColumnRef) -> Option<&Value> {
        self.positions
            .get(column)
            .and_then(|&i| self.record.get(i))
    }
}

impl RowLookup for HashMap<ColumnRef, Value> {
    fn lookup(&self, column: &ColumnRef) -> Option<&Value> {
        self.get(column)
    }
}

/// Condition tree with its regular expressions compiled.
///
/// Null and missing values satisfy only `!=` and `!~`. Numbers compare
/// across integer and float; other mismatched kinds are never equal or
/// ordered. Regexes search the value's text form.
#[derive(Debug)]
pub struct Predicate<'a> {
    condition: &'a Condition,
    regexes: HashMap<&'a str, Regex>,
}

impl<'a> Predicate<'a> {
    pub fn new(condition: &'a Condition) -> Result<Self> {
        let mut regexes = HashMap::new();
        let mut pending = vec![condition];
        while let Some(node) = pending.pop() {
            match node {
                Condition::And(l, r) | Condition::Or(l, r) => {
                    pending.push(l);
                    pending.push(r);
                }
                Condition::Not(inner) => pending.push(inner),
                Condition::Compare {
                    op,
                    value: Literal::String(pattern),
                    ..
                } if op.is_regex() => {
                    let regex =
                        Regex::new(pattern).map_err(|source| QueryError::InvalidRegex {
                            pattern: pattern.clone(),
                            source,
                        })?;
                    regexes.insert(pattern.as_str(), regex);
                }
                Condition::Compare { .. } => {}
            }
        }
        Ok(Self { condition, regexes })
    }

    pub fn evaluate(&self, row: &impl RowLookup) -> bool {
        self.eval(self.condition, row)
    }

    fn eval(&self, condition: &Condition, row: &impl RowLookup) -> bool {
        match condition {
            Condition::And(l, r) => self.eval(l, row) && self.eval(r, row),
            Condition::Or(l, r) => self.eval(l, row) || self.eval(r, row),
            Condition::Not(inner) => !self.eval(inner, row),
            Condition::Compare { op, column, value } => {
                self.compare(*op, row.lookup(column), value)
            }
        }
    }

    fn compare(&self, op: Operator, value: Option<&Value>, literal: &Literal) -> bool {
        let value = match value {
            Some(value) if !value.is_null() => value,
            _ => return matches!(op, Operator::Ne | Operator::NotMatch),
        };
        if op.is_regex() {
            let found = match literal {
                Literal::String(pattern) => self
                    .regexes
                    .get(pattern.as_str())
                    .is_some_and(|re| re.is_match(&value.to_string())),
                _ => false,
            };
            return found == (op == Operator::Match);
        }
        let ordering = value.compare(&literal.to_value());
        match op {
            Operator::Eq => ordering == Some(Ordering::Equal),
            Operator::Ne => ordering != Some(Ordering::Equal),
            Operator::Lt => ordering == Some(Ordering::Less),
            Operator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Operator::Gt => ordering == Some(Ordering::Greater),
            Operator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Operator::Match | Operator::NotMatch => false,
        }
    }
}
