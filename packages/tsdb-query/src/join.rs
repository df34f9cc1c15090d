//! Joined tables and the join planner.
//!
//! Relations are joined on shared key fields. When two relations share no
//! key, a breadth-first search over the schema finds intermediate relations
//! that connect them, and those are joined in first.

use std::collections::{BTreeSet, HashMap, HashSet};

use tsdb_core::{Database, Field, Record, Relation, Schema, Value};

use crate::ast::ColumnRef;
use crate::error::{QueryError, Result};

/// Join semantics for rows of the left table without a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Drop unmatched rows
    Inner,
    /// Keep unmatched rows, with nulls for the right table's columns
    Left,
}

/// Field of a joined table with the relation it came from.
#[derive(Debug, Clone)]
pub struct TaggedField {
    pub table: String,
    pub field: Field,
}

#[derive(Debug, Clone)]
enum Rows {
    /// Rows still on disk, streamed on demand
    Relation(Relation),
    Materialized(Vec<Record>),
}

/// One relation, or several joined together.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    /// Constituent relation names
    tables: BTreeSet<String>,
    fields: Vec<TaggedField>,
    rows: Rows,
}

impl JoinedTable {
    /// Wraps a single relation without reading it.
    pub fn from_relation(relation: Relation) -> Self {
        let name = relation.name().to_string();
        let fields = relation
            .fields()
            .iter()
            .map(|field| TaggedField {
                table: name.clone(),
                field: field.clone(),
            })
            .collect();
        Self {
            tables: BTreeSet::from([name]),
            fields,
            rows: Rows::Relation(relation),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_rows(table: &str, fields: Vec<Field>, rows: Vec<Record>) -> Self {
        Self {
            tables: BTreeSet::from([table.to_string()]),
            fields: fields
                .into_iter()
                .map(|field| TaggedField {
                    table: table.to_string(),
                    field,
                })
                .collect(),
            rows: Rows::Materialized(rows),
        }
    }

    pub fn tables(&self) -> &BTreeSet<String> {
        &self.tables
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains(name)
    }

    /// Constituent names joined with `+`, for messages.
    pub fn name(&self) -> String {
        self.tables
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("+")
    }

    pub fn fields(&self) -> &[TaggedField] {
        &self.fields
    }

    /// Finds the position of `column`.
    ///
    /// A qualified column first matches a field from that exact relation;
    /// failing that, if the relation is a constituent, the first field with
    /// the bare name (a join key merged into another constituent's column).
    /// Unqualified columns match the first field with the name.
    pub fn column_index(&self, column: &ColumnRef) -> Option<usize> {
        let by_name = || {
            self.fields
                .iter()
                .position(|f| f.field.name == column.name)
        };
        match &column.table {
            Some(table) => self
                .fields
                .iter()
                .position(|f| f.table == *table && f.field.name == column.name)
                .or_else(|| self.contains_table(table).then(by_name).flatten()),
            None => by_name(),
        }
    }

    /// Streams the rows, reopening the relation file if nothing has been
    /// joined or filtered yet.
    pub fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<Record>> + '_>> {
        let rows: Box<dyn Iterator<Item = Result<Record>> + '_> = match &self.rows {
            Rows::Relation(relation) => {
                Box::new(relation.records()?.map(|r| r.map_err(QueryError::from)))
            }
            Rows::Materialized(rows) => Box::new(rows.iter().cloned().map(Ok)),
        };
        Ok(rows)
    }

    /// Replaces the rows, keeping the fields.
    pub(crate) fn with_rows(self, rows: Vec<Record>) -> Self {
        Self {
            rows: Rows::Materialized(rows),
            ..self
        }
    }
}

/// Joins `right` onto `left`.
///
/// The pivot is every key field of `left` whose name `right` also declares.
/// Joined rows are the left columns followed by the right table's non-pivot
/// columns.
pub fn join(left: JoinedTable, right: JoinedTable, how: JoinKind) -> Result<JoinedTable> {
    let pivot: Vec<(usize, usize)> = left
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.field.is_key)
        .filter_map(|(i, f)| {
            right
                .fields
                .iter()
                .position(|r| r.field.name == f.field.name)
                .map(|j| (i, j))
        })
        .collect();
    if pivot.is_empty() {
        return Err(QueryError::Unjoinable {
            left: left.name(),
            right: right.name(),
        });
    }
    let kept: Vec<usize> = (0..right.fields.len())
        .filter(|j| !pivot.iter().any(|&(_, p)| p == *j))
        .collect();

    let mut index: HashMap<Vec<Option<String>>, Vec<Record>> = HashMap::new();
    for record in right.rows()? {
        let record = record?;
        let key = pivot.iter().map(|&(_, j)| join_key(&record[j])).collect();
        index
            .entry(key)
            .or_default()
            .push(kept.iter().map(|&j| record[j].clone()).collect());
    }

    let mut rows = Vec::new();
    for record in left.rows()? {
        let record = record?;
        let key: Vec<Option<String>> = pivot.iter().map(|&(i, _)| join_key(&record[i])).collect();
        match index.get(&key) {
            Some(matches) => {
                for extra in matches {
                    let mut row = record.clone();
                    row.extend(extra.iter().cloned());
                    rows.push(row);
                }
            }
            None if how == JoinKind::Left => {
                let mut row = record;
                row.resize(row.len() + kept.len(), Value::Null);
                rows.push(row);
            }
            None => {}
        }
    }

    let pivot_names: Vec<&str> = pivot
        .iter()
        .map(|&(i, _)| left.fields[i].field.name.as_str())
        .collect();
    tracing::debug!(
        "Joined {} and {} on {:?} ({:?}): {} rows",
        left.name(),
        right.name(),
        pivot_names,
        how,
        rows.len()
    );

    let mut tables = left.tables;
    tables.extend(right.tables);
    let mut fields = left.fields;
    fields.extend(kept.iter().map(|&j| right.fields[j].clone()));
    Ok(JoinedTable {
        tables,
        fields,
        rows: Rows::Materialized(rows),
    })
}

fn join_key(value: &Value) -> Option<String> {
    (!value.is_null()).then(|| value.to_string())
}

/// Finds relations that connect `src` to a relation with key fields
/// `target_keys`, in join order.
///
/// Paths start at each key field of `src` and grow through relations that
/// declare the last key and have more than one key themselves. The first
/// path ending in a target key wins; an empty path means the tables are
/// directly joinable and `None` means no path exists.
pub fn join_path(src: &JoinedTable, target_keys: &[&str], schema: &Schema) -> Option<Vec<String>> {
    let mut paths: Vec<Vec<(&str, &str)>> = src
        .fields
        .iter()
        .filter(|f| f.field.is_key)
        .map(|f| vec![(f.table.as_str(), f.field.name.as_str())])
        .collect();
    let mut visited: HashSet<&str> = src.tables.iter().map(String::as_str).collect();

    loop {
        let mut next_paths = Vec::new();
        for path in &paths {
            let &(_, key) = path.last()?;
            if target_keys.contains(&key) {
                return Some(path[1..].iter().map(|&(t, _)| t.to_string()).collect());
            }
            for table in schema.find(key) {
                if !visited.insert(table) {
                    continue;
                }
                let keys = schema.keys(table);
                if keys.len() < 2 {
                    continue;
                }
                for key in keys {
                    let step = (table, key);
                    if !path.contains(&step) {
                        let mut extended = path.clone();
                        extended.push(step);
                        next_paths.push(extended);
                    }
                }
            }
        }
        if next_paths.is_empty() {
            return None;
        }
        paths = next_paths;
    }
}

/// Joins relation `name` onto `table`, through intermediate relations if
/// the two share no key. With no table yet, the relation itself is returned.
pub fn transitive_join(
    table: Option<JoinedTable>,
    name: &str,
    db: &Database,
    how: JoinKind,
) -> Result<JoinedTable> {
    let Some(mut table) = table else {
        return Ok(JoinedTable::from_relation(db.relation(name)?));
    };
    if table.contains_table(name) {
        return Ok(table);
    }
    let target_keys = db.schema().keys(name);
    match join_path(&table, &target_keys, db.schema()) {
        Some(path) => {
            for intermediate in path {
                if table.contains_table(&intermediate) {
                    continue;
                }
                tracing::debug!("Joining {} on the way to {}", intermediate, name);
                let relation = JoinedTable::from_relation(db.relation(&intermediate)?);
                table = join(table, relation, how)?;
            }
        }
        None => tracing::debug!("No join path from {} to {}", table.name(), name),
    }
    if table.contains_table(name) {
        return Ok(table);
    }
    join(table, JoinedTable::from_relation(db.relation(name)?), how)
}

/// Joins in the relation supplying `column` unless `table` already has it.
///
/// Unqualified columns come from the first relation in the schema that
/// declares them.
pub fn join_if_missing(
    table: Option<JoinedTable>,
    column: &ColumnRef,
    db: &Database,
    how: JoinKind,
) -> Result<JoinedTable> {
    match table {
        Some(table) if table.column_index(column).is_some() => Ok(table),
        table => {
            let name = match &column.table {
                Some(name) => name.clone(),
                None => db
                    .schema()
                    .find(&column.name)
                    .first()
                    .map(|name| name.to_string())
                    .ok_or_else(|| QueryError::UnresolvedColumn(column.to_string()))?,
            };
            transitive_join(table, &name, db, how)
        }
    }
}
