//! CLI tool for inspecting, querying, and copying TSDB databases.
//!
//! Provides commands for:
//! - Printing a database schema or a relation's rows
//! - Running and parsing TSQL queries
//! - Copying a database with compression changes or a new schema

mod cli;

use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use tsdb_core::codec::encode;
use tsdb_core::persistence::write_database;
use tsdb_core::schema::read_schema;
use tsdb_core::{Database, Value};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run(cli.command, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run(command: Commands, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Schema { db } => {
            let db = open_database(&db)?;
            writeln!(out, "{}", db.schema())?;
        }
        Commands::Cat { db, table, columns } => {
            let db = open_database(&db)?;
            let relation = db.relation(&table)?;
            let names: Vec<&str> = columns.iter().map(String::as_str).collect();
            for record in relation.select(&names)? {
                writeln!(out, "{}", encode(&record?, None)?)?;
            }
        }
        Commands::Select { db, query, json } => {
            let db = open_database(&db)?;
            let selection = tsdb_query::select(&query, &db)?;
            tracing::debug!(
                "Selecting {:?} from {}",
                selection.columns(),
                selection.table().name()
            );
            for record in selection.rows()? {
                let record = record?;
                if json {
                    writeln!(out, "{}", row_to_json(selection.columns(), &record))?;
                } else {
                    writeln!(out, "{}", encode(&record, None)?)?;
                }
            }
        }
        Commands::Parse { query } => {
            let query = tsdb_query::parse_query(&query)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&query)?)?;
        }
        Commands::Copy {
            src,
            dest,
            schema,
            gzip,
            no_gzip,
            tables,
        } => {
            let db = open_database(&src)?;
            let schema = schema
                .map(|path| {
                    read_schema(&path)
                        .with_context(|| format!("Failed to read schema {}", path.display()))
                })
                .transpose()?;
            let names: Vec<&str> = tables.iter().map(String::as_str).collect();
            write_database(
                &db,
                &dest,
                (!names.is_empty()).then_some(names.as_slice()),
                schema.as_ref(),
                Commands::gzip_policy(gzip, no_gzip),
            )
            .with_context(|| format!("Failed to write database {}", dest.display()))?;
            tracing::info!("Copied {} to {}", src.display(), dest.display());
        }
    }
    Ok(())
}

fn open_database(path: &Path) -> Result<Database> {
    Database::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Renders a result row as a JSON object keyed by column label.
fn row_to_json(columns: &[String], record: &[Value]) -> serde_json::Value {
    let object = columns
        .iter()
        .zip(record)
        .map(|(column, value)| {
            let value = match value {
                Value::Null => serde_json::Value::Null,
                Value::Integer(i) => serde_json::Value::from(*i),
                Value::Float(x) => serde_json::Value::from(*x),
                Value::Text(_) | Value::Date(_) => serde_json::Value::from(value.to_string()),
            };
            (column.clone(), value)
        })
        .collect();
    serde_json::Value::Object(object)
}
