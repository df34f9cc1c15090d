use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the schema of a database
    Schema {
        /// Database directory
        db: PathBuf,
    },

    /// Print the rows of one relation
    Cat {
        /// Database directory
        db: PathBuf,

        /// Relation name
        table: String,

        /// Columns to print (default: all)
        columns: Vec<String>,
    },

    /// Run a TSQL select query
    Select {
        /// Database directory
        db: PathBuf,

        /// Query text; the leading `select` is optional
        query: String,

        /// Print rows as JSON objects keyed by column
        #[arg(long)]
        json: bool,
    },

    /// Parse a TSQL query and print its syntax tree as JSON
    Parse {
        /// Query text, including the query type
        query: String,
    },

    /// Copy a database, optionally remapping it onto another schema
    Copy {
        /// Source database directory
        src: PathBuf,

        /// Destination database directory
        dest: PathBuf,

        /// Schema file or database directory for the destination
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Compress every non-empty relation
        #[arg(long, conflicts_with = "no_gzip")]
        gzip: bool,

        /// Write every relation uncompressed
        #[arg(long)]
        no_gzip: bool,

        /// Relations to copy (repeatable; default: all)
        #[arg(long = "table", value_name = "NAME")]
        tables: Vec<String>,
    },
}

impl Commands {
    /// Compression policy requested by `copy` flags.
    pub fn gzip_policy(gzip: bool, no_gzip: bool) -> Option<bool> {
        match (gzip, no_gzip) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
