//! Storage layer for TSDB test suite databases.
//!
//! Provides the schema model, value codec, transparent plain/gzip relation
//! files with atomic writes, and lazily iterated relation views.

pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod persistence;
pub mod schema;
pub mod table;

pub use codec::{Datatype, Record, Value};
pub use database::Database;
pub use error::{DbError, ErrorCategory};
pub use schema::{Field, Schema};
pub use table::Relation;
