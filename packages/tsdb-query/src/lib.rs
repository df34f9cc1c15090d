//! TSQL, the test suite query language.
//!
//! Queries are tokenized, parsed into a [`Query`], and run against a
//! [`tsdb_core::Database`] by joining the relations that supply the
//! requested and filtered columns.
//!
//! ```no_run
//! use tsdb_core::Database;
//!
//! let db = Database::open("profiles/mrs")?;
//! let selection = tsdb_query::select("i-id i-input where i-wf = 1", &db)?;
//! for row in selection.rows()? {
//!     println!("{:?}", row?);
//! }
//! # Ok::<(), tsdb_query::QueryError>(())
//! ```

pub mod ast;
pub mod error;
pub mod executor;
pub mod join;
pub mod lexer;
pub mod parser;

pub use ast::{ColumnRef, Condition, Literal, Operator, Projection, Query, QueryType};
pub use error::{QueryError, Result};
pub use executor::{execute, select, Predicate, RowLookup, Selection};
pub use parser::{parse, parse_query, parse_select};
