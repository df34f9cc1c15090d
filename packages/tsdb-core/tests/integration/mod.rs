//! Integration tests for database directories.
//!
//! 1. Opening databases and reading relations
//! 2. Writing whole databases, optionally under a new schema

pub mod database_tests;
pub mod helpers;
pub mod write_database_tests;
