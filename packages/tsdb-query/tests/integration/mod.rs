//! Integration tests running TSQL queries against database directories.
//!
//! 1. Single-relation selects
//! 2. Joins driven by `from`, `where`, and projected columns

pub mod helpers;
pub mod join_tests;
pub mod select_tests;
