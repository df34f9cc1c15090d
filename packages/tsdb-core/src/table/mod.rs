//! Relation views over database files.

mod relation;

pub use relation::{Records, Relation};
