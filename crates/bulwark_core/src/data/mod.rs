//! Data structures for externally supplied unit stats.
//!
//! This module contains pure data types deserialized from tech-tree JSON.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! in-memory lookup. Reading stat files from disk is the embedder's job.

mod unit_data;

pub use unit_data::{StatTable, UnitStats};

/// Synchronous unit-definition lookup by kind name.
///
/// The core only ever calls this once per spawn; absent or non-positive
/// fields fall back to hard-coded per-kind defaults in the factory.
pub trait StatProvider {
    /// Look up the stat record for a unit kind, if one exists.
    fn unit(&self, kind: &str) -> Option<&UnitStats>;
}
