//! # Bulwark Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Fixture spawning helpers
//! - Scripted fog and presentation collaborators
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collaborators;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
