//! # Hexworld Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Grid and world fixtures
//! - A recording view that doubles as listener and animation signal
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
