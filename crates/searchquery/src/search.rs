//! Resolution of validated queries into matcher inputs.
//!
//! This module provides:
//! - The [`PatternKind`] variants understood by matching engines
//! - [`PatternInfo`], the contract handed to a matching engine
//! - [`resolve`], deriving a `PatternInfo` from a [`Query`](crate::Query)

mod pattern;

// Re-export main types
pub use pattern::{resolve, PatternInfo, PatternKind, StructuralPattern, DEFAULT_FILE_MATCH_LIMIT};
