//! Structured code-search query language.
//!
//! This crate provides:
//! - A tokenizer/parser for queries mixing free-text patterns with
//!   `field:value` qualifiers (quoting, negation, field aliases)
//! - A configurable type checker producing a typed [`Query`]
//! - Search-type aware validation
//! - Resolution of a validated query into the [`PatternInfo`] handed to a
//!   matching engine

pub mod error;
pub mod query;
pub mod search;

// Re-export main types
pub use error::{ErrorKind, QueryError, Result, Span};
pub use query::{
    check, parse, process, validate, Config, Field, FieldType, ParseTree, Query, SearchType,
    Value, ValueData, ValueType,
};
pub use search::{resolve, PatternInfo, PatternKind, StructuralPattern, DEFAULT_FILE_MATCH_LIMIT};
