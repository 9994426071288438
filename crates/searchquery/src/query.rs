//! The structured search-query language.
//!
//! Raw input flows through three stages:
//! - [`parse`]: tokenize into a flat [`ParseTree`] of `[-]field:value` and
//!   pattern expressions
//! - [`check`]: resolve aliases and convert every value to its field's type,
//!   producing a [`Query`]
//! - [`validate`]: reject field combinations that the chosen [`SearchType`]
//!   does not support
//!
//! [`process`] runs all three against the default schema.

mod checked;
mod checker;
mod config;
mod field;
mod render;
mod syntax;
mod validate;
mod value;

pub use checked::Query;
pub use checker::check;
pub use config::{Config, FieldType, ValueType, DEFAULT_CONFIG};
pub use field::Field;
pub use syntax::{parse, Expr, ParseTree};
pub use validate::{process, validate, SearchType};
pub use value::{Regexp, Value, ValueData};
