//! Typed values produced by the checker.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::Span;

use super::config::ValueType;

/// A regular expression value: the source as written plus its compiled form.
///
/// Equality compares sources only.
#[derive(Clone)]
pub struct Regexp {
    source: String,
    compiled: Arc<Regex>,
}

impl Regexp {
    pub(crate) fn new(source: String, compiled: Arc<Regex>) -> Self {
        Self { source, compiled }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn compiled(&self) -> &Regex {
        &self.compiled
    }
}

impl fmt::Debug for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regexp").field(&self.source).finish()
    }
}

impl PartialEq for Regexp {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Regexp {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueData {
    String(String),
    Regexp(Regexp),
    Bool(bool),
}

/// A checked value together with its negation bit.
///
/// `span` points back into the input for diagnostics and is ignored by
/// equality, so `r:foo` and `repo:foo` produce equal values.
#[derive(Debug, Clone)]
pub struct Value {
    pub data: ValueData,
    pub negated: bool,
    pub span: Span,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.negated == other.negated
    }
}

impl Eq for Value {}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self.data {
            ValueData::String(_) => ValueType::String,
            ValueData::Regexp(_) => ValueType::Regexp,
            ValueData::Bool(_) => ValueType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            ValueData::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_regexp(&self) -> Option<&Regexp> {
        match &self.data {
            ValueData::Regexp(regexp) => Some(regexp),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            ValueData::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// The textual form: string contents, regexp source, or `yes`/`no`.
    pub fn to_text(&self) -> String {
        match &self.data {
            ValueData::String(value) => value.clone(),
            ValueData::Regexp(regexp) => regexp.source.clone(),
            ValueData::Bool(true) => "yes".to_string(),
            ValueData::Bool(false) => "no".to_string(),
        }
    }
}
