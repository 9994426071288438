use std::fmt;
use std::path::PathBuf;

use crate::query::{Field, SearchType};

/// A byte range into the raw query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Errors produced while parsing, checking, validating or resolving a query.
///
/// These are user errors: they describe bad input and never abort the
/// process. Misuse of the typed [`Query`](crate::Query) accessors panics
/// instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("unterminated quoted string at {span}")]
    UnterminatedString { span: Span },

    #[error("expected a field name before ':' at {span}")]
    EmptyFieldName { span: Span },

    #[error("unrecognized field {field:?} at {span}")]
    UnknownField { field: String, span: Span },

    #[error("field \"{field}\" does not support negation at {span}")]
    NegationNotAllowed { field: Field, span: Span },

    #[error("invalid regular expression for field \"{field}\" at {span}: {source}")]
    RegexpSyntax {
        field: Field,
        span: Span,
        #[source]
        source: regex::Error,
    },

    #[error("invalid boolean {value:?} for field \"{field}\" at {span}, expected yes/no, true/false or 1/0")]
    BoolSyntax {
        field: Field,
        value: String,
        span: Span,
    },

    #[error("invalid number {value:?} for field \"{field}\" at {span}, expected a positive integer")]
    IntSyntax {
        field: Field,
        value: String,
        span: Span,
    },

    #[error("field \"{field}\" requires a value at {span}")]
    EmptySingularValue { field: Field, span: Span },

    #[error("the parameter \"{field}:\" is not valid for {search_type} search, {reason}")]
    IllegalFieldForMode {
        field: Field,
        search_type: SearchType,
        reason: &'static str,
    },

    #[error("invalid value {value:?} for field \"{field}\" at {span}")]
    InvalidValue {
        field: Field,
        value: String,
        span: Span,
    },

    #[error("invalid {field} pattern: {source}")]
    InvalidPattern {
        field: Field,
        #[source]
        source: Box<regex_syntax::Error>,
    },

    #[error("invalid query config: {0}")]
    InvalidConfig(String),

    #[error("failed to read query config {path}: {message}")]
    ConfigIo { path: PathBuf, message: String },
}

/// Discriminant of [`QueryError`], for callers that branch on the failure
/// class without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnterminatedString,
    EmptyFieldName,
    UnknownField,
    NegationNotAllowed,
    RegexpSyntax,
    BoolSyntax,
    IntSyntax,
    EmptySingularValue,
    IllegalFieldForMode,
    InvalidValue,
    InvalidPattern,
    InvalidConfig,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnterminatedString { .. } => ErrorKind::UnterminatedString,
            Self::EmptyFieldName { .. } => ErrorKind::EmptyFieldName,
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::NegationNotAllowed { .. } => ErrorKind::NegationNotAllowed,
            Self::RegexpSyntax { .. } => ErrorKind::RegexpSyntax,
            Self::BoolSyntax { .. } => ErrorKind::BoolSyntax,
            Self::IntSyntax { .. } => ErrorKind::IntSyntax,
            Self::EmptySingularValue { .. } => ErrorKind::EmptySingularValue,
            Self::IllegalFieldForMode { .. } => ErrorKind::IllegalFieldForMode,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            Self::InvalidConfig(_) | Self::ConfigIo { .. } => ErrorKind::InvalidConfig,
        }
    }

    /// The canonical field the error refers to, if any.
    ///
    /// `UnknownField` has no canonical field; use [`field_name`](Self::field_name).
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::NegationNotAllowed { field, .. }
            | Self::RegexpSyntax { field, .. }
            | Self::BoolSyntax { field, .. }
            | Self::IntSyntax { field, .. }
            | Self::EmptySingularValue { field, .. }
            | Self::IllegalFieldForMode { field, .. }
            | Self::InvalidValue { field, .. }
            | Self::InvalidPattern { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// The field name as the user wrote it (lowercased) or its canonical name.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::UnknownField { field, .. } => Some(field.as_str()),
            _ => self.field().map(Field::as_str),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnterminatedString { span }
            | Self::EmptyFieldName { span }
            | Self::UnknownField { span, .. }
            | Self::NegationNotAllowed { span, .. }
            | Self::RegexpSyntax { span, .. }
            | Self::BoolSyntax { span, .. }
            | Self::IntSyntax { span, .. }
            | Self::EmptySingularValue { span, .. }
            | Self::InvalidValue { span, .. } => Some(*span),
            Self::IllegalFieldForMode { .. }
            | Self::InvalidPattern { .. }
            | Self::InvalidConfig(_)
            | Self::ConfigIo { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
