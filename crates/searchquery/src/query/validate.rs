//! Search types, cross-field validation and the parse/check/validate pipeline.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

use super::checked::Query;
use super::config::{Config, DEFAULT_CONFIG};
use super::field::Field;
use super::syntax::ParseTree;

/// The family of search a query is run as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Literal,
    #[default]
    Regexp,
    Structural,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Literal => "literal",
            SearchType::Regexp => "regexp",
            SearchType::Structural => "structural",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(SearchType::Literal),
            "regexp" | "regex" => Ok(SearchType::Regexp),
            "structural" => Ok(SearchType::Structural),
            _ => Err(format!("unknown search type: {s}")),
        }
    }
}

/// Rejects field combinations that make no sense for `search_type`.
///
/// Structural search is always case-sensitive and always matches file
/// content, so `case:` is rejected outright and `type:` is rejected when a
/// pattern is present.
pub fn validate(query: &Query, search_type: SearchType) -> Result<()> {
    if search_type == SearchType::Structural {
        if query.contains(Field::Case) {
            return Err(QueryError::IllegalFieldForMode {
                field: Field::Case,
                search_type,
                reason: "matching is always case-sensitive",
            });
        }
        if query.contains(Field::Type) && !query.joined_default_values().is_empty() {
            return Err(QueryError::IllegalFieldForMode {
                field: Field::Type,
                search_type,
                reason: "search is always performed on file content",
            });
        }
    }
    log::debug!("validated query for {search_type} search");
    Ok(())
}

/// Parses, checks and validates `input` against the default schema.
pub fn process(input: &str, search_type: SearchType) -> Result<(Query, ParseTree)> {
    Config::process(&DEFAULT_CONFIG, input, search_type)
}

impl Config {
    /// Runs the full pipeline against `config`, stopping at the first error.
    pub fn process(
        config: &Arc<Config>,
        input: &str,
        search_type: SearchType,
    ) -> Result<(Query, ParseTree)> {
        let tree = config.parse(input)?;
        let query = Config::check(config, &tree)?;
        validate(&query, search_type)?;
        Ok((query, tree))
    }
}

impl Query {
    /// The search type selected by a `patterntype:` qualifier, or `fallback`
    /// when there is none. The last occurrence wins.
    pub fn search_type(&self, fallback: SearchType) -> Result<SearchType> {
        let Some(value) = self.values(Field::PatternType).last() else {
            return Ok(fallback);
        };
        let raw = value.to_text();
        raw.parse().map_err(|_| QueryError::InvalidValue {
            field: Field::PatternType,
            value: raw,
            span: value.span,
        })
    }
}
