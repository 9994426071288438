//! Pattern resolution: from a validated query to a [`PatternInfo`].

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::query::{Field, Query, SearchType, Value, ValueData, ValueType};

/// File match limit used when neither `count:` nor `max:` is given.
pub const DEFAULT_FILE_MATCH_LIMIT: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralPattern {
    pub match_template: String,
    pub rule: Option<String>,
}

/// The pattern to match, tagged with how it should be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PatternKind {
    Literal(String),
    Regexp(String),
    Structural(StructuralPattern),
}

impl PatternKind {
    /// The pattern text: the string itself or the structural match template.
    pub fn text(&self) -> &str {
        match self {
            PatternKind::Literal(pattern) | PatternKind::Regexp(pattern) => pattern,
            PatternKind::Structural(structural) => &structural.match_template,
        }
    }
}

/// Everything a matching engine needs to run a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternInfo {
    pub pattern: PatternKind,
    pub is_case_sensitive: bool,
    pub file_match_limit: u32,

    pub include_patterns: Vec<String>,
    pub exclude_pattern: Option<String>,

    pub file_patterns_repos_must_include: Vec<String>,
    pub file_patterns_repos_must_exclude: Vec<String>,

    pub path_patterns_are_regexps: bool,
    pub path_patterns_are_case_sensitive: bool,

    pub pattern_matches_content: bool,
    pub pattern_matches_path: bool,
}

impl PatternInfo {
    /// True when there is nothing to match: no pattern text and no path
    /// filters.
    pub fn is_empty(&self) -> bool {
        self.pattern.text().is_empty()
            && self.exclude_pattern.as_deref().map_or(true, str::is_empty)
            && self.include_patterns.is_empty()
    }

    /// Re-parses every regular expression this pattern carries and returns
    /// the first syntax error.
    pub fn validate(&self) -> Result<()> {
        if let PatternKind::Regexp(pattern) = &self.pattern {
            check_regexp_syntax(Field::Default, pattern)?;
        }

        if self.path_patterns_are_regexps {
            if let Some(exclude) = &self.exclude_pattern {
                check_regexp_syntax(Field::File, exclude)?;
            }
            for include in &self.include_patterns {
                check_regexp_syntax(Field::File, include)?;
            }
        }
        Ok(())
    }
}

fn check_regexp_syntax(field: Field, pattern: &str) -> Result<()> {
    regex_syntax::Parser::new()
        .parse(pattern)
        .map(drop)
        .map_err(|source| QueryError::InvalidPattern {
            field,
            source: Box::new(source),
        })
}

/// Derives the matcher input for `query` searched as `search_type`.
///
/// The query is expected to have passed [`validate`](crate::validate) for
/// the same search type.
pub fn resolve(query: &Query, search_type: SearchType) -> Result<PatternInfo> {
    let pattern = match search_type {
        SearchType::Literal => PatternKind::Literal(join_default_values(query, false)),
        SearchType::Regexp => PatternKind::Regexp(join_default_values(query, true)),
        SearchType::Structural => PatternKind::Structural(StructuralPattern {
            match_template: join_default_values(query, false),
            rule: query
                .configured_values(Field::CombyRule)
                .last()
                .map(Value::to_text),
        }),
    };

    let is_case_sensitive = case_sensitive(query);
    let file_match_limit = file_match_limit(query)?;

    let files = PathPatterns::collect(query, Field::File);
    let exclude_pattern = if files.are_regexps {
        union_regexps(&files.excluded)
    } else {
        if files.excluded.len() > 1 {
            log::warn!(
                "{} plain-string file exclusions cannot be combined; keeping the last",
                files.excluded.len()
            );
        }
        files.excluded.last().cloned()
    };
    let repo_files = PathPatterns::collect(query, Field::RepoHasFile);

    let (pattern_matches_content, pattern_matches_path) = match_targets(query, search_type);

    let info = PatternInfo {
        pattern,
        is_case_sensitive,
        file_match_limit,
        include_patterns: files.included,
        exclude_pattern,
        file_patterns_repos_must_include: repo_files.included,
        file_patterns_repos_must_exclude: repo_files.excluded,
        path_patterns_are_regexps: files.are_regexps,
        path_patterns_are_case_sensitive: is_case_sensitive,
        pattern_matches_content,
        pattern_matches_path,
    };
    log::debug!(
        "resolved {search_type} pattern {:?}: {} include, exclude={:?}, limit {}",
        info.pattern.text(),
        info.include_patterns.len(),
        info.exclude_pattern,
        info.file_match_limit
    );
    Ok(info)
}

/// Last `case:` value, `false` when absent or not configured.
fn case_sensitive(query: &Query) -> bool {
    query
        .configured_values(Field::Case)
        .iter()
        .rev()
        .find_map(Value::as_bool)
        .unwrap_or(false)
}

/// Joins default-field values with spaces. With `escape_strings`, quoted
/// (string-typed) values are regexp-escaped so they still match literally.
fn join_default_values(query: &Query, escape_strings: bool) -> String {
    query
        .configured_values(Field::Default)
        .iter()
        .map(|value| match &value.data {
            ValueData::String(text) if escape_strings => regex::escape(text),
            _ => value.to_text(),
        })
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `count:` takes precedence over `max:`; either must be a positive integer
/// written as plain digits.
fn file_match_limit(query: &Query) -> Result<u32> {
    for field in [Field::Count, Field::Max] {
        if let Some(value) = query.configured_values(field).last() {
            let text = value.to_text();
            let digits_only = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
            return match text.parse::<u32>() {
                Ok(limit) if digits_only && limit > 0 => Ok(limit),
                _ => Err(QueryError::IntSyntax {
                    field,
                    value: text,
                    span: value.span,
                }),
            };
        }
    }
    Ok(DEFAULT_FILE_MATCH_LIMIT)
}

/// Content only by default. `type:path` restricts matching to paths and
/// `type:file` matches both; the last of these wins. Structural search
/// always matches content.
fn match_targets(query: &Query, search_type: SearchType) -> (bool, bool) {
    if search_type == SearchType::Structural {
        return (true, false);
    }
    query
        .configured_values(Field::Type)
        .iter()
        .fold((true, false), |targets, value| {
            match value.to_text().to_ascii_lowercase().as_str() {
                "path" => (false, true),
                "file" => (true, true),
                _ => targets,
            }
        })
}

struct PathPatterns {
    included: Vec<String>,
    excluded: Vec<String>,
    are_regexps: bool,
}

impl PathPatterns {
    fn collect(query: &Query, field: Field) -> Self {
        let are_regexps = query
            .config()
            .field_type(field)
            .is_some_and(|field_type| field_type.is_always(ValueType::Regexp));

        let mut included = Vec::new();
        let mut excluded = Vec::new();
        for value in query.configured_values(field) {
            if value.negated {
                excluded.push(value.to_text());
            } else {
                included.push(value.to_text());
            }
        }
        Self {
            included,
            excluded,
            are_regexps,
        }
    }
}

fn union_regexps(patterns: &[String]) -> Option<String> {
    match patterns {
        [] => None,
        [single] => Some(single.clone()),
        _ => Some(
            patterns
                .iter()
                .map(|pattern| format!("(?:{pattern})"))
                .collect::<Vec<_>>()
                .join("|"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{process, Config};
    use std::sync::Arc;

    fn resolved(input: &str, search_type: SearchType) -> PatternInfo {
        let (query, _) = process(input, search_type).expect("process");
        resolve(&query, search_type).expect("resolve")
    }

    #[test]
    fn regexp_pattern_from_default_values() {
        let info = resolved("foo.*bar case:yes", SearchType::Regexp);
        assert_eq!(info.pattern, PatternKind::Regexp("foo.*bar".to_string()));
        assert!(info.is_case_sensitive);
        assert!(info.path_patterns_are_case_sensitive);
        assert_eq!(info.file_match_limit, DEFAULT_FILE_MATCH_LIMIT);
        assert!(info.pattern_matches_content);
        assert!(!info.pattern_matches_path);
    }

    #[test]
    fn quoted_values_are_escaped_in_regexp_mode() {
        let info = resolved(r#"foo "a.b" bar"#, SearchType::Regexp);
        assert_eq!(info.pattern, PatternKind::Regexp(r"foo a\.b bar".to_string()));

        let info = resolved(r#"foo "a.b" bar"#, SearchType::Literal);
        assert_eq!(info.pattern, PatternKind::Literal("foo a.b bar".to_string()));
    }

    #[test]
    fn structural_pattern_carries_rule() {
        let info = resolved(
            r#"fmt.Sprintf(:[args]) combyrule:"where :[args] == \"x\"""#,
            SearchType::Structural,
        );
        assert_eq!(
            info.pattern,
            PatternKind::Structural(StructuralPattern {
                match_template: "fmt.Sprintf(:[args])".to_string(),
                rule: Some(r#"where :[args] == "x""#.to_string()),
            })
        );
        assert!(!info.is_case_sensitive);
    }

    #[test]
    fn file_filters() {
        let info = resolved(
            r#"repo:^github\.com/sg/.*$ -file:vendor -file:_test\.go$ file:\.go$ "hello world""#,
            SearchType::Regexp,
        );
        assert_eq!(info.include_patterns, [r"\.go$"]);
        assert_eq!(
            info.exclude_pattern.as_deref(),
            Some(r"(?:vendor)|(?:_test\.go$)")
        );
        assert!(info.path_patterns_are_regexps);
        assert!(info.validate().is_ok());
    }

    #[test]
    fn single_exclusion_is_not_wrapped() {
        let info = resolved("-file:vendor foo", SearchType::Literal);
        assert_eq!(info.exclude_pattern.as_deref(), Some("vendor"));
    }

    #[test]
    fn repo_has_file_filters() {
        let info = resolved(
            "repohasfile:Cargo.toml -repohasfile:package.json",
            SearchType::Regexp,
        );
        assert_eq!(info.file_patterns_repos_must_include, ["Cargo.toml"]);
        assert_eq!(info.file_patterns_repos_must_exclude, ["package.json"]);
    }

    #[test]
    fn file_match_limit_from_count_or_max() {
        assert_eq!(resolved("max:5 foo", SearchType::Regexp).file_match_limit, 5);
        assert_eq!(
            resolved("count:100 max:5 foo", SearchType::Regexp).file_match_limit,
            100
        );
        assert_eq!(
            resolved("count:1 count:7", SearchType::Regexp).file_match_limit,
            7
        );

        for bad in ["count:0", "count:-3", "count:+5", "max:lots"] {
            let (query, _) = process(bad, SearchType::Regexp).expect("process");
            let err = resolve(&query, SearchType::Regexp).expect_err(bad);
            assert!(matches!(err, QueryError::IntSyntax { .. }), "{bad}");
            assert!(err.span().is_some());
        }
    }

    #[test]
    fn type_selects_match_targets() {
        let info = resolved("type:path foo", SearchType::Regexp);
        assert!(!info.pattern_matches_content && info.pattern_matches_path);

        let info = resolved("type:file foo", SearchType::Regexp);
        assert!(info.pattern_matches_content && info.pattern_matches_path);

        let info = resolved("type:path type:file foo", SearchType::Literal);
        assert!(info.pattern_matches_content && info.pattern_matches_path);

        let info = resolved("type:commit foo", SearchType::Regexp);
        assert!(info.pattern_matches_content && !info.pattern_matches_path);
    }

    #[test]
    fn validate_reports_bad_regexps() {
        let mut info = resolved("foo", SearchType::Regexp);
        assert!(info.validate().is_ok());

        info.pattern = PatternKind::Regexp("(".to_string());
        let err = info.validate().expect_err("bad pattern");
        assert!(matches!(err, QueryError::InvalidPattern { field: Field::Default, .. }));

        info.pattern = PatternKind::Literal("(".to_string());
        info.include_patterns = vec!["[".to_string()];
        let err = info.validate().expect_err("bad include");
        assert!(matches!(err, QueryError::InvalidPattern { field: Field::File, .. }));

        info.path_patterns_are_regexps = false;
        assert!(info.validate().is_ok());
    }

    #[test]
    fn is_empty() {
        assert!(resolved("", SearchType::Regexp).is_empty());
        assert!(resolved("case:yes", SearchType::Regexp).is_empty());
        assert!(!resolved("foo", SearchType::Regexp).is_empty());
        assert!(!resolved("file:x", SearchType::Regexp).is_empty());
        assert!(!resolved("-file:x", SearchType::Regexp).is_empty());
    }

    #[test]
    fn string_typed_file_field_in_custom_schema() {
        let config = Arc::new(
            Config::from_json(
                r#"{"field_types": {
                    "default": {"literal": "string", "quoted": "string"},
                    "file": {"literal": "string", "quoted": "string", "negatable": true}
                }}"#,
            )
            .expect("config"),
        );
        let (query, _) =
            Config::process(&config, "foo( file:a.go -file:b -file:c", SearchType::Literal)
                .expect("process");
        let info = resolve(&query, SearchType::Literal).expect("resolve");
        assert_eq!(info.pattern, PatternKind::Literal("foo(".to_string()));
        assert!(!info.path_patterns_are_regexps);
        assert_eq!(info.include_patterns, ["a.go"]);
        assert_eq!(info.exclude_pattern.as_deref(), Some("c"));
        assert_eq!(info.file_match_limit, DEFAULT_FILE_MATCH_LIMIT);
    }

    #[test]
    fn schema_without_default_or_case_resolves() {
        let config = Arc::new(
            Config::from_json(
                r#"{"field_types": {"type": {"literal": "string", "quoted": "string"}}}"#,
            )
            .expect("config"),
        );
        let (query, _) =
            Config::process(&config, "type:path", SearchType::Regexp).expect("process");
        let info = resolve(&query, SearchType::Regexp).expect("resolve");
        assert_eq!(info.pattern, PatternKind::Regexp(String::new()));
        assert!(!info.is_case_sensitive);
        assert!(!info.pattern_matches_content && info.pattern_matches_path);
        assert_eq!(info.file_match_limit, DEFAULT_FILE_MATCH_LIMIT);
        assert!(info.is_empty());
    }

    #[test]
    fn serializes_for_the_wire() {
        let info = resolved("foo file:x", SearchType::Literal);
        let json = serde_json::to_value(&info).expect("serialize");
        assert_eq!(json["pattern"]["kind"], "literal");
        assert_eq!(json["pattern"]["value"], "foo");
        assert_eq!(json["includePatterns"][0], "x");
        assert_eq!(json["fileMatchLimit"], 30);

        let back: PatternInfo = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, info);
    }
}
