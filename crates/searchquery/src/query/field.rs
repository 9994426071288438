//! Closed field vocabulary and its name table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A qualifier known to the query language.
///
/// `Default` is the sink for tokens written without a `field:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Default,
    Repo,
    RepoGroup,
    File,
    Lang,
    Case,
    Type,
    PatternType,
    Content,
    Count,
    Timeout,
    Before,
    After,
    Author,
    Committer,
    Message,
    Fork,
    Archived,
    RepoHasFile,
    RepoHasCommitAfter,
    Index,
    Max,
    Replace,
    CombyRule,
}

impl Field {
    pub const ALL: [Field; 24] = [
        Field::Default,
        Field::Repo,
        Field::RepoGroup,
        Field::File,
        Field::Lang,
        Field::Case,
        Field::Type,
        Field::PatternType,
        Field::Content,
        Field::Count,
        Field::Timeout,
        Field::Before,
        Field::After,
        Field::Author,
        Field::Committer,
        Field::Message,
        Field::Fork,
        Field::Archived,
        Field::RepoHasFile,
        Field::RepoHasCommitAfter,
        Field::Index,
        Field::Max,
        Field::Replace,
        Field::CombyRule,
    ];

    /// The canonical (lowercase) name used in queries.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Default => "default",
            Field::Repo => "repo",
            Field::RepoGroup => "repogroup",
            Field::File => "file",
            Field::Lang => "lang",
            Field::Case => "case",
            Field::Type => "type",
            Field::PatternType => "patterntype",
            Field::Content => "content",
            Field::Count => "count",
            Field::Timeout => "timeout",
            Field::Before => "before",
            Field::After => "after",
            Field::Author => "author",
            Field::Committer => "committer",
            Field::Message => "message",
            Field::Fork => "fork",
            Field::Archived => "archived",
            Field::RepoHasFile => "repohasfile",
            Field::RepoHasCommitAfter => "repohascommitafter",
            Field::Index => "index",
            Field::Max => "max",
            Field::Replace => "replace",
            Field::CombyRule => "combyrule",
        }
    }

    /// Looks up a field by canonical name. Aliases are not consulted here;
    /// see [`Config::resolve_field`](super::Config::resolve_field).
    pub fn lookup(name: &str) -> Option<Field> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::lookup(s).ok_or_else(|| format!("unknown field: {s}"))
    }
}
