//! Type-checker configuration: the field schema and alias table.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

use super::field::Field;

/// The process-wide default schema.
pub static DEFAULT_CONFIG: LazyLock<Arc<Config>> = LazyLock::new(|| Arc::new(Config::default()));

/// The type a value is converted to during checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Regexp,
    Bool,
}

/// How a field's values are typed.
///
/// `literal` applies to unquoted tokens and `quoted` to quoted ones. A
/// `singular` field resolves to its last occurrence. Only `negatable` fields
/// accept a leading `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    pub literal: ValueType,
    pub quoted: ValueType,
    #[serde(default)]
    pub singular: bool,
    #[serde(default)]
    pub negatable: bool,
}

impl FieldType {
    pub const fn new(literal: ValueType, quoted: ValueType) -> Self {
        Self {
            literal,
            quoted,
            singular: false,
            negatable: false,
        }
    }

    pub const fn singular(self) -> Self {
        Self {
            singular: true,
            ..self
        }
    }

    pub const fn negatable(self) -> Self {
        Self {
            negatable: true,
            ..self
        }
    }

    /// Whether both quoted and unquoted tokens produce `ty`.
    pub fn is_always(&self, ty: ValueType) -> bool {
        self.literal == ty && self.quoted == ty
    }

    pub fn value_type(&self, quoted: bool) -> ValueType {
        if quoted {
            self.quoted
        } else {
            self.literal
        }
    }
}

const REGEXP_NEGATABLE: FieldType = FieldType::new(ValueType::Regexp, ValueType::Regexp).negatable();
const STRING: FieldType = FieldType::new(ValueType::String, ValueType::String);
const SINGULAR_STRING: FieldType = STRING.singular();

/// Schema used to type-check parse trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub field_types: BTreeMap<Field, FieldType>,
    #[serde(default)]
    pub field_aliases: BTreeMap<String, Field>,
}

impl Default for Config {
    fn default() -> Self {
        let field_types = BTreeMap::from([
            (
                Field::Default,
                FieldType::new(ValueType::Regexp, ValueType::String),
            ),
            (
                Field::Case,
                FieldType::new(ValueType::Bool, ValueType::Bool).singular(),
            ),
            (Field::Repo, REGEXP_NEGATABLE),
            (Field::RepoGroup, SINGULAR_STRING),
            (Field::File, REGEXP_NEGATABLE),
            (Field::Fork, SINGULAR_STRING),
            (Field::Archived, SINGULAR_STRING),
            (Field::Lang, STRING.negatable()),
            (Field::Type, STRING),
            (Field::PatternType, SINGULAR_STRING),
            (Field::Content, SINGULAR_STRING),
            (Field::RepoHasFile, REGEXP_NEGATABLE),
            (Field::RepoHasCommitAfter, SINGULAR_STRING),
            (Field::Before, STRING),
            (Field::After, STRING),
            (Field::Author, REGEXP_NEGATABLE),
            (Field::Committer, REGEXP_NEGATABLE),
            (Field::Message, REGEXP_NEGATABLE),
            (Field::Index, SINGULAR_STRING),
            (Field::Count, SINGULAR_STRING),
            (Field::Max, SINGULAR_STRING),
            (Field::Timeout, SINGULAR_STRING),
            (Field::Replace, SINGULAR_STRING),
            (Field::CombyRule, SINGULAR_STRING),
        ]);

        let field_aliases = [
            ("r", Field::Repo),
            ("g", Field::RepoGroup),
            ("f", Field::File),
            ("l", Field::Lang),
            ("language", Field::Lang),
            ("since", Field::After),
            ("until", Field::Before),
            ("m", Field::Message),
            ("msg", Field::Message),
        ]
        .into_iter()
        .map(|(alias, field)| (alias.to_string(), field))
        .collect();

        Self {
            field_types,
            field_aliases,
        }
    }
}

impl Config {
    /// Parses a schema from JSON and validates it.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(raw).map_err(|e| QueryError::InvalidConfig(e.to_string()))?;
        config.normalized()
    }

    /// Loads a JSON schema from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| QueryError::ConfigIo {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    fn normalized(self) -> Result<Self> {
        let mut field_aliases = BTreeMap::new();
        for (alias, field) in self.field_aliases {
            if !self.field_types.contains_key(&field) {
                log::warn!("query config alias {alias:?} targets unconfigured field {field}");
                return Err(QueryError::InvalidConfig(format!(
                    "alias {alias:?} refers to field \"{field}\" which has no type"
                )));
            }
            field_aliases.insert(alias.to_ascii_lowercase(), field);
        }
        Ok(Self {
            field_types: self.field_types,
            field_aliases,
        })
    }

    pub fn field_type(&self, field: Field) -> Option<&FieldType> {
        self.field_types.get(&field)
    }

    /// Resolves a field name as written in a query to a configured field.
    ///
    /// Names are case-insensitive. Aliases take priority over canonical names.
    pub fn resolve_field(&self, name: &str) -> Option<Field> {
        let lowered = name.to_ascii_lowercase();
        let field = match self.field_aliases.get(&lowered) {
            Some(field) => *field,
            None => Field::lookup(&lowered)?,
        };
        self.field_types.contains_key(&field).then_some(field)
    }

    /// Rewrites `name` to its canonical form when it is a known alias or
    /// field; unknown names are lowercased and left for the checker to reject.
    pub(crate) fn canonical_name(&self, name: &str) -> String {
        let lowered = name.to_ascii_lowercase();
        match self.field_aliases.get(&lowered) {
            Some(field) => field.as_str().to_string(),
            None => lowered,
        }
    }
}
