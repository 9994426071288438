//! Type checker: turns a parse tree into a typed [`Query`].

use std::collections::BTreeMap;
use std::sync::Arc;

use fnv::FnvHashMap;
use regex::Regex;

use crate::error::{QueryError, Result};

use super::checked::Query;
use super::config::{Config, FieldType, ValueType, DEFAULT_CONFIG};
use super::field::Field;
use super::syntax::{Expr, ParseTree};
use super::value::{Regexp, Value, ValueData};

/// Type-checks `tree` against the default schema.
pub fn check(tree: &ParseTree) -> Result<Query> {
    Config::check(&DEFAULT_CONFIG, tree)
}

impl Config {
    /// Type-checks `tree` against `config`.
    ///
    /// Every expression is resolved to a configured field, checked for
    /// negation, and converted according to the field's literal or quoted
    /// type. Values are appended in input order; singular fields keep every
    /// occurrence and resolve to the last one when read.
    pub fn check(config: &Arc<Config>, tree: &ParseTree) -> Result<Query> {
        let mut checker = Checker {
            config,
            regexps: FnvHashMap::default(),
        };
        let mut fields: BTreeMap<Field, Vec<Value>> = BTreeMap::new();

        for expr in tree {
            let (field, field_type) = checker.resolve(expr)?;
            if let Some(value) = checker.convert(expr, field, field_type)? {
                fields.entry(field).or_default().push(value);
            }
        }

        log::debug!(
            "checked query: {} expressions into {} fields ({} distinct regexps)",
            tree.len(),
            fields.len(),
            checker.regexps.len()
        );
        Ok(Query::new(Arc::clone(config), fields))
    }
}

struct Checker<'a> {
    config: &'a Config,
    regexps: FnvHashMap<String, Arc<Regex>>,
}

impl Checker<'_> {
    fn resolve(&self, expr: &Expr) -> Result<(Field, FieldType)> {
        let name = if expr.is_default() {
            Field::Default.as_str()
        } else {
            expr.field.as_str()
        };
        let field = self
            .config
            .resolve_field(name)
            .ok_or_else(|| QueryError::UnknownField {
                field: name.to_ascii_lowercase(),
                span: expr.span,
            })?;
        let field_type = *self
            .config
            .field_type(field)
            .ok_or_else(|| QueryError::UnknownField {
                field: name.to_ascii_lowercase(),
                span: expr.span,
            })?;

        if expr.negated && !field_type.negatable {
            return Err(QueryError::NegationNotAllowed {
                field,
                span: expr.span,
            });
        }
        Ok((field, field_type))
    }

    /// Converts the expression's value. Empty values are rejected for
    /// singular fields and skipped for list-valued ones.
    fn convert(
        &mut self,
        expr: &Expr,
        field: Field,
        field_type: FieldType,
    ) -> Result<Option<Value>> {
        if expr.value.is_empty() {
            if field_type.singular {
                return Err(QueryError::EmptySingularValue {
                    field,
                    span: expr.span,
                });
            }
            log::trace!("skipping empty {field} value at {}", expr.span);
            return Ok(None);
        }

        let data = match field_type.value_type(expr.quoted) {
            ValueType::String => ValueData::String(expr.value.clone()),
            ValueType::Regexp => ValueData::Regexp(self.compile(expr, field)?),
            ValueType::Bool => ValueData::Bool(parse_bool(expr, field)?),
        };
        Ok(Some(Value {
            data,
            negated: expr.negated,
            span: expr.value_span,
        }))
    }

    fn compile(&mut self, expr: &Expr, field: Field) -> Result<Regexp> {
        if let Some(compiled) = self.regexps.get(&expr.value) {
            log::trace!("regexp cache hit for {:?}", expr.value);
            return Ok(Regexp::new(expr.value.clone(), Arc::clone(compiled)));
        }

        let compiled = Regex::new(&expr.value).map_err(|source| QueryError::RegexpSyntax {
            field,
            span: expr.value_span,
            source,
        })?;
        let compiled = Arc::new(compiled);
        self.regexps
            .insert(expr.value.clone(), Arc::clone(&compiled));
        Ok(Regexp::new(expr.value.clone(), compiled))
    }
}

fn parse_bool(expr: &Expr, field: Field) -> Result<bool> {
    match expr.value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(QueryError::BoolSyntax {
            field,
            value: expr.value.clone(),
            span: expr.value_span,
        }),
    }
}
