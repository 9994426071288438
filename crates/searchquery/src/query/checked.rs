//! The typechecked query and its accessors.
//!
//! Accessors panic when called on a field the query's schema does not know,
//! or with a field whose type does not fit the accessor. Those are bugs in
//! the calling code, not bad user input.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::config::{Config, FieldType, ValueType};
use super::field::Field;
use super::value::Value;

/// A typechecked search query: each configured field maps to its values in
/// input order.
#[derive(Debug, Clone)]
pub struct Query {
    config: Arc<Config>,
    fields: BTreeMap<Field, Vec<Value>>,
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Query {
    pub(crate) fn new(config: Arc<Config>, fields: BTreeMap<Field, Vec<Value>>) -> Self {
        Self { config, fields }
    }

    /// The schema used to produce this query.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fields that have at least one value, in field order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &[Value])> + '_ {
        self.fields
            .iter()
            .map(|(field, values)| (*field, values.as_slice()))
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.get(&field).is_some_and(|values| !values.is_empty())
    }

    fn field_type(&self, field: Field) -> &FieldType {
        match self.config.field_type(field) {
            Some(field_type) => field_type,
            None => panic!("no such field: {field}"),
        }
    }

    /// Returns the values for `field` in input order.
    pub fn values(&self, field: Field) -> &[Value] {
        let _ = self.field_type(field);
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Like [`values`](Self::values), but empty when the schema lacks
    /// `field`. For internal readers that must not panic on custom schemas.
    pub(crate) fn configured_values(&self, field: Field) -> &[Value] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the last boolean value for `field`, or `false` when the field
    /// is absent. For `case:yes case:no case:yes` that is `true`.
    pub fn bool_value(&self, field: Field) -> bool {
        self.values(field)
            .iter()
            .rev()
            .find_map(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.bool_value(Field::Case)
    }

    /// Returns the last value of a singular string field as
    /// `(value, negated_value)`; at most one of the two is non-empty.
    ///
    /// Panics unless `field` is configured, always string-typed and singular.
    pub fn string_value(&self, field: Field) -> (String, String) {
        let field_type = self.field_type(field);
        if !field_type.is_always(ValueType::String) {
            panic!("field is not always string-typed: {field}");
        }
        if !field_type.singular {
            panic!("field is not singular: {field}");
        }

        match self.values(field).last() {
            None => (String::new(), String::new()),
            Some(value) => {
                let text = value.to_text();
                if value.negated {
                    (String::new(), text)
                } else {
                    (text, String::new())
                }
            }
        }
    }

    /// Returns the string values for `field`, partitioned by negation.
    ///
    /// Panics unless `field` is configured and always string-typed.
    pub fn string_values(&self, field: Field) -> (Vec<String>, Vec<String>) {
        if !self.field_type(field).is_always(ValueType::String) {
            panic!("field is not always string-typed: {field}");
        }
        self.partition_text(field)
    }

    /// Returns the regexp source strings for `field`, partitioned by negation.
    ///
    /// Panics unless `field` is configured and always regexp-typed.
    pub fn regexp_patterns(&self, field: Field) -> (Vec<String>, Vec<String>) {
        if !self.field_type(field).is_always(ValueType::Regexp) {
            panic!("field is not always regexp-typed: {field}");
        }
        self.partition_text(field)
    }

    fn partition_text(&self, field: Field) -> (Vec<String>, Vec<String>) {
        let mut values = Vec::new();
        let mut negated_values = Vec::new();
        for value in self.values(field) {
            if value.negated {
                negated_values.push(value.to_text());
            } else {
                values.push(value.to_text());
            }
        }
        (values, negated_values)
    }

    /// The default-field values joined by single spaces, skipping empties.
    pub fn default_pattern(&self) -> String {
        let _ = self.field_type(Field::Default);
        self.joined_default_values()
    }

    /// The joined default-field values; empty when the schema has no
    /// default field.
    pub(crate) fn joined_default_values(&self) -> String {
        self.configured_values(Field::Default)
            .iter()
            .map(Value::to_text)
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
