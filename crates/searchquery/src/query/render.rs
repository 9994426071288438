//! Rendering parse trees and queries back to query syntax.

use std::fmt::{self, Write as _};

use super::checked::Query;
use super::config::FieldType;
use super::field::Field;
use super::syntax::{Expr, ParseTree};
use super::value::Value;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_char('-')?;
        }
        if !self.is_default() {
            write!(f, "{}:", self.field)?;
        }
        if self.quoted {
            write_quoted(f, &self.value)
        } else {
            f.write_str(&self.value)
        }
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, expr) in self.iter().enumerate() {
            if index > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

/// Canonical form: `field:value` for every value, fields in field order and
/// each field's values in input order. Parsing the output with the same
/// config yields an equal query.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, values) in self.fields() {
            let Some(field_type) = self.config().field_type(field) else {
                continue;
            };
            for value in values {
                if !first {
                    f.write_char(' ')?;
                }
                first = false;
                write_value(f, field, field_type, value)?;
            }
        }
        Ok(())
    }
}

impl Query {
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }
}

fn write_value(
    f: &mut fmt::Formatter<'_>,
    field: Field,
    field_type: &FieldType,
    value: &Value,
) -> fmt::Result {
    if value.negated {
        f.write_char('-')?;
    }
    if field != Field::Default {
        write!(f, "{field}:")?;
    }

    let text = value.to_text();
    let value_type = value.value_type();
    // Quoting picks the value type when the literal and quoted types differ.
    let quote = if value_type != field_type.literal {
        true
    } else if value_type != field_type.quoted {
        false
    } else {
        needs_quotes(&text)
    };

    if quote {
        write_quoted(f, &text)
    } else {
        f.write_str(&text)
    }
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.starts_with(['"', '\''])
        || text.bytes().any(|b| matches!(b, b' ' | b'\t' | b':'))
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in text.chars() {
        if ch == '"' || ch == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    f.write_char('"')
}
