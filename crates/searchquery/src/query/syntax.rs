//! Query tokenizer and parser.
//!
//! The grammar is flat: a query is a whitespace-separated sequence of
//! expressions, each either a bare or quoted pattern token or a
//! `[-]field:value` qualifier. Scanning is forward-only and byte-oriented;
//! only identifier recognition looks at character classes, and only ASCII.
//!
//! A closing quote also ends a token: whatever follows it starts the next
//! expression, so `repo:"a"b` is `repo:a` followed by the pattern `b`.

use std::ops::Deref;

use crate::error::{QueryError, Result, Span};

use super::config::{Config, DEFAULT_CONFIG};

/// One parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    /// Lowercased field name, canonicalised through the alias table. Empty
    /// for tokens without a field prefix.
    pub field: String,
    /// The raw value, with quotes and escapes removed when `quoted`.
    pub value: String,
    pub quoted: bool,
    pub negated: bool,
    /// The whole expression, including any `-field:` prefix.
    pub span: Span,
    /// The value token, including its quotes.
    pub value_span: Span,
}

impl Expr {
    pub fn is_default(&self) -> bool {
        self.field.is_empty()
    }
}

/// The ordered expressions of a query, as they appear in the input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseTree(Vec<Expr>);

impl ParseTree {
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self(exprs)
    }

    pub fn into_inner(self) -> Vec<Expr> {
        self.0
    }
}

impl Deref for ParseTree {
    type Target = [Expr];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a ParseTree {
    type Item = &'a Expr;
    type IntoIter = std::slice::Iter<'a, Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parses `input` using the default alias table.
pub fn parse(input: &str) -> Result<ParseTree> {
    DEFAULT_CONFIG.parse(input)
}

impl Config {
    /// Parses `input`, canonicalising field names through this config's
    /// aliases. Unknown field names pass through lowercased; the checker
    /// rejects them.
    pub fn parse(&self, input: &str) -> Result<ParseTree> {
        let mut exprs = Scanner::new(input).scan()?;
        for expr in &mut exprs {
            if !expr.is_default() {
                expr.field = self.canonical_name(&expr.field);
            }
        }
        Ok(ParseTree(exprs))
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    cursor: usize,
}

struct FieldPrefix {
    negated: bool,
    name: Span,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            cursor: 0,
        }
    }

    fn scan(mut self) -> Result<Vec<Expr>> {
        let mut exprs = Vec::new();
        loop {
            self.skip_whitespace();
            if self.cursor >= self.bytes.len() {
                break;
            }
            let expr = self.scan_expr()?;
            log::trace!("query token {:?} field={:?} at {}", expr.value, expr.field, expr.span);
            exprs.push(expr);
        }
        Ok(exprs)
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.cursor)
            .is_some_and(|b| is_query_whitespace(*b))
        {
            self.cursor += 1;
        }
    }

    fn scan_expr(&mut self) -> Result<Expr> {
        let start = self.cursor;
        match self.bytes[start] {
            b'"' | b'\'' => {
                let (value, end) = self.scan_quoted(start)?;
                self.cursor = end;
                let span = Span::new(start, end);
                Ok(Expr {
                    field: String::new(),
                    value,
                    quoted: true,
                    negated: false,
                    span,
                    value_span: span,
                })
            }
            b':' => Err(QueryError::EmptyFieldName {
                span: Span::new(start, start + 1),
            }),
            _ => match self.field_prefix(start) {
                Some(prefix) => self.scan_field_value(start, prefix),
                None => {
                    let end = self.bare_end(start);
                    self.cursor = end;
                    let span = Span::new(start, end);
                    Ok(Expr {
                        field: String::new(),
                        value: self.input[start..end].to_string(),
                        quoted: false,
                        negated: false,
                        span,
                        value_span: span,
                    })
                }
            },
        }
    }

    fn scan_field_value(&mut self, start: usize, prefix: FieldPrefix) -> Result<Expr> {
        let field = self.input[prefix.name.start..prefix.name.end].to_ascii_lowercase();
        let value_start = prefix.name.end + 1;

        let (value, quoted, value_end) = match self.bytes.get(value_start) {
            Some(b'"' | b'\'') => {
                let (value, end) = self.scan_quoted(value_start)?;
                (value, true, end)
            }
            _ => {
                let end = self.bare_end(value_start);
                (self.input[value_start..end].to_string(), false, end)
            }
        };
        self.cursor = value_end;

        Ok(Expr {
            field,
            value,
            quoted,
            negated: prefix.negated,
            span: Span::new(start, value_end),
            value_span: Span::new(value_start, value_end),
        })
    }

    /// Recognises `-?[A-Za-z][A-Za-z0-9_]*:` at `start`.
    fn field_prefix(&self, start: usize) -> Option<FieldPrefix> {
        let negated = self.bytes[start] == b'-';
        let name_start = if negated { start + 1 } else { start };

        if !self
            .bytes
            .get(name_start)
            .is_some_and(u8::is_ascii_alphabetic)
        {
            return None;
        }
        let mut end = name_start + 1;
        while self
            .bytes
            .get(end)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            end += 1;
        }

        (self.bytes.get(end) == Some(&b':')).then_some(FieldPrefix {
            negated,
            name: Span::new(name_start, end),
        })
    }

    fn bare_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|b| is_query_whitespace(*b))
            .map_or(self.bytes.len(), |offset| from + offset)
    }

    /// Scans a quoted string whose opening delimiter is at `start`. Returns
    /// the unescaped contents and the byte offset just past the closing
    /// delimiter. Only the delimiter and backslash can be escaped; any other
    /// backslash sequence is kept verbatim so regexp escapes survive.
    fn scan_quoted(&self, start: usize) -> Result<(String, usize)> {
        let delimiter = char::from(self.bytes[start]);
        let body_start = start + 1;
        let mut value = String::new();
        let mut chars = self.input[body_start..].char_indices();

        while let Some((offset, ch)) = chars.next() {
            if ch == '\\' {
                match chars.next() {
                    Some((_, next)) if next == delimiter || next == '\\' => value.push(next),
                    Some((_, next)) => {
                        value.push('\\');
                        value.push(next);
                    }
                    None => break,
                }
                continue;
            }
            if ch == delimiter {
                return Ok((value, body_start + offset + 1));
            }
            value.push(ch);
        }

        Err(QueryError::UnterminatedString {
            span: Span::new(start, self.bytes.len()),
        })
    }
}

fn is_query_whitespace(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exprs(input: &str) -> Vec<Expr> {
        parse(input).expect("parse").into_inner()
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert!(exprs("").is_empty());
        assert!(exprs(" \t  ").is_empty());
    }

    #[test]
    fn bare_tokens_bind_to_default() {
        let parsed = exprs("foo.*bar  baz");
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_default());
        assert_eq!(parsed[0].value, "foo.*bar");
        assert_eq!(parsed[0].span, Span::new(0, 8));
        assert_eq!(parsed[1].value, "baz");
        assert_eq!(parsed[1].span, Span::new(10, 13));
    }

    #[test]
    fn field_tokens_record_value_span() {
        let parsed = exprs("case:maybe");
        assert_eq!(parsed[0].field, "case");
        assert_eq!(parsed[0].value, "maybe");
        assert_eq!(parsed[0].span, Span::new(0, 10));
        assert_eq!(parsed[0].value_span, Span::new(5, 10));
    }

    #[test]
    fn negated_field() {
        let parsed = exprs("-file:vendor");
        assert_eq!(parsed[0].field, "file");
        assert_eq!(parsed[0].value, "vendor");
        assert!(parsed[0].negated);
        assert_eq!(parsed[0].value_span, Span::new(6, 12));
    }

    #[test]
    fn leading_dash_on_bare_token_is_part_of_pattern() {
        let parsed = exprs("-xyz");
        assert!(parsed[0].is_default());
        assert_eq!(parsed[0].value, "-xyz");
        assert!(!parsed[0].negated);
    }

    #[test]
    fn closing_quote_ends_the_token() {
        let parsed = exprs(r#"repo:"a"b"#);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].field, "repo");
        assert_eq!(parsed[0].value, "a");
        assert!(parsed[0].quoted);
        assert_eq!(parsed[0].span, Span::new(0, 8));
        assert!(parsed[1].is_default());
        assert_eq!(parsed[1].value, "b");
        assert!(!parsed[1].quoted);
        assert_eq!(parsed[1].span, Span::new(8, 9));
    }

    #[test]
    fn quoted_tokens() {
        let parsed = exprs(r#""hello world" 'it''s' "a \"b\" \\ \d""#);
        assert_eq!(parsed[0].value, "hello world");
        assert!(parsed[0].quoted);
        assert!(parsed[0].is_default());
        assert_eq!(parsed[0].span, Span::new(0, 13));
        assert_eq!(parsed[1].value, "it");
        assert_eq!(parsed[2].value, "s");
        assert_eq!(parsed[3].value, r#"a "b" \ \d"#);
    }

    #[test]
    fn quoted_field_value() {
        let parsed = exprs(r#"-repo:"a b" c"#);
        assert_eq!(parsed[0].field, "repo");
        assert_eq!(parsed[0].value, "a b");
        assert!(parsed[0].quoted && parsed[0].negated);
        assert_eq!(parsed[0].value_span, Span::new(6, 11));
        assert_eq!(parsed[1].value, "c");
    }

    #[test]
    fn field_names_fold_case_values_do_not() {
        let upper = exprs("REPO:Foo");
        let lower = exprs("repo:Foo");
        assert_eq!(upper, lower);
        assert_eq!(upper[0].value, "Foo");
    }

    #[test]
    fn aliases_are_canonicalised() {
        let parsed = exprs("r:a g:b f:c l:go LANGUAGE:rust since:x until:y m:z msg:w");
        let fields: Vec<&str> = parsed.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "repo",
                "repogroup",
                "file",
                "lang",
                "lang",
                "after",
                "before",
                "message",
                "message"
            ]
        );
    }

    #[test]
    fn unknown_fields_pass_through() {
        let parsed = exprs("Unknown:x");
        assert_eq!(parsed[0].field, "unknown");
    }

    #[test]
    fn value_may_contain_colons() {
        let parsed = exprs("repo:a:b");
        assert_eq!(parsed[0].field, "repo");
        assert_eq!(parsed[0].value, "a:b");
    }

    #[test]
    fn non_identifier_prefix_is_bare() {
        let parsed = exprs("foo(a:b) 1x:y -:z");
        assert!(parsed.iter().all(Expr::is_default));
        assert_eq!(parsed[1].value, "1x:y");
        assert_eq!(parsed[2].value, "-:z");
    }

    #[test]
    fn empty_value_passes_through() {
        let parsed = exprs("file: foo");
        assert_eq!(parsed[0].field, "file");
        assert_eq!(parsed[0].value, "");
        assert_eq!(parsed[0].value_span, Span::new(5, 5));
        assert_eq!(parsed[1].value, "foo");
    }

    #[test]
    fn unterminated_quote() {
        let err = parse(r#"foo "bar"#).expect_err("unterminated");
        assert!(matches!(
            err,
            QueryError::UnterminatedString { span } if span == Span::new(4, 8)
        ));

        let err = parse(r#"repo:"abc\""#).expect_err("escaped closing quote");
        assert!(matches!(err, QueryError::UnterminatedString { .. }));
    }

    #[test]
    fn stray_colon() {
        let err = parse("foo :bar").expect_err("stray colon");
        assert!(matches!(
            err,
            QueryError::EmptyFieldName { span } if span == Span::new(4, 5)
        ));
    }

    #[test]
    fn tabs_separate_and_other_whitespace_does_not() {
        let parsed = exprs("a\tb\nc");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].value, "b\nc");
    }

    #[test]
    fn multibyte_values() {
        let parsed = exprs("répo:x \"é\" ü");
        assert!(parsed[0].is_default());
        assert_eq!(parsed[0].value, "répo:x");
        assert_eq!(parsed[1].value, "é");
        assert_eq!(parsed[2].value, "ü");
    }

    #[test]
    fn custom_alias_table() {
        let config = Config::from_json(
            r#"{"field_types": {"repo": {"literal": "regexp", "quoted": "regexp"}},
                "field_aliases": {"repository": "repo"}}"#,
        )
        .expect("config");
        let tree = config.parse("repository:x r:y").expect("parse");
        assert_eq!(tree[0].field, "repo");
        assert_eq!(tree[1].field, "r");
    }
}
