//! Table-header extraction from HTML responses

use crate::error::{Result, TiresiasError};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicate over the trimmed text of a `<th>` cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "value", rename_all = "lowercase")]
pub enum Matcher {
    /// Any non-empty cell
    Any,
    Exact(String),
    Prefix(String),
}

impl Matcher {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Matcher::Prefix(prefix.into())
    }

    pub fn exact(text: impl Into<String>) -> Self {
        Matcher::Exact(text.into())
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Any => !text.is_empty(),
            Matcher::Exact(expected) => text == expected,
            Matcher::Prefix(prefix) => text.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => write!(f, "any cell"),
            Matcher::Exact(text) => write!(f, "exact '{text}'"),
            Matcher::Prefix(prefix) => write!(f, "prefix '{prefix}'"),
        }
    }
}

fn parse(body: &[u8]) -> Result<Html> {
    let text = std::str::from_utf8(body)
        .map_err(|e| TiresiasError::Parse(format!("response body is not UTF-8: {e}")))?;
    Ok(Html::parse_document(text))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TiresiasError::Parse(format!("bad selector '{css}': {e}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Trimmed text of every `<th>` in document order
pub fn header_cells(body: &[u8]) -> Result<Vec<String>> {
    let document = parse(body)?;
    let th = selector("th")?;
    Ok(document.select(&th).map(cell_text).collect())
}

/// First `<th>` whose trimmed text satisfies `matcher`
pub fn first_header(body: &[u8], matcher: &Matcher) -> Result<String> {
    header_cells(body)?
        .into_iter()
        .find(|text| matcher.matches(text))
        .ok_or_else(|| TiresiasError::CellNotFound {
            matcher: matcher.to_string(),
        })
}

/// First `<th>` of the last table row
pub fn last_row_header(body: &[u8]) -> Result<String> {
    let document = parse(body)?;
    let tr = selector("tr")?;
    let th = selector("th")?;

    document
        .select(&tr)
        .last()
        .and_then(|row| row.select(&th).next())
        .map(cell_text)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| TiresiasError::CellNotFound {
            matcher: "last row header".to_string(),
        })
}
