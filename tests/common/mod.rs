//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use tiresias::config::ReconConfig;
use tiresias::error::Result;
use tiresias::http::Oracle;
use tiresias::models::ProbeResult;

pub const BASE: &str = "http://lab/filter?category=Gifts";

/// Creates a test ReconConfig pointing to `target`
pub fn test_config(target: &str) -> ReconConfig {
    ReconConfig {
        target: target.to_string(),
        timeout_secs: 10,
        user_agent: "Tiresias-Test/0.1.0".to_string(),
        ..ReconConfig::default()
    }
}

/// Reverses the query-string encoding applied to payloads
pub fn decode(raw: &str) -> String {
    raw.replace('+', " ")
        .replace("%2B", "+")
        .replace("%26", "&")
        .replace("%27", "'")
        .replace("%23", "#")
        .replace("%25", "%")
}

/// Decoded value of the `category` parameter, or the whole URL when absent
pub fn injected_value(url: &str) -> String {
    match url.split_once("category=") {
        Some((_, value)) => decode(value),
        None => decode(url),
    }
}

/// Oracle answering from a closure over the decoded parameter value. Every
/// raw URL it receives is recorded.
pub struct StubOracle<F> {
    respond: F,
    calls: Mutex<Vec<String>>,
}

impl<F> StubOracle<F>
where
    F: Fn(&str) -> Result<ProbeResult> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    /// Decoded parameter values in the order they were probed
    pub fn payloads(&self) -> Vec<String> {
        self.calls().iter().map(|url| injected_value(url)).collect()
    }
}

#[async_trait]
impl<F> Oracle for StubOracle<F>
where
    F: Fn(&str) -> Result<ProbeResult> + Send + Sync,
{
    async fn probe(&self, url: &str) -> Result<ProbeResult> {
        self.calls.lock().expect("calls lock").push(url.to_string());
        (self.respond)(&injected_value(url))
    }
}

/// Oracle that answers every probe with the same status
pub fn constant(status: u16) -> StubOracle<impl Fn(&str) -> Result<ProbeResult> + Send + Sync> {
    StubOracle::new(move |_: &str| Ok(ProbeResult::new(status, "")))
}

/// Oracle backed by a simulated lab
pub fn lab_oracle(lab: Lab) -> StubOracle<impl Fn(&str) -> Result<ProbeResult> + Send + Sync> {
    StubOracle::new(move |value: &str| {
        let (status, body) = lab.respond(value);
        Ok(ProbeResult::new(status, body))
    })
}

/// In-process model of a vulnerable product filter. The parameter value is
/// spliced into `WHERE category = '<value>'`; injected rows are rendered as
/// `<th>` cells after the product rows.
#[derive(Debug, Clone)]
pub struct Lab {
    pub columns: usize,
    pub tokens: Vec<&'static str>,
    pub version_expression: &'static str,
    pub version_source: Option<&'static str>,
    /// Operator joining string operands; blank means adjacent operands
    pub concatenation: &'static str,
    pub banner: &'static str,
    pub information_schema: bool,
    /// Positions that accept string values
    pub text_slots: Vec<usize>,
    pub table: &'static str,
    pub username_column: &'static str,
    pub password_column: &'static str,
    pub users: Vec<(&'static str, &'static str)>,
}

const TOKENS_LONGEST_FIRST: [&str; 3] = ["-- ", "--", "#"];

impl Lab {
    pub fn mysql() -> Self {
        Self {
            columns: 3,
            tokens: vec!["-- ", "#"],
            version_expression: "@@version",
            version_source: None,
            concatenation: " ",
            banner: "8.0.36-0ubuntu0.22.04.1",
            information_schema: true,
            text_slots: vec![0, 1, 2],
            table: "users_kxqzbd",
            username_column: "username_tmvhre",
            password_column: "password_lwdyos",
            users: vec![("wiener", "peter"), ("administrator", "s3cr3t-9x")],
        }
    }

    pub fn postgresql() -> Self {
        Self {
            columns: 2,
            tokens: vec!["--"],
            version_expression: "version()",
            concatenation: "||",
            banner: "PostgreSQL 12.22 (Ubuntu 12.22-0ubuntu0.20.04.1)",
            ..Self::mysql()
        }
    }

    pub fn oracle() -> Self {
        Self {
            columns: 2,
            tokens: vec!["--"],
            version_expression: "version",
            version_source: Some("v$instance"),
            concatenation: "||",
            banner: "19.0.0.0.0",
            information_schema: false,
            ..Self::mysql()
        }
    }

    pub fn mssql() -> Self {
        Self {
            columns: 2,
            tokens: vec!["--"],
            concatenation: "+",
            banner: "Microsoft SQL Server 2019 (RTM) - 15.0.2000.5",
            ..Self::mysql()
        }
    }

    /// Separator literal of `<username> <op> '<sep>' <op> <password>`, if
    /// `item` has that shape
    fn concatenated_separator(&self, item: &str) -> Option<String> {
        let middle = item
            .strip_prefix(self.username_column)?
            .strip_suffix(self.password_column)?
            .trim();
        let literal = match self.concatenation.trim() {
            "" => middle,
            op => middle.strip_prefix(op)?.strip_suffix(op)?.trim(),
        };
        literal
            .strip_prefix('\'')?
            .strip_suffix('\'')
            .map(str::to_string)
    }

    /// Status and body for one decoded parameter value
    pub fn respond(&self, value: &str) -> (u16, String) {
        let Some((_, rest)) = value.split_once('\'') else {
            return (200, page(&[]));
        };
        if rest.is_empty() {
            return (500, "Internal Server Error".to_string());
        }

        let Some(token) = TOKENS_LONGEST_FIRST.iter().find(|t| rest.ends_with(**t)) else {
            return (500, "Internal Server Error".to_string());
        };
        if !self.tokens.contains(token) {
            return (500, "Internal Server Error".to_string());
        }

        let clause = rest[..rest.len() - token.len()].trim();
        if clause.is_empty() {
            return (200, page(&[]));
        }

        if let Some(n) = clause.strip_prefix("ORDER BY ") {
            return match n.trim().parse::<usize>() {
                Ok(n) if (1..=self.columns).contains(&n) => (200, page(&[])),
                _ => (500, "Internal Server Error".to_string()),
            };
        }

        match clause.strip_prefix("UNION SELECT ") {
            Some(select) => match self.union(select) {
                Some(rows) => (200, page(&rows)),
                None => (500, "Internal Server Error".to_string()),
            },
            None => (500, "Internal Server Error".to_string()),
        }
    }

    fn union(&self, select: &str) -> Option<Vec<String>> {
        let (list, tail) = match select.split_once(" FROM ") {
            Some((list, tail)) => (list, Some(tail)),
            None => (select, None),
        };
        let (source, filter) = match tail {
            Some(tail) => match tail.split_once(" WHERE ") {
                Some((source, filter)) => (Some(source), Some(filter)),
                None => (Some(tail), None),
            },
            None => (None, None),
        };

        let items: Vec<&str> = list.split(',').collect();
        if items.len() != self.columns {
            return None;
        }
        let populated: Vec<(usize, &str)> = items
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, item)| *item != "NULL")
            .collect();

        let (slot, item) = match populated.as_slice() {
            [] => return Some(Vec::new()),
            [one] => *one,
            _ => return None,
        };
        if !self.text_slots.contains(&slot) {
            return None;
        }

        if let Some(literal) = item.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            return Some(vec![literal.to_string()]);
        }

        if item == self.version_expression && source == self.version_source {
            return Some(vec![self.banner.to_string()]);
        }

        if self.information_schema && item == "table_name" {
            if source == Some("information_schema.tables") {
                return Some(vec![
                    "products".to_string(),
                    self.table.to_string(),
                    "sessions".to_string(),
                ]);
            }
            return None;
        }

        if self.information_schema
            && item == "column_name"
            && source == Some("information_schema.columns")
        {
            let wanted = format!("table_name = '{}'", self.table);
            if filter == Some(wanted.as_str()) {
                return Some(vec![
                    "email".to_string(),
                    self.username_column.to_string(),
                    self.password_column.to_string(),
                ]);
            }
            return Some(Vec::new());
        }

        if let Some(separator) = self.concatenated_separator(item) {
            if source == Some(self.table) && filter.is_none() {
                return Some(
                    self.users
                        .iter()
                        .map(|(user, password)| format!("{user}{separator}{password}"))
                        .collect(),
                );
            }
            return None;
        }

        if item == self.password_column && source == Some(self.table) {
            let rows = self
                .users
                .iter()
                .filter(|(user, _)| {
                    filter == Some(format!("{} = '{}'", self.username_column, user).as_str())
                })
                .map(|(_, password)| password.to_string())
                .collect();
            return Some(rows);
        }

        None
    }
}

/// Product listing with injected rows appended after the real ones
pub fn page(injected: &[String]) -> String {
    let mut html = String::from(
        "<html><body><table class=\"is-table-longdescription\">\
         <tr><td>Conversation Controlling Lemon</td><td>$12.50</td></tr>",
    );
    for row in injected {
        html.push_str(&format!("<tr><th>{row}</th></tr>"));
    }
    html.push_str("</table></body></html>");
    html
}
