//! Static catalog of backend engine signatures and comment tokens

use serde::Serialize;
use std::fmt;

pub const DOUBLE_DASH: &str = "--";
pub const DOUBLE_DASH_SPACE: &str = "-- ";
pub const HASH: &str = "#";

/// Comment tokens in the order they are tried
pub const COMMENT_TOKENS: [&str; 3] = [DOUBLE_DASH, DOUBLE_DASH_SPACE, HASH];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Engine {
    Oracle,
    Mssql,
    Mysql,
    Postgresql,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Oracle => write!(f, "Oracle"),
            Engine::Mssql => write!(f, "MSSQL"),
            Engine::Mysql => write!(f, "MySQL"),
            Engine::Postgresql => write!(f, "PostgreSQL"),
        }
    }
}

/// How one backend engine reveals its version and which comment tokens it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub engine: Engine,
    pub version_expression: &'static str,
    /// Row source the version expression has to be read from, if it is a
    /// column rather than a function call
    pub version_source: Option<&'static str>,
    pub concatenation_operator: &'static str,
    pub comment_tokens: &'static [&'static str],
}

impl Signature {
    pub fn name(&self) -> String {
        self.engine.to_string()
    }

    pub fn accepts(&self, token: &str) -> bool {
        self.comment_tokens.contains(&token)
    }

    /// Oracle exposes no `information_schema`
    pub fn has_information_schema(&self) -> bool {
        self.engine != Engine::Oracle
    }
}

pub const ORACLE: Signature = Signature {
    engine: Engine::Oracle,
    version_expression: "version",
    version_source: Some("v$instance"),
    concatenation_operator: "||",
    comment_tokens: &[DOUBLE_DASH],
};

pub const MSSQL: Signature = Signature {
    engine: Engine::Mssql,
    version_expression: "@@version",
    version_source: None,
    concatenation_operator: "+",
    comment_tokens: &[DOUBLE_DASH],
};

pub const MYSQL: Signature = Signature {
    engine: Engine::Mysql,
    version_expression: "@@version",
    version_source: None,
    concatenation_operator: " ",
    comment_tokens: &[DOUBLE_DASH_SPACE, HASH],
};

pub const POSTGRESQL: Signature = Signature {
    engine: Engine::Postgresql,
    version_expression: "version()",
    version_source: None,
    concatenation_operator: "||",
    comment_tokens: &[DOUBLE_DASH],
};

/// Signatures in scan order
pub const SIGNATURES: [Signature; 4] = [ORACLE, MSSQL, MYSQL, POSTGRESQL];
