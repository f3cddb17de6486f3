//! Core data models for Tiresias

use crate::recon::catalog::Signature;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binary classification signal derived from a probe's status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 5xx
    ServerError,
    /// Anything else; inconclusive
    Other,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }
}

/// Outcome of a single probe. Created per request and dropped after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProbeResult {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.class() == StatusClass::Success
    }

    pub fn is_server_error(&self) -> bool {
        self.class() == StatusClass::ServerError
    }
}

/// One step of the reconnaissance pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Vulnerability,
    CommentStyle,
    ColumnCount,
    TextColumn,
    Engine,
    Version,
    TableName,
    ColumnNames,
    Credentials,
    Value,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Vulnerability,
        Stage::CommentStyle,
        Stage::ColumnCount,
        Stage::TextColumn,
        Stage::Engine,
        Stage::Version,
        Stage::TableName,
        Stage::ColumnNames,
        Stage::Credentials,
        Stage::Value,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Vulnerability => "vulnerability",
            Stage::CommentStyle => "comment-style",
            Stage::ColumnCount => "column-count",
            Stage::TextColumn => "text-column",
            Stage::Engine => "engine",
            Stage::Version => "version",
            Stage::TableName => "table-name",
            Stage::ColumnNames => "column-names",
            Stage::Credentials => "credentials",
            Stage::Value => "value",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}

/// Width of the vulnerable query's result set and the position used to display
/// injected expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnionShape {
    pub columns: usize,
    pub slot: usize,
}

impl UnionShape {
    /// Shape with the display slot at position 0
    pub fn new(columns: usize) -> Self {
        Self { columns, slot: 0 }
    }

    pub fn with_slot(self, slot: usize) -> Self {
        Self { slot, ..self }
    }
}

/// Username and password column names of the credentials table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialColumns {
    pub username: String,
    pub password: String,
}

/// Value read back from the credentials table for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedValue {
    pub user: String,
    pub value: String,
}

/// Facts accumulated by the pipeline. Each field is written once, by the stage
/// that owns it, and only read afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineState {
    pub base_url: String,
    pub comment_token: Option<String>,
    pub column_count: Option<usize>,
    pub text_column: Option<usize>,
    pub signature: Option<Signature>,
    pub version: Option<String>,
    pub table_name: Option<String>,
    pub username_column: Option<String>,
    pub password_column: Option<String>,
    /// Every row read through the concatenated credentials column
    pub credentials: Option<Vec<ExtractedValue>>,
    pub extracted: Option<ExtractedValue>,
}

impl PipelineState {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Shape used for UNION payloads once the column count is known
    pub fn shape(&self) -> Option<UnionShape> {
        self.column_count
            .map(|columns| UnionShape::new(columns).with_slot(self.text_column.unwrap_or(0)))
    }
}

/// Writes a state field that must not have been set before.
pub(crate) fn set_once<T>(slot: &mut Option<T>, value: T) {
    debug_assert!(slot.is_none(), "pipeline state field written twice");
    *slot = Some(value);
}

/// Result of a complete or early-stopped pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub target: String,
    pub state: PipelineState,
    pub completed: Vec<Stage>,
    pub started_at: DateTime<Local>,
    pub duration_ms: u64,
    pub probes: u64,
}
