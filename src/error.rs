//! Error types for Tiresias

use crate::models::Stage;
use thiserror::Error;

/// Coarse classification of a failure, independent of which stage raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The oracle could not complete the request
    Transport,
    /// A probe returned a status outside the classified success/server-error set
    UnexpectedStatus,
    /// A response body could not be read as the expected structure
    Parse,
    /// A marker or value was absent from an otherwise well-formed response
    NotFound,
    /// A bounded search ran out of candidates
    SearchExhausted,
    /// The identified engine lacks a feature a later stage relies on
    Unsupported,
    /// Invalid local configuration or I/O
    Config,
}

/// Main error type for Tiresias operations
#[derive(Debug, Error)]
pub enum TiresiasError {
    #[error("Transport failure for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No table header cell matches {matcher}")]
    CellNotFound { matcher: String },

    #[error("Target does not appear to be injectable: {url}")]
    NotVulnerable { url: String },

    #[error("No comment style accepted, tried: {tried:?}")]
    NoCommentStyleFound { tried: Vec<String> },

    #[error("ORDER BY 1 already fails, the parameter is not orderable")]
    NoColumnsFound,

    #[error("Column count not found within {ceiling} columns")]
    ColumnSearchExhausted { ceiling: usize },

    #[error("None of the {columns} columns accepts a string value")]
    TextColumnNotFound { columns: usize },

    #[error("No catalog engine matched for comment token {token:?}")]
    EngineNotIdentified { token: String },

    #[error("Engine {engine} has no information_schema views")]
    UnsupportedEngine { engine: String },

    #[error("No table name matches {matcher}")]
    TableNotFound { matcher: String },

    #[error("No column of table '{table}' matches {matcher}")]
    ColumnNotFound { table: String, matcher: String },

    #[error("Version banner not found for {engine}")]
    BannerNotFound { engine: String },

    #[error("No value in column '{column}' for '{value}'")]
    ValueNotFound { column: String, value: String },

    #[error("No concatenated credential rows read from '{table}'")]
    CredentialsNotFound { table: String },

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: Box<TiresiasError>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl TiresiasError {
    /// Wraps a stage failure with the stage that produced it
    pub fn in_stage(self, stage: Stage) -> Self {
        TiresiasError::StageFailed {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns the stage this error was attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TiresiasError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TiresiasError::Transport { .. } => ErrorKind::Transport,
            TiresiasError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            TiresiasError::Parse(_) => ErrorKind::Parse,
            TiresiasError::CellNotFound { .. }
            | TiresiasError::NotVulnerable { .. }
            | TiresiasError::NoColumnsFound
            | TiresiasError::TableNotFound { .. }
            | TiresiasError::ColumnNotFound { .. }
            | TiresiasError::BannerNotFound { .. }
            | TiresiasError::ValueNotFound { .. }
            | TiresiasError::CredentialsNotFound { .. } => ErrorKind::NotFound,
            TiresiasError::NoCommentStyleFound { .. }
            | TiresiasError::ColumnSearchExhausted { .. }
            | TiresiasError::TextColumnNotFound { .. }
            | TiresiasError::EngineNotIdentified { .. } => ErrorKind::SearchExhausted,
            TiresiasError::UnsupportedEngine { .. } => ErrorKind::Unsupported,
            TiresiasError::StageFailed { source, .. } => source.kind(),
            TiresiasError::ConfigError(_)
            | TiresiasError::IoError(_)
            | TiresiasError::TomlError(_)
            | TiresiasError::JsonError(_)
            | TiresiasError::UrlError(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for Tiresias operations
pub type Result<T> = std::result::Result<T, TiresiasError>;
