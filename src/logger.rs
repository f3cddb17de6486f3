//! Level-filtered logging capability handed to every pipeline stage
//!
//! Messages are emitted as `tracing` events; the threshold lives in the
//! `Logger` value the caller passes in rather than in any global.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Verbosity levels, least to most important
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Action,
    Warning,
    Fatal,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Action => "action",
            LogLevel::Warning => "warning",
            LogLevel::Fatal => "fatal",
            LogLevel::Success => "success",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "action" => Ok(LogLevel::Action),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "fatal" => Ok(LogLevel::Fatal),
            "success" => Ok(LogLevel::Success),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl LogLevel {
    /// Parses a level name, falling back to `Info` for anything unknown
    pub fn parse_or_info(s: &str) -> Self {
        s.parse().unwrap_or_else(|e| {
            warn!("{e}, defaulting to info");
            LogLevel::Info
        })
    }
}

/// Whether a message at `level` passes a `threshold`
pub fn enabled(threshold: LogLevel, level: LogLevel) -> bool {
    level >= threshold
}

/// `tracing` filter directive that lets through everything `threshold` emits
pub fn filter_directive(threshold: LogLevel) -> &'static str {
    match threshold {
        LogLevel::Debug => "tiresias=debug",
        _ => "tiresias=info",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    threshold: LogLevel,
}

impl Logger {
    pub fn new(threshold: LogLevel) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        enabled(self.threshold, level)
    }

    pub fn debug(&self, msg: impl fmt::Display) {
        if self.enabled(LogLevel::Debug) {
            debug!("{msg}");
        }
    }

    pub fn info(&self, msg: impl fmt::Display) {
        if self.enabled(LogLevel::Info) {
            info!("{msg}");
        }
    }

    /// An operation about to be attempted
    pub fn action(&self, msg: impl fmt::Display) {
        if self.enabled(LogLevel::Action) {
            info!("[~] {msg}");
        }
    }

    pub fn warning(&self, msg: impl fmt::Display) {
        if self.enabled(LogLevel::Warning) {
            warn!("{msg}");
        }
    }

    pub fn fatal(&self, msg: impl fmt::Display) {
        if self.enabled(LogLevel::Fatal) {
            error!("{msg}");
        }
    }

    /// A stage produced its result
    pub fn success(&self, msg: impl fmt::Display) {
        if self.enabled(LogLevel::Success) {
            info!("[+] {msg}");
        }
    }
}
