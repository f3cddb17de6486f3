//! Configuration management for Tiresias

use crate::error::{Result, TiresiasError};
use crate::logger::LogLevel;
use crate::models::Stage;
use crate::recon::catalog::COMMENT_TOKENS;
use crate::recon::extract::DEFAULT_SEPARATOR;
use crate::recon::schema::SchemaMarkers;
use crate::recon::scrape::Matcher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

pub const DEFAULT_INJECTION_PATH: &str = "/filter?category=Gifts";
pub const DEFAULT_COLUMN_CEILING: usize = 100;
pub const DEFAULT_TARGET_USER: &str = "administrator";

/// Everything a reconnaissance run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Lab root URL, with or without scheme
    pub target: String,
    /// Path and query up to and including the injectable parameter's value
    pub injection_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Whether to follow HTTP redirects
    pub follow_redirects: bool,
    /// HTTP/HTTPS proxy URL
    pub proxy: Option<String>,
    /// Maximum probes per second
    pub rate_limit: Option<u32>,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    pub log_level: LogLevel,
    /// Highest ORDER BY index tried when counting columns
    pub column_ceiling: usize,
    /// Comment tokens in the order they are tried
    pub comment_tokens: Vec<String>,
    /// Row whose password is extracted
    pub target_user: String,
    pub markers: SchemaMarkers,
    /// Search for a column that accepts strings before fingerprinting
    pub locate_text_column: bool,
    /// Literal injected while searching for a text column
    pub text_marker: String,
    /// Read the version banner once the engine is known
    pub fetch_version: bool,
    /// Read every credential row through one concatenated column
    pub dump_credentials: bool,
    /// Literal placed between the concatenated username and password
    pub concat_separator: String,
    /// End the run successfully after this stage
    pub stop_after: Option<Stage>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            injection_path: DEFAULT_INJECTION_PATH.to_string(),
            timeout_secs: 30,
            user_agent: "Tiresias/0.1.0".to_string(),
            follow_redirects: true,
            proxy: None,
            rate_limit: None,
            headers: HashMap::new(),
            log_level: LogLevel::Info,
            column_ceiling: DEFAULT_COLUMN_CEILING,
            comment_tokens: COMMENT_TOKENS.iter().map(|t| t.to_string()).collect(),
            target_user: DEFAULT_TARGET_USER.to_string(),
            markers: SchemaMarkers::default(),
            locate_text_column: false,
            text_marker: "tiresias".to_string(),
            fetch_version: false,
            dump_credentials: false,
            concat_separator: DEFAULT_SEPARATOR.to_string(),
            stop_after: None,
        }
    }
}

impl ReconConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(TiresiasError::ConfigError("A target URL is required".to_string()));
        }
        if self.column_ceiling == 0 {
            return Err(TiresiasError::ConfigError(
                "column_ceiling must be at least 1".to_string(),
            ));
        }
        if self.concat_separator.is_empty() {
            return Err(TiresiasError::ConfigError(
                "concat_separator must not be empty".to_string(),
            ));
        }
        if self.comment_tokens.is_empty() {
            return Err(TiresiasError::ConfigError(
                "At least one comment token is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Full URL of the injectable parameter
    pub fn base_url(&self) -> Result<String> {
        normalize_target(&self.target, &self.injection_path)
    }
}

/// Adds a default `https://` scheme, drops a trailing slash and appends the
/// injection path unless the URL already ends with it
pub fn normalize_target(lab_url: &str, injection_path: &str) -> Result<String> {
    let trimmed = lab_url.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let root = with_scheme.trim_end_matches('/');

    let full = if injection_path.is_empty() || root.ends_with(injection_path) {
        root.to_string()
    } else if injection_path.starts_with('/') {
        format!("{root}{injection_path}")
    } else {
        format!("{root}/{injection_path}")
    };

    Url::parse(&full)?;
    Ok(full)
}

/// File-based configuration structure
#[derive(Debug, Deserialize)]
struct FileConfig {
    target: Option<TargetSection>,
    http: Option<HttpSection>,
    recon: Option<ReconSection>,
    markers: Option<MarkersSection>,
}

#[derive(Debug, Deserialize)]
struct TargetSection {
    url: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HttpSection {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    follow_redirects: Option<bool>,
    proxy: Option<String>,
    rate_limit: Option<u32>,
    headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ReconSection {
    log_level: Option<String>,
    column_ceiling: Option<usize>,
    comment_tokens: Option<Vec<String>>,
    target_user: Option<String>,
    locate_text_column: Option<bool>,
    text_marker: Option<String>,
    fetch_version: Option<bool>,
    dump_credentials: Option<bool>,
    concat_separator: Option<String>,
    stop_after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarkersSection {
    table: Option<Matcher>,
    username: Option<Matcher>,
    password: Option<Matcher>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<ReconConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses TOML configuration text onto the defaults
pub fn parse_config(content: &str) -> Result<ReconConfig> {
    let file_config: FileConfig = toml::from_str(content)?;
    let mut config = ReconConfig::default();

    if let Some(target) = file_config.target {
        if let Some(url) = target.url {
            config.target = url;
        }
        if let Some(path) = target.path {
            config.injection_path = path;
        }
    }

    if let Some(http) = file_config.http {
        if let Some(timeout) = http.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(ua) = http.user_agent {
            config.user_agent = ua;
        }
        if let Some(follow) = http.follow_redirects {
            config.follow_redirects = follow;
        }
        if http.proxy.is_some() {
            config.proxy = http.proxy;
        }
        if http.rate_limit.is_some() {
            config.rate_limit = http.rate_limit;
        }
        if let Some(headers) = http.headers {
            config.headers = headers;
        }
    }

    if let Some(recon) = file_config.recon {
        if let Some(level) = recon.log_level {
            config.log_level = LogLevel::parse_or_info(&level);
        }
        if let Some(ceiling) = recon.column_ceiling {
            config.column_ceiling = ceiling;
        }
        if let Some(tokens) = recon.comment_tokens {
            config.comment_tokens = tokens;
        }
        if let Some(user) = recon.target_user {
            config.target_user = user;
        }
        if let Some(locate) = recon.locate_text_column {
            config.locate_text_column = locate;
        }
        if let Some(marker) = recon.text_marker {
            config.text_marker = marker;
        }
        if let Some(fetch) = recon.fetch_version {
            config.fetch_version = fetch;
        }
        if let Some(dump) = recon.dump_credentials {
            config.dump_credentials = dump;
        }
        if let Some(separator) = recon.concat_separator {
            config.concat_separator = separator;
        }
        if let Some(stage) = recon.stop_after {
            config.stop_after = Some(stage.parse().map_err(TiresiasError::ConfigError)?);
        }
    }

    if let Some(markers) = file_config.markers {
        if let Some(table) = markers.table {
            config.markers.table = table;
        }
        if let Some(username) = markers.username {
            config.markers.username = username;
        }
        if let Some(password) = markers.password {
            config.markers.password = password;
        }
    }

    Ok(config)
}

/// Command-line overrides; `None` leaves the configured value alone
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub target: Option<String>,
    pub injection_path: Option<String>,
    pub proxy: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub column_ceiling: Option<usize>,
    pub target_user: Option<String>,
    pub locate_text_column: bool,
    pub fetch_version: bool,
    pub dump_credentials: bool,
    pub stop_after: Option<Stage>,
}

/// Merges CLI arguments into an existing ReconConfig
pub fn merge_cli_args(config: &mut ReconConfig, cli: CliOverrides) {
    if let Some(target) = cli.target {
        config.target = target;
    }
    if let Some(path) = cli.injection_path {
        config.injection_path = path;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(timeout) = cli.timeout_secs {
        config.timeout_secs = timeout;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(ceiling) = cli.column_ceiling {
        config.column_ceiling = ceiling;
    }
    if let Some(user) = cli.target_user {
        config.target_user = user;
    }
    if cli.locate_text_column {
        config.locate_text_column = true;
    }
    if cli.fetch_version {
        config.fetch_version = true;
    }
    if cli.dump_credentials {
        config.dump_credentials = true;
    }
    if cli.stop_after.is_some() {
        config.stop_after = cli.stop_after;
    }
}
