//! Tiresias - SQL injection reconnaissance CLI

use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

use tiresias::config::{self, CliOverrides, ReconConfig};
use tiresias::http::HttpOracle;
use tiresias::logger::{self, LogLevel, Logger};
use tiresias::models::{ReconReport, Stage};
use tiresias::recon::{Pipeline, PipelineOptions};
use tiresias::report;

/// Tiresias - staged UNION-based SQL injection reconnaissance for web security labs
#[derive(Parser)]
#[command(name = "tiresias", version, about, long_about = None)]
struct Cli {
    /// Lab root URL
    #[arg(short, long)]
    url: Option<String>,

    /// Path and query of the injectable parameter, including its value
    #[arg(long)]
    path: Option<String>,

    /// HTTP/HTTPS proxy URL (e.g. http://127.0.0.1:8080)
    #[arg(long)]
    proxy: Option<String>,

    /// Log level (debug, info, action, warning, fatal, success)
    #[arg(long)]
    log_level: Option<String>,

    /// User whose password is extracted
    #[arg(long)]
    user: Option<String>,

    /// Highest ORDER BY index tried when counting columns
    #[arg(long)]
    max_columns: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Search for a column that accepts strings before fingerprinting
    #[arg(long)]
    locate_text_column: bool,

    /// Read the version banner once the engine is known
    #[arg(long)]
    fetch_version: bool,

    /// Read every username/password row through one concatenated column
    #[arg(long)]
    dump_credentials: bool,

    /// Stop successfully after this stage (e.g. engine)
    #[arg(long)]
    stop_after: Option<Stage>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  TIRESIAS v0.1.0                      ║
    ║  SQL injection reconnaissance         ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn print_summary(report: &ReconReport) {
    let state = &report.state;
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    println!("\n{}", "  Reconnaissance Summary".bold());
    println!("  {}", "─".repeat(35));

    let mut builder = Builder::default();
    builder.push_record(["Fact", "Value"]);
    builder.push_record(["Target".to_string(), report.target.clone()]);
    builder.push_record(["Comment style".to_string(), or_dash(state.comment_token.as_ref().map(|t| format!("{t:?}")))]);
    builder.push_record(["Columns".to_string(), or_dash(state.column_count.map(|c| c.to_string()))]);
    builder.push_record(["Text column".to_string(), or_dash(state.text_column.map(|c| c.to_string()))]);
    builder.push_record(["Engine".to_string(), or_dash(state.signature.map(|s| s.name()))]);
    builder.push_record(["Version".to_string(), or_dash(state.version.clone())]);
    builder.push_record(["Table".to_string(), or_dash(state.table_name.clone())]);
    builder.push_record(["Username column".to_string(), or_dash(state.username_column.clone())]);
    builder.push_record(["Password column".to_string(), or_dash(state.password_column.clone())]);
    builder.push_record([
        "Credential rows".to_string(),
        or_dash(state.credentials.as_ref().map(|rows| rows.len().to_string())),
    ]);
    builder.push_record([
        "Extracted".to_string(),
        or_dash(
            state
                .extracted
                .as_ref()
                .map(|e| format!("{}: {}", e.user, e.value)),
        ),
    ]);

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");

    println!(
        "\n  {} probes in {} ms",
        report.probes.to_string().cyan(),
        report.duration_ms.to_string().cyan()
    );
}

/// Loads the config file (or defaults) and applies the command-line overrides
fn build_config(cli: &Cli) -> tiresias::error::Result<ReconConfig> {
    let mut recon_config = if let Some(ref path) = cli.config {
        config::load_config(path)?
    } else {
        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            config::load_config(default_path)?
        } else {
            ReconConfig::default()
        }
    };

    config::merge_cli_args(
        &mut recon_config,
        CliOverrides {
            target: cli.url.clone(),
            injection_path: cli.path.clone(),
            proxy: cli.proxy.clone(),
            timeout_secs: cli.timeout,
            log_level: cli.log_level.as_deref().map(LogLevel::parse_or_info),
            column_ceiling: cli.max_columns,
            target_user: cli.user.clone(),
            locate_text_column: cli.locate_text_column,
            fetch_version: cli.fetch_version,
            dump_credentials: cli.dump_credentials,
            stop_after: cli.stop_after,
        },
    );
    recon_config.validate()?;
    Ok(recon_config)
}

async fn run(
    recon_config: ReconConfig,
    output: Option<PathBuf>,
) -> tiresias::error::Result<ReconReport> {
    let base_url = recon_config.base_url()?;
    println!("  {} {}", "Target:".bold(), base_url.green());
    println!(
        "  {} {}\n",
        "Column ceiling:".bold(),
        recon_config.column_ceiling.to_string().cyan()
    );

    let oracle = HttpOracle::from_config(&recon_config)?;
    let logger = Logger::new(recon_config.log_level);
    let pipeline = Pipeline::new(
        &oracle,
        logger,
        PipelineOptions::from_config(&recon_config),
    );

    let result = pipeline.run(&base_url).await?;

    if let Some(ref output) = output {
        report::json::export(&result, output)?;
        println!("\n  {} {}", "Report saved to:".bold(), output.display().to_string().green());
    }

    Ok(result)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    print_banner();

    let outcome = match build_config(&cli) {
        Ok(recon_config) => {
            let filter = logger::filter_directive(recon_config.log_level);
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
                )
                .with_target(false)
                .init();
            run(recon_config, cli.output).await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => print_summary(&result),
        Err(e) => {
            let stage = e
                .stage()
                .map(|s| format!(" in stage '{s}'"))
                .unwrap_or_default();
            eprintln!("\n  {} Reconnaissance failed{stage}: {e}", "Error:".red().bold());
            std::process::exit(1);
        }
    }
}
