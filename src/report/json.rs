//! JSON report export

use crate::error::Result;
use crate::models::ReconReport;
use std::path::Path;
use tracing::info;

/// Exports a reconnaissance report as a JSON file
pub fn export(report: &ReconReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(output_path, json)?;
    info!("JSON report saved to {}", output_path.display());
    Ok(())
}
