//! The probe seam between the pipeline and the network

use crate::error::Result;
use crate::models::ProbeResult;
use async_trait::async_trait;

/// Sends one GET request per probe and reports the status and body.
///
/// Implementations own timeouts, redirects and proxying. They must not
/// rewrite the URL they are given, and must not retry: a failure is reported
/// as `TiresiasError::Transport`.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeResult>;
}

