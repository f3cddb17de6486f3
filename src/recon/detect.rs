//! Injectability check

use crate::http::Oracle;
use crate::logger::Logger;
use crate::models::StatusClass;

use super::payload;

/// Sends the base value with a dangling quote; a server error means the quote
/// reached the SQL parser.
///
/// A single sample decides. Transport failures and every non-5xx status count
/// as "not vulnerable".
pub async fn is_vulnerable(oracle: &dyn Oracle, log: &Logger, base: &str) -> bool {
    let url = payload::to_url(base, &payload::broken_literal(base));
    log.debug(format!("Vulnerability probe: {url}"));

    match oracle.probe(&url).await {
        Ok(result) => {
            let vulnerable = result.class() == StatusClass::ServerError;
            log.debug(format!(
                "Dangling quote returned {} (vulnerable: {vulnerable})",
                result.status
            ));
            vulnerable
        }
        Err(e) => {
            log.warning(format!("Vulnerability probe failed: {e}"));
            false
        }
    }
}
