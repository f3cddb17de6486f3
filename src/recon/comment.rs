//! Comment-style resolution

use crate::error::{Result, TiresiasError};
use crate::http::Oracle;
use crate::logger::Logger;

use super::payload;

/// Returns the first token, in the order given, for which `<base>' <token>`
/// is answered with a success status. Later tokens are never probed once one
/// succeeds.
pub async fn resolve_comment_token<S: AsRef<str>>(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    tokens: &[S],
) -> Result<String> {
    for token in tokens {
        let token = token.as_ref();
        let url = payload::to_url(base, &payload::comment_probe(base, token));
        let result = oracle.probe(&url).await?;

        if result.is_success() {
            return Ok(token.to_string());
        }
        log.debug(format!("Comment token {token:?} rejected with {}", result.status));
    }

    Err(TiresiasError::NoCommentStyleFound {
        tried: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
    })
}
