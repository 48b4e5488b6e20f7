//! Translation of `sqlx` errors into the storage error taxonomy.

use crate::error::StoreError;

/// Primary key constraint on `urls.short_code`.
pub const SHORT_CODE_CONSTRAINT: &str = "urls_pkey";

/// Unique constraint on `urls.original_url`.
pub const ORIGINAL_URL_CONSTRAINT: &str = "urls_original_url_key";

fn is_unique_violation_on(e: &sqlx::Error, constraint: &str) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    db_err.constraint() == Some(constraint)
}

/// A freshly generated short code already exists.
pub fn is_unique_violation_on_code(e: &sqlx::Error) -> bool {
    is_unique_violation_on(e, SHORT_CODE_CONSTRAINT)
}

/// The original URL is already stored.
pub fn is_unique_violation_on_url(e: &sqlx::Error) -> bool {
    is_unique_violation_on(e, ORIGINAL_URL_CONSTRAINT)
}

/// Logs a driver failure and converts it to [`StoreError::Internal`].
pub fn map_sqlx_error(operation: &'static str, e: sqlx::Error) -> StoreError {
    tracing::error!(operation, error = %e, "Database error");
    StoreError::internal(format!("{operation}: database error"))
}
