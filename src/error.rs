//! Error taxonomy shared by every storage backend.
//!
//! Backends translate their own low-level failures (driver errors, file I/O,
//! JSON decoding) into [`StoreError`] before returning. Nothing above the
//! repository layer sees a `sqlx` or `std::io` error.
//!
//! [`ServiceError`] wraps those errors for the application service, together
//! with input validation failures and missed deadlines.

use std::time::Duration;

use thiserror::Error;

use crate::utils::url_validator::UrlValidationError;

/// Errors returned by [`crate::domain::repositories::UrlRepository`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The original URL is already shortened.
    ///
    /// Carries the existing short URL when one is stored. It is `None` when the
    /// clash is between items of the same batch or with a concurrent batch writer.
    #[error("URL has already been shortened")]
    Duplicate { short_url: Option<String> },

    #[error("short URL not found")]
    NotFound,

    /// The short code exists but has been soft-deleted.
    #[error("short URL has been deleted")]
    Gone,

    /// A delete request named codes the caller does not own.
    #[error("user tried to delete URLs they do not own")]
    UserMismatch,

    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn duplicate(short_url: impl Into<String>) -> Self {
        Self::Duplicate {
            short_url: Some(short_url.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for the non-fatal duplicate signal.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Existing short URL carried by a [`StoreError::Duplicate`].
    pub fn existing_short_url(&self) -> Option<&str> {
        match self {
            Self::Duplicate { short_url } => short_url.as_deref(),
            _ => None,
        }
    }
}

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by [`crate::application::services::ShortenerService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidUrl(#[from] UrlValidationError),

    #[error("owner id must not be empty")]
    MissingOwner,

    #[error("storage call exceeded the {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Returns the underlying storage error, if any.
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}
