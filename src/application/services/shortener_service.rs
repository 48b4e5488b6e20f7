//! URL shortening service.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{BatchRequest, BatchResponse, StorageStats, UrlPair};
use crate::domain::repositories::UrlRepository;
use crate::error::{ServiceError, StoreError, StoreResult};
use crate::utils::code_generator::is_valid_code;
use crate::utils::url_validator::validate_url;

/// Service in front of a [`UrlRepository`].
///
/// Validates input, composes short URLs from the configured base and bounds
/// every storage call with a deadline. A call that misses its deadline is
/// dropped, which cancels it inside the backend.
pub struct ShortenerService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    base_url: String,
    timeout: Duration,
}

impl<R: UrlRepository + ?Sized> ShortenerService<R> {
    /// Creates a new service. `base_url` gets a trailing `/` if it lacks one.
    pub fn new(repository: Arc<R>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            repository,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}{}", self.base_url, code)
    }

    /// Shortens one URL for `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidUrl`] for a URL that is not an absolute
    /// http(s) URL and [`ServiceError::MissingOwner`] for an empty owner.
    ///
    /// A URL that is already stored yields [`ServiceError::Store`] wrapping
    /// [`StoreError::Duplicate`](crate::error::StoreError::Duplicate) with the
    /// existing short URL.
    pub async fn shorten(&self, owner_id: &str, url: &str) -> Result<String, ServiceError> {
        let owner_id = require_owner(owner_id)?;
        let url = validate_url(url)?;

        self.with_deadline(
            self.repository
                .create_short_url(owner_id, &self.base_url, url),
        )
        .await
    }

    /// Shortens every item atomically.
    ///
    /// Every URL is validated before anything reaches storage.
    pub async fn shorten_batch(
        &self,
        owner_id: &str,
        items: Vec<BatchRequest>,
    ) -> Result<Vec<BatchResponse>, ServiceError> {
        let owner_id = require_owner(owner_id)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let items = items
            .into_iter()
            .map(|item| {
                let original_url = validate_url(&item.original_url)?.to_string();
                Ok(BatchRequest {
                    correlation_id: item.correlation_id,
                    original_url,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        self.with_deadline(
            self.repository
                .batch_create_short_url(owner_id, &self.base_url, items),
        )
        .await
    }

    /// Resolves a short code to its original URL.
    ///
    /// A code that does not match the issued format is reported as not found
    /// without a storage round trip.
    pub async fn resolve(&self, code: &str) -> Result<String, ServiceError> {
        let code = code.trim();
        if !is_valid_code(code) {
            return Err(StoreError::NotFound.into());
        }

        self.with_deadline(self.repository.get_long_url(code)).await
    }

    /// Lists the active URLs of `owner_id`.
    pub async fn user_urls(&self, owner_id: &str) -> Result<Vec<UrlPair>, ServiceError> {
        let owner_id = require_owner(owner_id)?;
        self.with_deadline(self.repository.get_user_urls(owner_id))
            .await
    }

    /// Soft-deletes URLs of `owner_id`.
    ///
    /// Each entry is either a bare code or a full short URL under the
    /// configured base.
    pub async fn delete_urls(
        &self,
        owner_id: &str,
        codes: &[String],
    ) -> Result<(), ServiceError> {
        let owner_id = require_owner(owner_id)?;
        let codes: Vec<String> = codes
            .iter()
            .map(|entry| {
                let entry = entry.trim();
                entry
                    .strip_prefix(self.base_url.as_str())
                    .unwrap_or(entry)
                    .to_string()
            })
            .collect();

        self.with_deadline(self.repository.delete_urls(owner_id, &codes))
            .await
    }

    pub async fn stats(&self) -> Result<StorageStats, ServiceError> {
        self.with_deadline(self.repository.get_stats()).await
    }

    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.with_deadline(self.repository.ping()).await
    }

    /// Writes the store to `path`. No-op for durable backends.
    pub async fn offload(&self, path: &Path) -> Result<(), ServiceError> {
        self.with_deadline(self.repository.offload_storage(path))
            .await
    }

    async fn with_deadline<T>(
        &self,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<T, ServiceError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Storage call exceeded deadline");
                Err(ServiceError::DeadlineExceeded(self.timeout))
            }
        }
    }
}

/// Owner ids are opaque: blank ones are rejected, others pass through as given.
fn require_owner(owner_id: &str) -> Result<&str, ServiceError> {
    if owner_id.trim().is_empty() {
        return Err(ServiceError::MissingOwner);
    }
    Ok(owner_id)
}
