//! Repository trait for short URL storage.

use std::path::Path;

use crate::domain::entities::{BatchRequest, BatchResponse, StorageStats, UrlPair};
use crate::error::StoreResult;
use async_trait::async_trait;

/// Storage contract shared by every backend.
///
/// Every implementation must produce the same observable behavior, including
/// the same [`crate::error::StoreError`] variant for the same situation.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryUrlRepository`] - In-process maps with a JSON snapshot
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Cancellation
///
/// Dropping a returned future cancels the operation. Uncommitted database
/// transactions roll back when dropped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Shortens `original_url` for `owner_id` and returns `url_base + code`.
    ///
    /// This is find-or-create: a URL that is already stored (by any owner)
    /// is not stored again and does not gain a second owner.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`](crate::error::StoreError::Duplicate)
    /// carrying the existing short URL if the URL was already shortened.
    ///
    /// Returns [`StoreError::Internal`](crate::error::StoreError::Internal) on
    /// storage failures or when every generated code collided.
    async fn create_short_url(
        &self,
        owner_id: &str,
        url_base: &str,
        original_url: &str,
    ) -> StoreResult<String>;

    /// Shortens every item atomically. Responses follow the input order.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if any item is already stored or two items carry the
    /// same URL. In that case nothing from the batch is stored.
    ///
    /// Returns `Internal` on storage failures.
    async fn batch_create_short_url(
        &self,
        owner_id: &str,
        url_base: &str,
        items: Vec<BatchRequest>,
    ) -> StoreResult<Vec<BatchResponse>>;

    /// Resolves a short code to its original URL.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a code that was never issued and `Gone` for a
    /// soft-deleted one.
    async fn get_long_url(&self, short_code: &str) -> StoreResult<String>;

    /// Lists the active records owned by `owner_id`, ordered by short code.
    ///
    /// An owner with no records gets an empty list.
    async fn get_user_urls(&self, owner_id: &str) -> StoreResult<Vec<UrlPair>>;

    /// Soft-deletes the given codes on behalf of `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `UserMismatch` if any code is unknown or owned by someone else.
    /// No code is deleted in that case.
    async fn delete_urls(&self, owner_id: &str, short_codes: &[String]) -> StoreResult<()>;

    /// Counts issued records and distinct owners.
    async fn get_stats(&self) -> StoreResult<StorageStats>;

    /// Liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    /// Writes the full record set to `path`.
    ///
    /// Durable backends treat this as a no-op.
    async fn offload_storage(&self, path: &Path) -> StoreResult<()>;
}
