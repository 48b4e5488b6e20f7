//! Short URL entity and the data carried in and out of the repository.

use serde::{Deserialize, Serialize};

/// A stored mapping between a short code and an original URL.
///
/// `short_code` is globally unique and immutable. Once `deleted` is set it
/// never reverts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrlRecord {
    pub short_code: String,
    pub original_url: String,
    pub owner_id: String,
    pub deleted: bool,
}

impl ShortUrlRecord {
    /// Creates an active record.
    pub fn new(short_code: String, original_url: String, owner_id: String) -> Self {
        Self {
            short_code,
            original_url,
            owner_id,
            deleted: false,
        }
    }

    /// Returns true if the record is still resolvable.
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

/// One item of a batch shortening request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub correlation_id: String,
    pub original_url: String,
}

impl BatchRequest {
    pub fn new(correlation_id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            original_url: original_url.into(),
        }
    }
}

/// One item of a batch shortening response, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub correlation_id: String,
    pub short_url: String,
}

/// An active record as listed for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlPair {
    pub short_code: String,
    pub original_url: String,
}

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Issued records, soft-deleted ones included.
    pub urls: u64,
    /// Distinct owners with at least one record.
    pub users: u64,
}
