//! Core domain entities of the storage layer.
//!
//! - [`ShortUrlRecord`] - A stored short code to URL mapping
//! - [`BatchRequest`] / [`BatchResponse`] - Batch shortening input and output
//! - [`UrlPair`] - An owner's active mapping as listed
//! - [`StorageStats`] - Aggregate counts

pub mod short_url;

pub use short_url::{BatchRequest, BatchResponse, ShortUrlRecord, StorageStats, UrlPair};
