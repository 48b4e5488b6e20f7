//! Validation of URLs submitted for shortening.
//!
//! URLs are checked, not rewritten: deduplication works on the exact string
//! the caller submitted, so two spellings of the same address get two codes.

use url::Url;

/// Errors that can occur during URL validation.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must contain a host")]
    MissingHost,
}

/// Validates a URL and returns it with surrounding whitespace removed.
///
/// # Rules
///
/// 1. Must parse as an absolute URL
/// 2. Scheme must be `http` or `https`
/// 3. Must have a non-empty host
///
/// # Errors
///
/// Returns [`UrlValidationError::InvalidFormat`] for malformed or relative URLs.
/// Returns [`UrlValidationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
/// Returns [`UrlValidationError::MissingHost`] when the host is empty.
pub fn validate_url(input: &str) -> Result<&str, UrlValidationError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(trimmed)
}
