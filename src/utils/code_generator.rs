//! Short code generation and validation utilities.
//!
//! Codes are drawn uniformly from the 62-symbol alphabet `[A-Za-z0-9]` with a
//! fixed length of 6, giving a keyspace of 62^6 (about 5.68 * 10^10). Generation
//! makes no uniqueness promise: storage backends detect collisions and ask for
//! another code, up to [`MAX_GENERATION_ATTEMPTS`] times.

use rand::Rng;
use rand::distr::Alphanumeric;
use std::sync::Arc;

/// Length of every issued short code.
pub const CODE_LENGTH: usize = 6;

/// Upper bound on regenerate-and-retry rounds after a code collision.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Source of candidate short codes used by the storage backends.
///
/// Production code uses [`default_code_source`]; tests inject scripted sources
/// to force collisions.
pub type CodeSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Generates a random short code of [`CODE_LENGTH`] characters.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code() -> String {
    generate_code_with_length(CODE_LENGTH)
}

/// Generates a random alphanumeric code of the given length.
pub fn generate_code_with_length(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Returns the code source backed by [`generate_code`].
pub fn default_code_source() -> CodeSource {
    Arc::new(generate_code)
}

/// Checks that a code matches the issued format: 6 ASCII alphanumerics.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}
