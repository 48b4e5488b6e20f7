//! Utility functions for code generation, URL validation, and driver error handling.
//!
//! - [`code_generator`] - Short code generation and format checks
//! - [`url_validator`] - Validation of submitted URLs
//! - [`db_error`] - `sqlx` error classification

pub mod code_generator;
pub mod db_error;
pub mod url_validator;
