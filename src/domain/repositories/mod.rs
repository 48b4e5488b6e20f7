//! Repository trait definitions for the domain layer.
//!
//! The storage contract is defined here and implemented by the backends in
//! `crate::infrastructure::persistence`. A mock implementation is generated
//! via `mockall` for testing.
//!
//! # Testing
//!
//! Both backends run the same contract suite: see `tests/common/mod.rs`.

pub mod url_repository;

pub use url_repository::UrlRepository;

#[cfg(test)]
pub use url_repository::MockUrlRepository;
