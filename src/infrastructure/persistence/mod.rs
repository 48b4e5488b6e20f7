//! Storage backends.
//!
//! Concrete implementations of [`UrlRepository`](crate::domain::repositories::UrlRepository).
//!
//! # Repositories
//!
//! - [`MemoryUrlRepository`] - In-process maps with a JSON snapshot file
//! - [`PgUrlRepository`] - PostgreSQL via SQLx
//!
//! [`open_repository`] picks one of them from the configuration.

pub mod factory;
pub mod memory_url_repository;
pub mod pg_url_repository;
pub mod snapshot;

pub use factory::{BackendKind, open_repository};
pub use memory_url_repository::MemoryUrlRepository;
pub use pg_url_repository::{BATCH_CHUNK_SIZE, PgUrlRepository, PoolSettings};
