//! Infrastructure layer for external integrations.
//!
//! This layer implements the storage interface defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - In-memory and PostgreSQL repository implementations
pub mod persistence;
