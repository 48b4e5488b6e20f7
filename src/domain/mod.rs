//! Domain layer containing entities and the storage contract.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - The [`repositories::UrlRepository`] trait every backend implements
//!
//! The domain layer has no dependency on a particular backend. Concrete
//! implementations live in [`crate::infrastructure::persistence`].

pub mod entities;
pub mod repositories;
