//! Application layer services.
//!
//! Services validate input and orchestrate repository calls. They depend on
//! the [`UrlRepository`](crate::domain::repositories::UrlRepository) trait
//! only, never on a concrete backend.
//!
//! # Available Services
//!
//! - [`services::shortener_service::ShortenerService`] - Shortening, resolution, listing and deletion

pub mod services;
