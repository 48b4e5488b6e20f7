//! Backend selection.
//!
//! One backend is chosen at startup from the configuration and handed to
//! callers as `Arc<dyn UrlRepository>`, so nothing above this module knows
//! which storage is in use.

use std::sync::Arc;

use tracing::info;

use super::{MemoryUrlRepository, PgUrlRepository};
use crate::config::Config;
use crate::domain::repositories::UrlRepository;
use crate::error::StoreResult;

/// Storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process maps persisted to a JSON snapshot file.
    Memory,
    /// PostgreSQL through a connection pool.
    Postgres,
}

impl BackendKind {
    /// A configured, non-empty DSN selects PostgreSQL.
    pub fn from_config(config: &Config) -> Self {
        match config.database_dsn.as_deref() {
            Some(dsn) if !dsn.trim().is_empty() => Self::Postgres,
            _ => Self::Memory,
        }
    }
}

/// Opens the configured backend.
///
/// The relational backend connects and applies migrations. The memory backend
/// loads its snapshot file.
///
/// # Errors
///
/// Returns [`StoreError::Internal`](crate::error::StoreError::Internal) if the
/// database is unreachable, a migration fails, or the snapshot cannot be read.
pub async fn open_repository(config: &Config) -> StoreResult<Arc<dyn UrlRepository>> {
    match (BackendKind::from_config(config), config.database_dsn.as_deref()) {
        (BackendKind::Postgres, Some(dsn)) => {
            let repo = PgUrlRepository::connect(dsn, &config.pool_settings()).await?;
            repo.migrate().await?;
            info!("Using PostgreSQL storage");
            Ok(Arc::new(repo))
        }
        _ => {
            let repo = MemoryUrlRepository::load(&config.file_storage_path).await?;
            info!(path = %config.file_storage_path.display(), "Using in-memory storage");
            Ok(Arc::new(repo))
        }
    }
}
