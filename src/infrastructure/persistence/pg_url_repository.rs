//! PostgreSQL implementation of the URL repository.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, error, info};

use crate::domain::entities::{BatchRequest, BatchResponse, StorageStats, UrlPair};
use crate::domain::repositories::UrlRepository;
use crate::error::{StoreError, StoreResult};
use crate::utils::code_generator::{CodeSource, MAX_GENERATION_ATTEMPTS, default_code_source};
use crate::utils::db_error::{is_unique_violation_on_code, is_unique_violation_on_url, map_sqlx_error};

/// Number of rows per multi-row `INSERT` in a batch.
pub const BATCH_CHUNK_SIZE: usize = 100;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// PostgreSQL repository for short URLs.
///
/// No in-process locking: the primary key on `short_code` and the unique
/// constraint on `original_url` are the source of truth for uniqueness, and
/// every write runs inside a transaction.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
    generate: CodeSource,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            generate: default_code_source(),
        }
    }

    /// Opens a connection pool for `dsn`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if the pool cannot be created.
    pub async fn connect(dsn: &str, settings: &PoolSettings) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(settings.idle_timeout)
            .max_lifetime(settings.max_lifetime)
            .connect(dsn)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        info!("Connected to database");
        Ok(Self::new(Arc::new(pool)))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if a migration fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to apply migrations");
                StoreError::internal("failed to apply migrations")
            })?;

        info!("Database schema is up to date");
        Ok(())
    }

    /// Replaces the code generator.
    pub fn with_code_source(mut self, generate: CodeSource) -> Self {
        self.generate = generate;
        self
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Generates one distinct code per item.
    fn chunk_codes(&self, len: usize) -> Vec<String> {
        let mut codes: Vec<String> = Vec::with_capacity(len);
        let mut seen = HashSet::with_capacity(len);
        // Bounded: a source stuck on one value yields repeats, which the insert rejects.
        let mut budget = len * MAX_GENERATION_ATTEMPTS;
        while codes.len() < len {
            let code = (self.generate)();
            if seen.insert(code.clone()) || budget == 0 {
                codes.push(code);
            } else {
                budget -= 1;
            }
        }
        codes
    }

    /// Inserts one chunk inside a savepoint, regenerating its codes on collision.
    async fn insert_chunk(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: &str,
        chunk: &[BatchRequest],
    ) -> StoreResult<Vec<String>> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let codes = self.chunk_codes(chunk.len());

            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO urls (owner_id, short_code, original_url) ");
            builder.push_values(chunk.iter().zip(&codes), |mut row, (item, code)| {
                row.push_bind(owner_id.to_owned())
                    .push_bind(code.clone())
                    .push_bind(item.original_url.clone());
            });

            let mut savepoint = Connection::begin(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("batch_create_short_url", e))?;

            match builder.build().execute(&mut *savepoint).await {
                Ok(_) => {
                    savepoint
                        .commit()
                        .await
                        .map_err(|e| map_sqlx_error("batch_create_short_url", e))?;
                    return Ok(codes);
                }
                Err(e) if is_unique_violation_on_code(&e) => {
                    savepoint
                        .rollback()
                        .await
                        .map_err(|e| map_sqlx_error("batch_create_short_url", e))?;
                    metrics::counter!("shortener_code_collisions_total").increment(1);
                    debug!(attempt, "Short code collision in batch chunk, regenerating");
                }
                Err(e) if is_unique_violation_on_url(&e) => {
                    metrics::counter!("shortener_duplicates_total").increment(1);
                    return Err(StoreError::Duplicate { short_url: None });
                }
                Err(e) => return Err(map_sqlx_error("batch_create_short_url", e)),
            }
        }

        error!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Failed to generate unique short codes for batch chunk"
        );
        Err(StoreError::internal(
            "failed to generate unique short code: too many collisions",
        ))
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create_short_url(
        &self,
        owner_id: &str,
        url_base: &str,
        original_url: &str,
    ) -> StoreResult<String> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = (self.generate)();

            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| map_sqlx_error("create_short_url", e))?;

            // A URL conflict returns the stored row untouched; `xmax = 0` only for a fresh insert.
            let result = sqlx::query_as::<_, (String, bool)>(
                r#"
                INSERT INTO urls (owner_id, short_code, original_url)
                VALUES ($1, $2, $3)
                ON CONFLICT (original_url)
                DO UPDATE SET original_url = urls.original_url
                RETURNING short_code, (xmax = 0) AS inserted
                "#,
            )
            .bind(owner_id)
            .bind(&code)
            .bind(original_url)
            .fetch_one(&mut *tx)
            .await;

            match result {
                Ok((stored_code, inserted)) => {
                    tx.commit()
                        .await
                        .map_err(|e| map_sqlx_error("create_short_url", e))?;

                    if !inserted {
                        metrics::counter!("shortener_duplicates_total").increment(1);
                        return Err(StoreError::duplicate(format!("{url_base}{stored_code}")));
                    }

                    metrics::counter!("shortener_urls_created_total").increment(1);
                    debug!(owner_id, code = %stored_code, "Created short URL");
                    return Ok(format!("{url_base}{stored_code}"));
                }
                Err(e) if is_unique_violation_on_code(&e) => {
                    tx.rollback()
                        .await
                        .map_err(|e| map_sqlx_error("create_short_url", e))?;
                    metrics::counter!("shortener_code_collisions_total").increment(1);
                    debug!(attempt, code = %code, "Short code collision, regenerating");
                }
                Err(e) => return Err(map_sqlx_error("create_short_url", e)),
            }
        }

        error!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Failed to generate unique short code"
        );
        Err(StoreError::internal(
            "failed to generate unique short code: too many collisions",
        ))
    }

    async fn batch_create_short_url(
        &self,
        owner_id: &str,
        url_base: &str,
        items: Vec<BatchRequest>,
    ) -> StoreResult<Vec<BatchResponse>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let urls: Vec<String> = items.iter().map(|i| i.original_url.clone()).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("batch_create_short_url", e))?;

        let stored: HashMap<String, String> = sqlx::query_as::<_, (String, String)>(
            "SELECT original_url, short_code FROM urls WHERE original_url = ANY($1)",
        )
        .bind(&urls)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("batch_create_short_url", e))?
        .into_iter()
        .collect();

        // The first offending item in input order decides the payload.
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if let Some(code) = stored.get(&item.original_url) {
                metrics::counter!("shortener_duplicates_total").increment(1);
                return Err(StoreError::duplicate(format!("{url_base}{code}")));
            }
            if !seen.insert(item.original_url.as_str()) {
                return Err(StoreError::Duplicate { short_url: None });
            }
        }

        let mut responses = Vec::with_capacity(items.len());
        for chunk in items.chunks(BATCH_CHUNK_SIZE) {
            let codes = self.insert_chunk(&mut tx, owner_id, chunk).await?;
            responses.extend(chunk.iter().zip(codes).map(|(item, code)| BatchResponse {
                correlation_id: item.correlation_id.clone(),
                short_url: format!("{url_base}{code}"),
            }));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("batch_create_short_url", e))?;

        metrics::counter!("shortener_urls_created_total").increment(responses.len() as u64);
        debug!(owner_id, count = responses.len(), "Created short URLs in batch");

        Ok(responses)
    }

    async fn get_long_url(&self, short_code: &str) -> StoreResult<String> {
        let row = sqlx::query_as::<_, (String, bool)>(
            "SELECT original_url, deleted FROM urls WHERE short_code = $1",
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("get_long_url", e))?;

        match row {
            None => Err(StoreError::NotFound),
            Some((_, true)) => Err(StoreError::Gone),
            Some((original_url, false)) => Ok(original_url),
        }
    }

    async fn get_user_urls(&self, owner_id: &str) -> StoreResult<Vec<UrlPair>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT short_code, original_url
            FROM urls
            WHERE owner_id = $1 AND NOT deleted
            ORDER BY short_code
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("get_user_urls", e))?;

        Ok(rows
            .into_iter()
            .map(|(short_code, original_url)| UrlPair {
                short_code,
                original_url,
            })
            .collect())
    }

    async fn delete_urls(&self, owner_id: &str, short_codes: &[String]) -> StoreResult<()> {
        let requested: Vec<String> = short_codes
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if requested.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_urls", e))?;

        let result = sqlx::query(
            "UPDATE urls SET deleted = TRUE WHERE owner_id = $1 AND short_code = ANY($2)",
        )
        .bind(owner_id)
        .bind(&requested)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_urls", e))?;

        if result.rows_affected() < requested.len() as u64 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("delete_urls", e))?;
            debug!(
                owner_id,
                requested = requested.len(),
                owned = result.rows_affected(),
                "Delete rejected: codes not owned by caller"
            );
            return Err(StoreError::UserMismatch);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_urls", e))?;

        debug!(owner_id, count = requested.len(), "Soft-deleted short URLs");
        Ok(())
    }

    async fn get_stats(&self) -> StoreResult<StorageStats> {
        let (urls, users) =
            sqlx::query_as::<_, (i64, i64)>("SELECT COUNT(*), COUNT(DISTINCT owner_id) FROM urls")
                .fetch_one(self.pool.as_ref())
                .await
                .map_err(|e| map_sqlx_error("get_stats", e))?;

        Ok(StorageStats {
            urls: urls.max(0) as u64,
            users: users.max(0) as u64,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;

        conn.ping().await.map_err(|e| map_sqlx_error("ping", e))
    }

    async fn offload_storage(&self, _path: &Path) -> StoreResult<()> {
        Ok(())
    }
}
