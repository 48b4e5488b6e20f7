//! In-memory implementation of the URL repository.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, error, info};

use super::snapshot::{SnapshotRecord, read_snapshot, write_snapshot};
use crate::domain::entities::{
    BatchRequest, BatchResponse, ShortUrlRecord, StorageStats, UrlPair,
};
use crate::domain::repositories::UrlRepository;
use crate::error::{StoreError, StoreResult};
use crate::utils::code_generator::{CodeSource, MAX_GENERATION_ATTEMPTS, default_code_source};

/// The three indexes, always mutated together under one lock.
#[derive(Debug, Default)]
struct MemoryState {
    /// short code -> record
    by_code: HashMap<String, ShortUrlRecord>,
    /// original URL -> short code
    by_url: HashMap<String, String>,
    /// owner -> (short code -> original URL)
    by_owner: HashMap<String, HashMap<String, String>>,
}

impl MemoryState {
    fn insert(&mut self, owner_id: &str, short_code: String, original_url: String, deleted: bool) {
        self.by_url.insert(original_url.clone(), short_code.clone());
        self.by_owner
            .entry(owner_id.to_owned())
            .or_default()
            .insert(short_code.clone(), original_url.clone());
        let mut record = ShortUrlRecord::new(short_code.clone(), original_url, owner_id.to_owned());
        record.deleted = deleted;
        self.by_code.insert(short_code, record);
    }

    fn is_owned_by(&self, short_code: &str, owner_id: &str) -> bool {
        self.by_code
            .get(short_code)
            .is_some_and(|record| record.is_owned_by(owner_id))
    }

    fn snapshot(&self) -> Vec<SnapshotRecord> {
        let mut records: Vec<SnapshotRecord> = self
            .by_owner
            .iter()
            .flat_map(|(owner_id, codes)| {
                codes.iter().map(move |(short_code, original_url)| SnapshotRecord {
                    owner_id: owner_id.clone(),
                    short_code: short_code.clone(),
                    original_url: original_url.clone(),
                    deleted: self.by_code.get(short_code).is_some_and(|r| !r.is_active()),
                })
            })
            .collect();
        records.sort_by(|a, b| a.short_code.cmp(&b.short_code));
        records
    }
}

/// In-memory repository guarded by a single reader/writer lock.
///
/// Every mutation takes the write lock, so writers are fully serialized against
/// each other and against readers. The lock is never held across an `.await`.
///
/// State survives restarts only through the snapshot file: see [`Self::load`]
/// and [`UrlRepository::offload_storage`].
pub struct MemoryUrlRepository {
    state: RwLock<MemoryState>,
    generate: CodeSource,
}

impl MemoryUrlRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            generate: default_code_source(),
        }
    }

    /// Creates a repository populated from the snapshot at `path`.
    ///
    /// A missing, empty, or malformed file yields an empty repository.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if the file exists but cannot be read.
    pub async fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let records = read_snapshot(path).await?;

        let repository = Self::new();
        {
            let mut state = repository.state.write();
            for record in records {
                state.insert(
                    &record.owner_id,
                    record.short_code,
                    record.original_url,
                    record.deleted,
                );
            }
            info!(
                path = %path.display(),
                urls = state.by_code.len(),
                "Loaded snapshot"
            );
        }

        Ok(repository)
    }

    /// Replaces the code generator.
    pub fn with_code_source(mut self, generate: CodeSource) -> Self {
        self.generate = generate;
        self
    }

    /// Picks a code that is neither stored nor reserved by the current call.
    fn fresh_code(&self, state: &MemoryState, reserved: &HashSet<String>) -> StoreResult<String> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = (self.generate)();
            if !state.by_code.contains_key(&code) && !reserved.contains(&code) {
                return Ok(code);
            }
            metrics::counter!("shortener_code_collisions_total").increment(1);
            debug!(attempt, code = %code, "Short code collision, regenerating");
        }

        error!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Failed to generate unique short code"
        );
        Err(StoreError::internal(
            "failed to generate unique short code: too many collisions",
        ))
    }
}

impl Default for MemoryUrlRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlRepository for MemoryUrlRepository {
    async fn create_short_url(
        &self,
        owner_id: &str,
        url_base: &str,
        original_url: &str,
    ) -> StoreResult<String> {
        let mut state = self.state.write();

        if let Some(existing) = state.by_url.get(original_url) {
            metrics::counter!("shortener_duplicates_total").increment(1);
            return Err(StoreError::duplicate(format!("{url_base}{existing}")));
        }

        let code = self.fresh_code(&state, &HashSet::new())?;
        state.insert(owner_id, code.clone(), original_url.to_owned(), false);

        metrics::counter!("shortener_urls_created_total").increment(1);
        debug!(owner_id, code = %code, "Created short URL");

        Ok(format!("{url_base}{code}"))
    }

    async fn batch_create_short_url(
        &self,
        owner_id: &str,
        url_base: &str,
        items: Vec<BatchRequest>,
    ) -> StoreResult<Vec<BatchResponse>> {
        let mut state = self.state.write();

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if let Some(existing) = state.by_url.get(&item.original_url) {
                metrics::counter!("shortener_duplicates_total").increment(1);
                return Err(StoreError::duplicate(format!("{url_base}{existing}")));
            }
            if !seen.insert(item.original_url.as_str()) {
                return Err(StoreError::Duplicate { short_url: None });
            }
        }

        // Reserve every code before touching the maps so a failure leaves them unchanged.
        let mut reserved = HashSet::with_capacity(items.len());
        let mut codes = Vec::with_capacity(items.len());
        for _ in &items {
            let code = self.fresh_code(&state, &reserved)?;
            reserved.insert(code.clone());
            codes.push(code);
        }

        let mut responses = Vec::with_capacity(items.len());
        for (item, code) in items.into_iter().zip(codes) {
            responses.push(BatchResponse {
                correlation_id: item.correlation_id,
                short_url: format!("{url_base}{code}"),
            });
            state.insert(owner_id, code, item.original_url, false);
        }

        metrics::counter!("shortener_urls_created_total").increment(responses.len() as u64);
        debug!(owner_id, count = responses.len(), "Created short URLs in batch");

        Ok(responses)
    }

    async fn get_long_url(&self, short_code: &str) -> StoreResult<String> {
        let state = self.state.read();

        match state.by_code.get(short_code) {
            None => Err(StoreError::NotFound),
            Some(record) if !record.is_active() => Err(StoreError::Gone),
            Some(record) => Ok(record.original_url.clone()),
        }
    }

    async fn get_user_urls(&self, owner_id: &str) -> StoreResult<Vec<UrlPair>> {
        let state = self.state.read();

        let Some(codes) = state.by_owner.get(owner_id) else {
            return Ok(Vec::new());
        };

        let mut pairs: Vec<UrlPair> = codes
            .iter()
            .filter(|(code, _)| state.by_code.get(*code).is_some_and(ShortUrlRecord::is_active))
            .map(|(code, url)| UrlPair {
                short_code: code.clone(),
                original_url: url.clone(),
            })
            .collect();
        pairs.sort_by(|a, b| a.short_code.cmp(&b.short_code));

        Ok(pairs)
    }

    async fn delete_urls(&self, owner_id: &str, short_codes: &[String]) -> StoreResult<()> {
        let requested: BTreeSet<&str> = short_codes.iter().map(String::as_str).collect();
        if requested.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();

        if let Some(foreign) = requested
            .iter()
            .find(|code| !state.is_owned_by(code, owner_id))
        {
            debug!(owner_id, code = %foreign, "Delete rejected: code not owned by caller");
            return Err(StoreError::UserMismatch);
        }

        for code in &requested {
            if let Some(record) = state.by_code.get_mut(*code) {
                record.deleted = true;
            }
        }

        debug!(owner_id, count = requested.len(), "Soft-deleted short URLs");
        Ok(())
    }

    async fn get_stats(&self) -> StoreResult<StorageStats> {
        let state = self.state.read();

        Ok(StorageStats {
            urls: state.by_code.len() as u64,
            users: state.by_owner.len() as u64,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn offload_storage(&self, path: &Path) -> StoreResult<()> {
        let records = self.state.read().snapshot();

        write_snapshot(path, &records).await?;

        info!(path = %path.display(), urls = records.len(), "Offloaded snapshot");
        Ok(())
    }
}
