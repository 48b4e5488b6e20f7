//! JSON snapshot file used by the in-memory backend.
//!
//! The file holds a JSON array of records:
//!
//! ```json
//! [
//!   { "owner_id": "u1", "short_code": "ab12Cd", "original_url": "https://example.com" },
//!   { "owner_id": "u1", "short_code": "Xy98Zw", "original_url": "https://rust-lang.org", "deleted": true }
//! ]
//! ```
//!
//! `deleted` is written only for soft-deleted records and defaults to `false`.
//! Files using the `user_id` / `short_url` key names are read as well.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{StoreError, StoreResult};

/// One record of the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(alias = "user_id")]
    pub owner_id: String,
    #[serde(alias = "short_url")]
    pub short_code: String,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Reads a snapshot file.
///
/// A missing file yields no records. Empty content also yields no records and
/// is logged as a warning. Malformed content is moved to a `.malformed` sibling
/// before returning no records, so a later write cannot destroy it.
///
/// # Errors
///
/// Returns [`StoreError::Internal`] if the file exists but cannot be read, or
/// if malformed content cannot be moved aside.
pub async fn read_snapshot(path: &Path) -> StoreResult<Vec<SnapshotRecord>> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "Snapshot file not found, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read snapshot file");
            return Err(StoreError::internal(format!(
                "failed to read snapshot {}",
                path.display()
            )));
        }
    };

    if content.iter().all(u8::is_ascii_whitespace) {
        warn!(path = %path.display(), "Snapshot file is empty, starting empty");
        return Ok(Vec::new());
    }

    match serde_json::from_slice::<Vec<SnapshotRecord>>(&content) {
        Ok(records) => Ok(records),
        Err(e) => {
            let aside = sibling_path(path, ".malformed");
            tokio::fs::rename(path, &aside).await.map_err(|rename_err| {
                error!(
                    path = %path.display(),
                    error = %rename_err,
                    "Failed to move malformed snapshot aside"
                );
                StoreError::internal(format!(
                    "malformed snapshot {} could not be moved aside",
                    path.display()
                ))
            })?;
            warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "Malformed snapshot file moved aside, starting empty"
            );
            Ok(Vec::new())
        }
    }
}

/// Writes a snapshot file, replacing any previous content.
///
/// The JSON is written to a sibling temporary file which is then renamed over
/// `path`, so a crash mid-write leaves the old snapshot intact.
///
/// # Errors
///
/// Returns [`StoreError::Internal`] on encoding or I/O failures.
pub async fn write_snapshot(path: &Path, records: &[SnapshotRecord]) -> StoreResult<()> {
    let json = serde_json::to_vec(records).map_err(|e| {
        error!(error = %e, "Failed to encode snapshot");
        StoreError::internal("failed to encode snapshot")
    })?;

    let tmp_path = sibling_path(path, ".tmp");

    tokio::fs::write(&tmp_path, &json).await.map_err(|e| {
        error!(path = %tmp_path.display(), error = %e, "Failed to write snapshot file");
        StoreError::internal(format!("failed to write snapshot {}", path.display()))
    })?;

    tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to replace snapshot file");
        StoreError::internal(format!("failed to write snapshot {}", path.display()))
    })?;

    Ok(())
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(suffix);
    path.with_file_name(name)
}
