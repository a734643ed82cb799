//! On-disk cache for lead payloads.
//!
//! Holds the last delivered submission and, after a total delivery failure,
//! one pending entry per undelivered lead awaiting a manual retry. Each key
//! is one JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studio_core::error::StoreErrorCode;
use studio_core::{Error, Result};
use tracing::debug;
use uuid::Uuid;

use crate::payload::LeadPayload;

/// Prefix shared by every undelivered submission.
pub const PENDING_SUBMISSION: &str = "pending_submission";

/// Most recent delivered submission.
pub const LAST_SUBMISSION: &str = "last_submission";

/// Key for a new pending entry. Keys sort by the time they were parked.
pub fn pending_key(at: DateTime<Utc>) -> String {
    format!(
        "{}_{:013}_{}",
        PENDING_SUBMISSION,
        at.timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// A cached payload with the time it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub payload: LeadPayload,
    pub stored_at: DateTime<Utc>,
}

/// Directory-backed key/value cache.
#[derive(Debug, Clone)]
pub struct PendingCache {
    dir: PathBuf,
}

fn store_error(action: &str, path: &Path, err: std::io::Error) -> Error {
    Error::store(
        StoreErrorCode::StoreFailed,
        format!("failed to {} {}: {}", action, path.display(), err),
    )
}

impl PendingCache {
    /// Open the cache, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| store_error("create", &dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Write `payload` under `key`, replacing any previous entry.
    ///
    /// Each write goes through its own temp file, so concurrent saves of the
    /// same key never collide; the last rename wins.
    pub async fn save(&self, key: &str, payload: &LeadPayload) -> Result<()> {
        let entry = StoredSubmission {
            payload: payload.clone(),
            stored_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&entry)?;

        let path = self.path(key);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| store_error("write", &tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(store_error("rename", &path, e));
        }

        debug!(key = key, path = %path.display(), "Cached lead payload");
        Ok(())
    }

    pub async fn load(&self, key: &str) -> Result<Option<StoredSubmission>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_error("read", &path, e)),
        }
    }

    /// Delete `key`, returning whether an entry existed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(store_error("remove", &path, e)),
        }
    }

    /// Keys starting with `prefix`, oldest first.
    pub async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| store_error("list", &self.dir, e))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| store_error("list", &self.dir, e))?
        {
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Check whether the directory accepts writes.
    pub async fn is_writable(&self) -> bool {
        let marker = self.dir.join(".write_check");
        match tokio::fs::write(&marker, b"ok").await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&marker).await;
                true
            }
            Err(_) => false,
        }
    }
}
