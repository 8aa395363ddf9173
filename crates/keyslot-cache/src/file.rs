// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file storage backend.
//!
//! Each key maps to `<dir>/<key>.json` holding `{"created": .., "value": ..}`.
//! Writes go to a uniquely named temporary sibling that is then renamed over
//! the target, so readers in other processes see either the old or the new
//! record, never a partial one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use keyslot_core::{CacheRecord, KeyslotError, StorageBackend};
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `key`, or `None` when the key is not a
    /// plain file name.
    pub fn record_path(&self, key: &str) -> Option<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return None;
        }
        Some(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    async fn read(&self, key: &str) -> Result<Option<CacheRecord>, KeyslotError> {
        let path = self
            .record_path(key)
            .ok_or_else(|| KeyslotError::cache_read(invalid_key(key)))?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(KeyslotError::CacheRead {
                    message: format!("failed to read {}: {e}", path.display()),
                    source: Some(Box::new(e)),
                });
            }
        };

        let record = serde_json::from_slice(&bytes).map_err(|e| KeyslotError::CacheRead {
            message: format!("{} is not a cache record: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Ok(Some(record))
    }

    async fn write(&self, key: &str, record: &CacheRecord) -> Result<(), KeyslotError> {
        let path = self
            .record_path(key)
            .ok_or_else(|| KeyslotError::cache_write(invalid_key(key)))?;
        let body = serde_json::to_vec(record).map_err(|e| KeyslotError::CacheWrite {
            message: format!("failed to encode cache record: {e}"),
            source: Some(Box::new(e)),
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| write_error(&self.dir, e))?;

        let tmp = self
            .dir
            .join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_and_rename(&tmp, &path, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }

        debug!(path = %path.display(), "cache record written");
        Ok(())
    }
}

async fn write_and_rename(tmp: &Path, path: &Path, body: &[u8]) -> Result<(), KeyslotError> {
    let mut file = tokio::fs::File::create(tmp)
        .await
        .map_err(|e| write_error(tmp, e))?;
    file.write_all(body).await.map_err(|e| write_error(tmp, e))?;
    file.sync_all().await.map_err(|e| write_error(tmp, e))?;
    drop(file);

    tokio::fs::rename(tmp, path)
        .await
        .map_err(|e| write_error(path, e))
}

fn invalid_key(key: &str) -> String {
    format!("cache key {key:?} is not a valid file name")
}

fn write_error(path: &Path, e: std::io::Error) -> KeyslotError {
    KeyslotError::CacheWrite {
        message: format!("failed to write {}: {e}", path.display()),
        source: Some(Box::new(e)),
    }
}
