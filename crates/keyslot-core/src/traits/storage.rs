// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage contract for cache backends (file, SQLite, in-memory).

use async_trait::async_trait;

use crate::error::KeyslotError;
use crate::types::{CacheRecord, LastUpdate};

/// Persists and retrieves timestamped cache records.
///
/// Writes must be atomic: a concurrent reader observes either the previous
/// record or the new one, never a partial write. Concurrent writers race with
/// last-writer-wins semantics.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Read the record stored under `key`, `None` when absent.
    async fn read(&self, key: &str) -> Result<Option<CacheRecord>, KeyslotError>;

    /// Replace the record stored under `key`.
    async fn write(&self, key: &str, record: &CacheRecord) -> Result<(), KeyslotError>;

    /// Creation time of the stored record (0 when absent).
    ///
    /// The default reads the whole record and hands it back inside the
    /// answer, so a caller that goes on to serve it needs no second read.
    async fn last_update(&self, key: &str) -> Result<LastUpdate, KeyslotError> {
        Ok(LastUpdate::from_record(self.read(key).await?))
    }
}
