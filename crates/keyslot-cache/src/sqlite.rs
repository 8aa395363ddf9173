// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite storage backend.
//!
//! Records live in the `cache_records` table. Every write is a single
//! `INSERT OR REPLACE`, so concurrent writers from other processes resolve
//! as last-writer-wins. All statements run on tokio-rusqlite's background
//! thread.

use std::path::Path;

use async_trait::async_trait;
use keyslot_core::{CacheRecord, KeyslotError, LastUpdate, StorageBackend};
use rusqlite::OptionalExtension;
use tracing::debug;

use crate::migrations::run_migrations;

pub struct SqliteBackend {
    conn: tokio_rusqlite::Connection,
}

impl SqliteBackend {
    /// Open (or create) the database at `path` and apply migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, KeyslotError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| KeyslotError::CacheWrite {
                    message: format!("failed to create {}: {e}", parent.display()),
                    source: Some(Box::new(e)),
                })?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| KeyslotError::cache_read(format!("failed to open {}: {e}", path.display())))?;
        let backend = Self::prepare(conn).await?;
        debug!(path = %path.display(), "SQLite cache opened");
        Ok(backend)
    }

    /// Private in-memory database, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, KeyslotError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| KeyslotError::cache_read(format!("failed to open in-memory database: {e}")))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: tokio_rusqlite::Connection) -> Result<Self, KeyslotError> {
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
            Ok(())
        })
        .await
        .map_err(|e| map_tr_err("failed to configure database", e))?;

        conn.call(|conn| -> Result<(), refinery::Error> { run_migrations(conn) })
            .await
            .map_err(|e: tokio_rusqlite::Error<refinery::Error>| {
                KeyslotError::cache_write(format!("failed to migrate cache database: {e}"))
            })?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn read(&self, key: &str) -> Result<Option<CacheRecord>, KeyslotError> {
        let key = key.to_string();
        let row = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT created_at, payload FROM cache_records WHERE key = ?1",
                    rusqlite::params![key],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| {
                KeyslotError::cache_read(format!("failed to read cache record: {e}"))
            })?;

        let Some((created_at, payload)) = row else {
            return Ok(None);
        };
        let payload = serde_json::from_str(&payload).map_err(|e| KeyslotError::CacheRead {
            message: format!("stored payload is not JSON: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Some(CacheRecord::new(created_at, payload)))
    }

    async fn write(&self, key: &str, record: &CacheRecord) -> Result<(), KeyslotError> {
        let key = key.to_string();
        let created_at = record.created_at;
        let payload = serde_json::to_string(&record.payload).map_err(|e| KeyslotError::CacheWrite {
            message: format!("failed to encode payload: {e}"),
            source: Some(Box::new(e)),
        })?;

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO cache_records (key, created_at, payload) \
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![key, created_at, payload],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| map_tr_err("failed to write cache record", e))
    }

    /// Timestamp-only query; the payload is not loaded.
    async fn last_update(&self, key: &str) -> Result<LastUpdate, KeyslotError> {
        let key = key.to_string();
        let created_at = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT created_at FROM cache_records WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get::<_, i64>(0),
                )
                .optional()
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| {
                KeyslotError::cache_read(format!("failed to read cache timestamp: {e}"))
            })?;
        Ok(LastUpdate::timestamp(created_at.unwrap_or(0)))
    }
}

fn map_tr_err(context: &str, e: tokio_rusqlite::Error<rusqlite::Error>) -> KeyslotError {
    KeyslotError::cache_write(format!("{context}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_none() {
        let backend = SqliteBackend::open_in_memory().await.unwrap();
        assert!(backend.read("absent").await.unwrap().is_none());
        assert_eq!(backend.last_update("absent").await.unwrap().created_at, 0);
    }

    #[tokio::test]
    async fn write_then_read() {
        let backend = SqliteBackend::open_in_memory().await.unwrap();
        let record = CacheRecord::new(1_700_000_000, serde_json::json!({"db": "secret"}));
        backend.write("k", &record).await.unwrap();

        assert_eq!(backend.read("k").await.unwrap(), Some(record));
        let last = backend.last_update("k").await.unwrap();
        assert_eq!(last.created_at, 1_700_000_000);
        assert!(last.record.is_none());
    }

    #[tokio::test]
    async fn write_replaces_previous_record() {
        let backend = SqliteBackend::open_in_memory().await.unwrap();
        backend
            .write("k", &CacheRecord::new(1, serde_json::json!(1)))
            .await
            .unwrap();
        backend
            .write("k", &CacheRecord::new(2, serde_json::json!(2)))
            .await
            .unwrap();

        let record = backend.read("k").await.unwrap().unwrap();
        assert_eq!(record.created_at, 2);
        assert_eq!(record.payload, serde_json::json!(2));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let backend = SqliteBackend::open_in_memory().await.unwrap();
        backend
            .write("a", &CacheRecord::new(1, serde_json::json!("a")))
            .await
            .unwrap();
        assert!(backend.read("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn database_file_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let backend = SqliteBackend::open(&path).await.unwrap();
            backend
                .write("k", &CacheRecord::new(42, serde_json::json!({"x": 1})))
                .await
                .unwrap();
        }

        let reopened = SqliteBackend::open(&path).await.unwrap();
        let record = reopened.read("k").await.unwrap().unwrap();
        assert_eq!(record.created_at, 42);
        assert_eq!(record.payload["x"], 1);
    }
}
