// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local caching of retrieved slot values.
//!
//! [`CacheOrchestrator`] decides between serving a stored record and asking
//! its [`SecretSource`](keyslot_core::SecretSource) for a fresh one. Records
//! are persisted by a [`StorageBackend`]: one JSON file per key
//! ([`FileBackend`]) or a WAL-mode SQLite table ([`SqliteBackend`]).

pub mod file;
pub mod migrations;
pub mod orchestrator;
pub mod sqlite;

use std::sync::Arc;

use keyslot_config::model::{CacheBackendKind, CacheConfig};
use keyslot_core::{KeyslotError, StorageBackend};

pub use file::FileBackend;
pub use orchestrator::{CacheOrchestrator, Clock};
pub use sqlite::SqliteBackend;

/// Open the backend selected by `[cache]`.
pub async fn open_backend(config: &CacheConfig) -> Result<Arc<dyn StorageBackend>, KeyslotError> {
    match config.backend {
        CacheBackendKind::File => Ok(Arc::new(FileBackend::new(&config.path))),
        CacheBackendKind::Sqlite => Ok(Arc::new(SqliteBackend::open(&config.path).await?)),
    }
}
