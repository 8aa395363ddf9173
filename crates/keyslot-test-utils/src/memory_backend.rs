// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage backend with failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use keyslot_core::{CacheRecord, KeyslotError, StorageBackend};

/// A `StorageBackend` backed by a `HashMap`.
///
/// Reads and writes can be made to fail, and every call is counted.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    records: Arc<Mutex<HashMap<String, CacheRecord>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-loaded with one record.
    pub async fn with_record(key: &str, record: CacheRecord) -> Self {
        let backend = Self::new();
        backend.insert(key, record).await;
        backend
    }

    /// Store a record without counting a write.
    pub async fn insert(&self, key: &str, record: CacheRecord) {
        self.records.lock().await.insert(key.to_string(), record);
    }

    pub async fn get(&self, key: &str) -> Option<CacheRecord> {
        self.records.lock().await.get(key).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self, key: &str) -> Result<Option<CacheRecord>, KeyslotError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KeyslotError::cache_read("injected read failure"));
        }
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, record: &CacheRecord) -> Result<(), KeyslotError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KeyslotError::cache_write("injected write failure"));
        }
        self.records
            .lock()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }
}
