// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strategy-driven cache in front of a [`SecretSource`].
//!
//! | Strategy   | fresh        | stale               | absent              |
//! |------------|--------------|---------------------|---------------------|
//! | BatchMode  | serve stored | serve stored        | empty               |
//! | LiveUpdate | serve stored | fetch, store, serve | fetch, store, serve |
//!
//! Batch mode expects an external scheduler to call [`CacheOrchestrator::update`].

use std::sync::Arc;
use std::time::Duration;

use keyslot_core::{
    is_expired, CacheRecord, KeyslotError, LastUpdate, SecretSource, StorageBackend,
    StrategyMode,
};
use tracing::{debug, info, warn};

/// Source of "now" in unix seconds.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    chrono::Utc::now().timestamp()
}

pub struct CacheOrchestrator {
    backend: Arc<dyn StorageBackend>,
    source: Arc<dyn SecretSource>,
    key: String,
    ttl: Duration,
    strategy: StrategyMode,
    clock: Clock,
}

impl CacheOrchestrator {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        source: Arc<dyn SecretSource>,
        key: impl Into<String>,
        ttl: Duration,
        strategy: StrategyMode,
    ) -> Self {
        Self {
            backend,
            source,
            key: key.into(),
            ttl,
            strategy,
            clock: system_clock,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn strategy(&self) -> StrategyMode {
        self.strategy
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Return the payload according to the configured strategy.
    ///
    /// `Ok(None)` means nothing is stored yet (batch mode) or the approval
    /// window closed without an answer (live update).
    pub async fn get(&self) -> Result<Option<serde_json::Value>, KeyslotError> {
        match self.strategy {
            StrategyMode::BatchMode => Ok(self.read_soft().await.map(|r| r.payload)),
            StrategyMode::LiveUpdate => {
                let last = self.last_update_soft().await;
                if last.created_at == 0 {
                    debug!(key = %self.key, "no cache record, fetching");
                    return self.update().await;
                }
                if last.is_expired(self.ttl, (self.clock)()) {
                    debug!(key = %self.key, created = last.created_at, "cache record stale, fetching");
                    return self.update().await;
                }

                let record = match last.record {
                    Some(record) => Some(record),
                    None => self.read_soft().await,
                };
                match record {
                    Some(record) => Ok(Some(record.payload)),
                    // Vanished between the timestamp lookup and the read.
                    None => self.update().await,
                }
            }
        }
    }

    /// Fetch from the source unconditionally and store the result.
    ///
    /// A source that yields nothing leaves the stored record untouched and
    /// returns `Ok(None)`.
    pub async fn update(&self) -> Result<Option<serde_json::Value>, KeyslotError> {
        let Some(bytes) = self.source.fetch_value().await? else {
            info!(key = %self.key, "no value received, cache left unchanged");
            return Ok(None);
        };

        let payload: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| KeyslotError::CacheWrite {
                message: format!("retrieved value is not valid JSON: {e}"),
                source: Some(Box::new(e)),
            })?;

        let record = CacheRecord::new((self.clock)(), payload);
        self.backend.write(&self.key, &record).await?;
        info!(
            key = %self.key,
            backend = self.backend.name(),
            created = record.created_at,
            "cache refreshed"
        );
        Ok(Some(record.payload))
    }

    /// Creation time of the stored record in unix seconds, 0 when absent.
    pub async fn last_update(&self) -> Result<i64, KeyslotError> {
        Ok(self.backend.last_update(&self.key).await?.created_at)
    }

    /// Whether a record created at `created_at` is past the TTL now.
    pub fn is_stale(&self, created_at: i64) -> bool {
        is_expired(created_at, self.ttl, (self.clock)())
    }

    async fn read_soft(&self) -> Option<CacheRecord> {
        match self.backend.read(&self.key).await {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %self.key, error = %e, "cache read failed, treating as absent");
                None
            }
        }
    }

    async fn last_update_soft(&self) -> LastUpdate {
        match self.backend.last_update(&self.key).await {
            Ok(last) => last,
            Err(e) => {
                warn!(key = %self.key, error = %e, "cache read failed, treating as absent");
                LastUpdate::default()
            }
        }
    }
}

impl std::fmt::Debug for CacheOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheOrchestrator")
            .field("backend", &self.backend.name())
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use keyslot_test_utils::{CountingSource, MemoryBackend};
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    const NOW: i64 = 1_700_000_000;
    const TTL: Duration = Duration::from_secs(3600);

    fn fixed_clock() -> i64 {
        NOW
    }

    fn orchestrator(
        backend: &MemoryBackend,
        source: &CountingSource,
        strategy: StrategyMode,
    ) -> CacheOrchestrator {
        CacheOrchestrator::new(
            Arc::new(backend.clone()),
            Arc::new(source.clone()),
            "slot",
            TTL,
            strategy,
        )
        .with_clock(fixed_clock)
    }

    fn fresh() -> CacheRecord {
        CacheRecord::new(NOW - 10, json!({"v": "stored"}))
    }

    fn stale() -> CacheRecord {
        CacheRecord::new(NOW - 3601, json!({"v": "stored"}))
    }

    #[tokio::test]
    async fn batch_mode_serves_stored_without_calling_source() {
        for record in [fresh(), stale()] {
            let backend = MemoryBackend::with_record("slot", record).await;
            let source = CountingSource::returning(r#"{"v":"fetched"}"#);
            let value = orchestrator(&backend, &source, StrategyMode::BatchMode)
                .get()
                .await
                .unwrap();
            assert_eq!(value, Some(json!({"v": "stored"})));
            assert_eq!(source.calls(), 0);
        }
    }

    #[tokio::test]
    async fn batch_mode_absent_is_empty() {
        let backend = MemoryBackend::new();
        let source = CountingSource::returning(r#"{"v":"fetched"}"#);
        let value = orchestrator(&backend, &source, StrategyMode::BatchMode)
            .get()
            .await
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(source.calls(), 0);
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn live_update_fresh_record_is_served_with_one_read() {
        let backend = MemoryBackend::with_record("slot", fresh()).await;
        let source = CountingSource::returning(r#"{"v":"fetched"}"#);
        let value = orchestrator(&backend, &source, StrategyMode::LiveUpdate)
            .get()
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"v": "stored"})));
        assert_eq!(source.calls(), 0);
        assert_eq!(backend.read_count(), 1);
    }

    #[tokio::test]
    async fn live_update_stale_record_is_refreshed() {
        let backend = MemoryBackend::with_record("slot", stale()).await;
        let source = CountingSource::returning(r#"{"v":"fetched"}"#);
        let value = orchestrator(&backend, &source, StrategyMode::LiveUpdate)
            .get()
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"v": "fetched"})));
        assert_eq!(source.calls(), 1);

        let stored = backend.get("slot").await.unwrap();
        assert_eq!(stored.created_at, NOW);
        assert_eq!(stored.payload, json!({"v": "fetched"}));
    }

    #[tokio::test]
    async fn live_update_absent_record_is_fetched() {
        let backend = MemoryBackend::new();
        let source = CountingSource::returning("[1,2]");
        let value = orchestrator(&backend, &source, StrategyMode::LiveUpdate)
            .get()
            .await
            .unwrap();
        assert_eq!(value, Some(json!([1, 2])));
        assert_eq!(source.calls(), 1);
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn ttl_boundary_is_still_fresh() {
        let backend =
            MemoryBackend::with_record("slot", CacheRecord::new(NOW - 3600, json!(1))).await;
        let source = CountingSource::returning("2");
        let value = orchestrator(&backend, &source, StrategyMode::LiveUpdate)
            .get()
            .await
            .unwrap();
        assert_eq!(value, Some(json!(1)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn read_failure_counts_as_absent() {
        let backend = MemoryBackend::with_record("slot", fresh()).await;
        backend.set_fail_reads(true);
        let source = CountingSource::returning(r#"{"v":"fetched"}"#);

        let batch = orchestrator(&backend, &source, StrategyMode::BatchMode)
            .get()
            .await
            .unwrap();
        assert_eq!(batch, None);

        let live = orchestrator(&backend, &source, StrategyMode::LiveUpdate)
            .get()
            .await
            .unwrap();
        assert_eq!(live, Some(json!({"v": "fetched"})));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn read_failure_is_logged() {
        let backend = MemoryBackend::new();
        backend.set_fail_reads(true);
        let source = CountingSource::pending();
        orchestrator(&backend, &source, StrategyMode::BatchMode)
            .get()
            .await
            .unwrap();
        assert!(logs_contain("cache read failed, treating as absent"));
    }

    #[tokio::test]
    async fn update_with_pending_source_writes_nothing() {
        let backend = MemoryBackend::with_record("slot", stale()).await;
        let source = CountingSource::pending();
        let value = orchestrator(&backend, &source, StrategyMode::BatchMode)
            .update()
            .await
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(backend.write_count(), 0);
        assert_eq!(backend.get("slot").await, Some(stale()));
    }

    #[tokio::test]
    async fn update_rejects_non_json_and_keeps_previous_record() {
        let backend = MemoryBackend::with_record("slot", stale()).await;
        let source = CountingSource::returning("caf\u{e9}".as_bytes().to_vec());
        let err = orchestrator(&backend, &source, StrategyMode::BatchMode)
            .update()
            .await
            .unwrap_err();
        assert!(matches!(err, KeyslotError::CacheWrite { .. }), "got {err:?}");
        assert_eq!(backend.write_count(), 0);
        assert_eq!(backend.get("slot").await, Some(stale()));
    }

    #[tokio::test]
    async fn write_failure_is_hard() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        let source = CountingSource::returning("{}");
        let err = orchestrator(&backend, &source, StrategyMode::LiveUpdate)
            .get()
            .await
            .unwrap_err();
        assert!(matches!(err, KeyslotError::CacheWrite { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn source_errors_propagate() {
        let backend = MemoryBackend::new();
        let source = CountingSource::pending();
        source.push(Err(KeyslotError::AuthenticationFailure)).await;
        let err = orchestrator(&backend, &source, StrategyMode::LiveUpdate)
            .get()
            .await
            .unwrap_err();
        assert!(matches!(err, KeyslotError::AuthenticationFailure), "got {err:?}");
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn last_update_and_staleness() {
        let backend = MemoryBackend::new();
        let source = CountingSource::returning("{}");
        let cache = orchestrator(&backend, &source, StrategyMode::BatchMode);
        assert_eq!(cache.last_update().await.unwrap(), 0);
        assert!(cache.is_stale(0));

        cache.update().await.unwrap();
        let created = cache.last_update().await.unwrap();
        assert_eq!(created, NOW);
        assert!(!cache.is_stale(created));
        assert!(cache.is_stale(NOW - 3601));
    }
}
