// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the retrieve-decrypt-cache pipeline.
//!
//! Each test wires a real `SlotClient` over a scripted fetcher into a
//! `CacheOrchestrator` backed by an on-disk store in a temp directory.

use std::sync::Arc;
use std::time::Duration;

use keyslot_cache::{CacheOrchestrator, FileBackend, SqliteBackend};
use keyslot_client::{Credentials, SlotClient};
use keyslot_core::{StorageBackend, StrategyMode};
use keyslot_crypto::KdfChain;
use keyslot_test_utils::{cheap_params, MockFetcher, SlotFixture};
use secrecy::SecretString;

const BASE: &str = "https://vault.test/api/v1/user/slots/";
const VALUE: &str = r#"{"db":{"user":"app","pass":"s3cret"}}"#;

fn client(fetcher: &MockFetcher) -> SlotClient {
    SlotClient::new(
        Arc::new(fetcher.clone()),
        Credentials::new("slot-1", SecretString::from("pw".to_string())),
    )
    .with_base_url(BASE)
    .with_kdf(KdfChain::standard(None))
    .with_scrypt_params(cheap_params())
}

fn cache(
    backend: Arc<dyn StorageBackend>,
    fetcher: &MockFetcher,
    strategy: StrategyMode,
) -> CacheOrchestrator {
    CacheOrchestrator::new(
        backend,
        Arc::new(client(fetcher)),
        "slot-1",
        Duration::from_secs(3600),
        strategy,
    )
}

// ---- Live update ----

#[tokio::test]
async fn live_update_fetches_once_then_serves_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = SlotFixture::new("pw", VALUE);
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let cache = cache(
        Arc::new(FileBackend::new(dir.path())),
        &fetcher,
        StrategyMode::LiveUpdate,
    );

    let first = cache.get().await.unwrap().unwrap();
    assert_eq!(first["db"]["pass"], "s3cret");
    let second = cache.get().await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(fetcher.call_count().await, 1);

    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("slot-1.json")).unwrap()).unwrap();
    assert_eq!(on_disk["value"], first);
    assert!(on_disk["created"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn live_update_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = SlotFixture::new("pw", "[1,2,3]");
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let backend = SqliteBackend::open(dir.path().join("cache.db")).await.unwrap();
    let cache = cache(Arc::new(backend), &fetcher, StrategyMode::LiveUpdate);

    assert_eq!(cache.get().await.unwrap(), Some(serde_json::json!([1, 2, 3])));
    assert!(cache.last_update().await.unwrap() > 0);
    assert_eq!(cache.get().await.unwrap(), Some(serde_json::json!([1, 2, 3])));
    assert_eq!(fetcher.call_count().await, 1);
}

// ---- Batch mode ----

#[tokio::test]
async fn batch_mode_serves_only_what_update_stored() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = SlotFixture::new("pw", VALUE);
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let cache = cache(
        Arc::new(FileBackend::new(dir.path())),
        &fetcher,
        StrategyMode::BatchMode,
    );

    assert_eq!(cache.get().await.unwrap(), None);
    assert_eq!(fetcher.call_count().await, 0);

    let updated = cache.update().await.unwrap();
    assert!(updated.is_some());
    assert_eq!(cache.get().await.unwrap(), updated);
    assert_eq!(fetcher.call_count().await, 1);
}

// ---- Approval ----

#[tokio::test(start_paused = true)]
async fn expired_approval_leaves_cache_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MockFetcher::new();
    fetcher.push_approval_request("r1", 30).await;
    fetcher.push_pending(20).await;

    let cache = cache(
        Arc::new(FileBackend::new(dir.path())),
        &fetcher,
        StrategyMode::LiveUpdate,
    );

    assert_eq!(cache.get().await.unwrap(), None);
    assert_eq!(cache.last_update().await.unwrap(), 0);
    assert!(!dir.path().join("slot-1.json").exists());
}

#[tokio::test(start_paused = true)]
async fn approved_after_pending_checks_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = SlotFixture::new("pw", VALUE);
    let fetcher = MockFetcher::new();
    fetcher.push_approval_request("r1", 60).await;
    fetcher.push_pending(2).await;
    fetcher.push_body(fixture.resolved_body()).await;

    let cache = cache(
        Arc::new(FileBackend::new(dir.path())),
        &fetcher,
        StrategyMode::LiveUpdate,
    );

    let value = cache.get().await.unwrap().unwrap();
    assert_eq!(value["db"]["user"], "app");
    assert_eq!(fetcher.call_count().await, 4);
}

// ---- Failures ----

#[tokio::test]
async fn wrong_password_surfaces_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = SlotFixture::new("other", VALUE);
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let cache = cache(
        Arc::new(FileBackend::new(dir.path())),
        &fetcher,
        StrategyMode::LiveUpdate,
    );

    let err = cache.get().await.unwrap_err();
    assert!(
        matches!(err, keyslot_core::KeyslotError::AuthenticationFailure),
        "got {err:?}"
    );
    assert!(!dir.path().join("slot-1.json").exists());
}

#[tokio::test]
async fn non_ascii_value_fails_to_decode_in_legacy_mode() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = SlotFixture::new("pw", "{\"name\":\"caf\u{e9}\"}");
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let cache = cache(
        Arc::new(FileBackend::new(dir.path())),
        &fetcher,
        StrategyMode::LiveUpdate,
    );

    let err = cache.get().await.unwrap_err();
    assert!(
        matches!(err, keyslot_core::KeyslotError::CacheWrite { .. }),
        "got {err:?}"
    );
}
