// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end slot retrieval against sealed fixtures.

use std::sync::Arc;
use std::time::Duration;

use keyslot_client::{Credentials, HttpFetcher, SlotClient};
use keyslot_core::{KeyslotError, SecretSource, ValueEncoding};
use keyslot_crypto::KdfChain;
use keyslot_test_utils::{cheap_params, seal_envelope, MockFetcher, SlotFixture};
use secrecy::SecretString;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "https://vault.test/api/v1/user/slots/";

fn client_for(fetcher: &MockFetcher, password: &str) -> SlotClient {
    SlotClient::new(
        Arc::new(fetcher.clone()),
        Credentials::new("slot-1", SecretString::from(password.to_string())),
    )
    .with_base_url(BASE)
    .with_kdf(KdfChain::standard(None))
    .with_scrypt_params(cheap_params())
}

fn resolved(slot: String, value: String) -> String {
    serde_json::json!({"result": {"slot": slot, "meta": {}, "value": value}}).to_string()
}

#[tokio::test]
async fn known_password_unlocks_known_value() {
    let fixture = SlotFixture::new("correct horse", r#"{"db":{"user":"app","pass":"s3cret"}}"#);
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let value = client_for(&fetcher, "correct horse")
        .get_value()
        .await
        .unwrap()
        .expect("slot is served immediately");
    assert_eq!(&*value, br#"{"db":{"user":"app","pass":"s3cret"}}"#);
}

// Envelopes sealed outside this workspace: password "correct horse", salt
// "salt", slot settings with N = 16. The slot key is bytes 0x20..=0x3f.
const SEALED_SLOT: &str = r#"{"v":1,"scrypt":"c2FsdA==","cipher":"aes","ks":256,"mode":"gcm","ts":128,"iv":"Hy49TFtqeYgHlqW0w9Lh8A==","ct":"OmeIa2am/sVeDXi0H/CvqpxxZTGTuETKQz66wuYl0h2yRar/Ou6EGCJXVLaOOeykUfbzSuChiP1JoZPMXmJ/cX3Je8Hi+7JEC3NG3SttecU="}"#;
const SEALED_VALUE: &str = r#"{"v":1,"cipher":"aes","ks":256,"mode":"gcm","ts":128,"iv":"AQIDBAUGBwgJCgsMDQ4PEA==","ct":"SLDqMhG7lbWFmPZzV4PZOSOIj3I2dBckcFZXP+n8Q/6EfhjstxDMOK/t3fA2vNrejNKT7Ks="}"#;

#[tokio::test]
async fn precomputed_envelopes_unlock_to_known_plaintext() {
    let fetcher = MockFetcher::new();
    fetcher
        .push_body(resolved(SEALED_SLOT.to_string(), SEALED_VALUE.to_string()))
        .await;

    let value = client_for(&fetcher, "correct horse")
        .get_value()
        .await
        .unwrap()
        .expect("slot is served immediately");
    assert_eq!(&*value, br#"{"db":{"user":"app","pass":"s3cret"}}"#);
}

#[tokio::test]
async fn precomputed_envelopes_reject_other_password() {
    let fetcher = MockFetcher::new();
    fetcher
        .push_body(resolved(SEALED_SLOT.to_string(), SEALED_VALUE.to_string()))
        .await;

    let err = client_for(&fetcher, "correct horses")
        .get_value()
        .await
        .unwrap_err();
    assert!(matches!(err, KeyslotError::AuthenticationFailure), "got {err:?}");
}

#[tokio::test]
async fn secret_source_runs_full_retrieval() {
    let fixture = SlotFixture::new("pw", "[1,2,3]");
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let source: Box<dyn SecretSource> = Box::new(client_for(&fetcher, "pw"));
    let value = source.fetch_value().await.unwrap().unwrap();
    assert_eq!(&*value, b"[1,2,3]");
}

#[tokio::test]
async fn wrong_password_fails_authentication() {
    let fixture = SlotFixture::new("right", "{}");
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let err = client_for(&fetcher, "wrong").get_value().await.unwrap_err();
    assert!(matches!(err, KeyslotError::AuthenticationFailure), "got {err:?}");
}

#[tokio::test]
async fn nfkd_equivalent_password_unlocks() {
    // The fixture is sealed with the decomposed form.
    let fixture = SlotFixture::new("cafe\u{301}", "{}");
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;

    let value = client_for(&fetcher, "caf\u{e9}").get_value().await.unwrap();
    assert_eq!(value.as_deref().map(|v| v.as_slice()), Some(&b"{}"[..]));
}

#[tokio::test]
async fn unsupported_slot_version_is_rejected() {
    let fixture = SlotFixture::new("pw", "{}");
    let slot = fixture.slot_envelope().replacen(r#""v":1"#, r#""v":2"#, 1);
    let fetcher = MockFetcher::new();
    fetcher.push_body(resolved(slot, fixture.value_envelope())).await;

    let err = client_for(&fetcher, "pw").get_value().await.unwrap_err();
    assert!(matches!(err, KeyslotError::UnsupportedVersion(_)), "got {err:?}");
}

#[tokio::test]
async fn unsupported_value_version_is_rejected() {
    let fixture = SlotFixture::new("pw", "{}");
    let value = fixture.value_envelope().replacen(r#""v":1"#, r#""v":3"#, 1);
    let fetcher = MockFetcher::new();
    fetcher.push_body(resolved(fixture.slot_envelope(), value)).await;

    let err = client_for(&fetcher, "pw").get_value().await.unwrap_err();
    assert!(matches!(err, KeyslotError::UnsupportedVersion(_)), "got {err:?}");
}

#[tokio::test]
async fn slot_without_scrypt_salt_names_no_kdf() {
    let fixture = SlotFixture::new("pw", "{}");
    let slot = seal_envelope(&[0u8; 32], b"00", None);
    let fetcher = MockFetcher::new();
    fetcher.push_body(resolved(slot, fixture.value_envelope())).await;

    let err = client_for(&fetcher, "pw").get_value().await.unwrap_err();
    assert!(
        matches!(&err, KeyslotError::UnsupportedVersion(msg) if msg.contains("key derivation")),
        "got {err:?}"
    );
}

#[tokio::test]
async fn tampered_value_fails_authentication() {
    let fixture = SlotFixture::new("pw", "{}");
    let mut value: serde_json::Value = serde_json::from_str(&fixture.value_envelope()).unwrap();
    value["ct"] = serde_json::Value::String("AAAAAAAAAAAAAAAAAAAAAAAA".into());
    let fetcher = MockFetcher::new();
    fetcher
        .push_body(resolved(fixture.slot_envelope(), value.to_string()))
        .await;

    let err = client_for(&fetcher, "pw").get_value().await.unwrap_err();
    assert!(matches!(err, KeyslotError::AuthenticationFailure), "got {err:?}");
}

#[tokio::test]
async fn legacy_encoding_transcodes_to_latin1() {
    let fixture = SlotFixture::new("pw", "caf\u{e9} \u{20ac}");
    let fetcher = MockFetcher::new();
    fetcher.push_body(fixture.resolved_body()).await;
    fetcher.push_body(fixture.resolved_body()).await;

    let legacy = client_for(&fetcher, "pw")
        .with_value_encoding(ValueEncoding::LegacyLatin1)
        .get_value()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&*legacy, b"caf\xe9 ?");

    let utf8 = client_for(&fetcher, "pw")
        .with_value_encoding(ValueEncoding::Utf8)
        .get_value()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&*utf8, "caf\u{e9} \u{20ac}".as_bytes());
}

#[tokio::test]
async fn approval_over_http_after_pending_check() {
    let fixture = SlotFixture::new("pw", r#"{"ok":true}"#);
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slots/slot-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"result":{"ref":"abc","ttl":2}}"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slots/check/abc"))
        .respond_with(ResponseTemplate::new(428))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slots/check/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture.resolved_body()))
        .mount(&server)
        .await;

    let client = SlotClient::new(
        Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap()),
        Credentials::new("slot-1", SecretString::from("pw".to_string())),
    )
    .with_base_url(&format!("{}/slots/", server.uri()))
    .with_max_checks(2)
    .with_kdf(KdfChain::standard(None))
    .with_scrypt_params(cheap_params());

    let value = client.get_value().await.unwrap().expect("approved on second check");
    assert_eq!(&*value, br#"{"ok":true}"#);
}
