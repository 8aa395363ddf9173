// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sealed slot fixtures.
//!
//! Builds service responses the way the vault service does: the value is
//! sealed with a random slot key, the slot key (as hex text) is sealed with
//! the scrypt-derived password key. Everything is deterministic so expected
//! plaintexts can be hard-coded, and the scrypt cost is low so tests stay
//! fast.

use aes_gcm::aead::consts::{U13, U16};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use keyslot_crypto::ScryptParams;

/// 16-byte wire IV used for every fixture envelope (13-byte GCM nonce).
pub const FIXTURE_IV: [u8; 16] = [
    0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xab, 0xac, 0xad, 0xae, 0xaf,
];

/// Seal `plaintext` as a version 1 `aes-256-gcm` envelope with a 128-bit
/// tag. `key` must hold at least 32 bytes; extra bytes are ignored.
pub fn seal_envelope(key: &[u8], plaintext: &[u8], scrypt_salt: Option<&[u8]>) -> String {
    let cipher = AesGcm::<Aes256, U13, U16>::new_from_slice(&key[..32])
        .expect("fixture key must hold 32 bytes");
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&FIXTURE_IV[..13]), b"", &mut buffer)
        .expect("fixture sealing");
    buffer.extend_from_slice(&tag);

    let mut envelope = serde_json::json!({
        "v": 1,
        "cipher": "aes",
        "ks": 256,
        "mode": "gcm",
        "ts": 128,
        "iv": STANDARD.encode(FIXTURE_IV),
        "ct": STANDARD.encode(&buffer),
    });
    if let Some(salt) = scrypt_salt {
        envelope["scrypt"] = serde_json::Value::String(STANDARD.encode(salt));
    }
    envelope.to_string()
}

/// A slot as stored at the vault service.
#[derive(Debug, Clone)]
pub struct SlotFixture {
    /// ASCII password (already in normal form).
    pub password: String,
    pub salt: Vec<u8>,
    pub slot_key: [u8; 32],
    pub params: ScryptParams,
    pub value_text: String,
    pub meta: serde_json::Value,
}

impl SlotFixture {
    pub fn new(password: &str, value_text: &str) -> Self {
        Self {
            password: password.to_string(),
            salt: b"keyslot-fixture-salt".to_vec(),
            slot_key: [0x5a; 32],
            params: cheap_params(),
            value_text: value_text.to_string(),
            meta: serde_json::json!({"name": "fixture"}),
        }
    }

    /// The slot-key envelope: hex of the slot key under the password key.
    pub fn slot_envelope(&self) -> String {
        let derived = keyslot_crypto::scrypt(self.password.as_bytes(), &self.salt, &self.params)
            .expect("fixture scrypt parameters are valid");
        seal_envelope(
            &derived,
            hex::encode(self.slot_key).as_bytes(),
            Some(&self.salt),
        )
    }

    /// The value envelope: the value text under the slot key.
    pub fn value_envelope(&self) -> String {
        seal_envelope(&self.slot_key, self.value_text.as_bytes(), None)
    }

    /// `{"result": {"slot", "meta", "value"}}` as served on approval.
    pub fn resolved_body(&self) -> String {
        serde_json::json!({
            "result": {
                "slot": self.slot_envelope(),
                "meta": self.meta,
                "value": self.value_envelope(),
            }
        })
        .to_string()
    }
}

/// scrypt parameters matching the slot preset except for a tiny `N`.
pub fn cheap_params() -> ScryptParams {
    ScryptParams {
        n: 16,
        ..ScryptParams::slot()
    }
}

#[cfg(test)]
mod tests {
    use keyslot_crypto::{decrypt, Envelope};

    use super::*;

    #[test]
    fn value_envelope_opens_with_slot_key() {
        let fixture = SlotFixture::new("pw", r#"{"db":"secret"}"#);
        let envelope = Envelope::parse(&fixture.value_envelope()).unwrap();
        let plaintext = decrypt(&fixture.slot_key, &envelope).unwrap();
        assert_eq!(&*plaintext, br#"{"db":"secret"}"#);
    }

    #[test]
    fn slot_envelope_carries_salt() {
        let fixture = SlotFixture::new("pw", "x");
        let envelope = Envelope::parse(&fixture.slot_envelope()).unwrap();
        assert_eq!(envelope.scrypt_salt().unwrap(), fixture.salt);
    }
}
