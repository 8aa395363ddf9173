// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Version 1 encryption envelopes.
//!
//! Envelopes travel as JSON text:
//!
//! ```json
//! {"v":1,"scrypt":"<b64 salt>","cipher":"aes","ks":256,"mode":"gcm","ts":128,
//!  "iv":"<b64>","ct":"<b64 ciphertext || tag>"}
//! ```
//!
//! `scrypt` is only present on the slot-key envelope.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use keyslot_core::KeyslotError;
use serde::{Deserialize, Serialize};

/// The only envelope version this crate understands.
pub const SUPPORTED_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub v: u64,
    /// Base64 scrypt salt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrypt: Option<String>,
    #[serde(default)]
    pub cipher: String,
    /// Key size in bits.
    #[serde(default)]
    pub ks: u32,
    #[serde(default)]
    pub mode: String,
    /// Tag size in bits.
    #[serde(default)]
    pub ts: u32,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub ct: String,
}

impl Envelope {
    /// Parse envelope JSON text.
    pub fn parse(text: &str) -> Result<Self, KeyslotError> {
        serde_json::from_str(text)
            .map_err(|e| KeyslotError::Protocol(format!("malformed envelope: {e}")))
    }

    /// Reject every version but 1.
    pub fn ensure_supported_version(&self) -> Result<(), KeyslotError> {
        if self.v == SUPPORTED_VERSION {
            Ok(())
        } else {
            Err(KeyslotError::UnsupportedVersion(format!(
                "envelope version {} is not supported",
                self.v
            )))
        }
    }

    /// The scrypt salt; an envelope without one names no key derivation
    /// function we can run.
    pub fn scrypt_salt(&self) -> Result<Vec<u8>, KeyslotError> {
        match self.scrypt.as_deref() {
            Some(salt) if !salt.is_empty() => decode_field("scrypt", salt),
            _ => Err(KeyslotError::UnsupportedVersion(
                "no supported key derivation function".into(),
            )),
        }
    }

    /// OpenSSL-style cipher name, e.g. `aes-256-gcm`.
    pub fn cipher_name(&self) -> String {
        format!("{}-{}-{}", self.cipher, self.ks, self.mode)
    }

    pub fn iv_bytes(&self) -> Result<Vec<u8>, KeyslotError> {
        decode_field("iv", &self.iv)
    }

    pub fn ct_bytes(&self) -> Result<Vec<u8>, KeyslotError> {
        decode_field("ct", &self.ct)
    }
}

pub(crate) fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, KeyslotError> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| KeyslotError::Protocol(format!("envelope field `{name}` is not base64: {e}")))
}
