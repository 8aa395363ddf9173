// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot credentials.

use secrecy::{ExposeSecret, SecretString};
use unicode_normalization::UnicodeNormalization;

/// The password unlocking a slot and the identifier naming it.
///
/// The password is NFKD-normalized once, at construction, so that visually
/// identical passwords typed on different platforms derive the same key.
pub struct Credentials {
    identifier: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: SecretString) -> Self {
        let normalized: String = password.expose_secret().nfkd().collect();
        Self {
            identifier: identifier.into(),
            password: SecretString::from(normalized),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
