// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for keyslot.

use thiserror::Error;

/// HTTP status the vault service uses while a slot request awaits approval.
pub const PENDING_APPROVAL_STATUS: u16 = 428;

/// The primary error type shared by every keyslot crate.
///
/// Messages never carry passwords or key material.
#[derive(Debug, Error)]
pub enum KeyslotError {
    /// Invalid configuration or key-derivation parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// Timeout or connectivity failure while talking to the vault service.
    #[error("network error: {message}")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The vault service answered with a non-success status.
    #[error("vault service returned {status}: {message}")]
    RemoteApi { status: u16, message: String },

    /// Envelope version, cipher, or key-derivation function is not supported.
    #[error("unsupported: {0}")]
    UnsupportedVersion(String),

    /// Tag verification failed during authenticated decryption.
    #[error("authentication failed: wrong key or altered ciphertext")]
    AuthenticationFailure,

    /// The service response or an envelope could not be parsed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Decoding or persisting a fresh cache record failed.
    #[error("cache write failed: {message}")]
    CacheWrite {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading a cache record failed. Callers treat this as "no record".
    #[error("cache read failed: {message}")]
    CacheRead {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeyslotError {
    /// True for the "still pending approval" answer of the check endpoint.
    pub fn is_pending_approval(&self) -> bool {
        matches!(
            self,
            KeyslotError::RemoteApi { status, .. } if *status == PENDING_APPROVAL_STATUS
        )
    }

    /// Shorthand for a [`KeyslotError::CacheWrite`] without a source.
    pub fn cache_write(message: impl Into<String>) -> Self {
        KeyslotError::CacheWrite {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`KeyslotError::CacheRead`] without a source.
    pub fn cache_read(message: impl Into<String>) -> Self {
        KeyslotError::CacheRead {
            message: message.into(),
            source: None,
        }
    }
}
