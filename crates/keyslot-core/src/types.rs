// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the client, the cache, and the configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use zeroize::Zeroizing;

/// Decrypted secret bytes, zeroed on drop.
pub type SecretBytes = Zeroizing<Vec<u8>>;

/// When a stored value is refreshed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyMode {
    /// Reads refresh the record once it is stale.
    LiveUpdate,
    /// Reads never refresh; an external scheduler calls `update`.
    #[default]
    BatchMode,
}

/// How the decrypted value text is turned into the bytes handed to the
/// structural decoder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueEncoding {
    /// Transcode UTF-8 to ISO-8859-1, code points above U+00FF become `?`.
    #[default]
    LegacyLatin1,
    /// Pass the decrypted bytes through untouched.
    Utf8,
}

/// A timestamped, fully decoded cache payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Unix seconds of the fetch that produced `payload`.
    #[serde(rename = "created")]
    pub created_at: i64,
    /// Structured value decoded from the service's text response.
    #[serde(rename = "value")]
    pub payload: serde_json::Value,
}

impl CacheRecord {
    pub fn new(created_at: i64, payload: serde_json::Value) -> Self {
        Self {
            created_at,
            payload,
        }
    }

    /// Whether this record is older than `ttl` at `now` (unix seconds).
    pub fn is_expired(&self, ttl: Duration, now: i64) -> bool {
        is_expired(self.created_at, ttl, now)
    }
}

/// `now > created_at + ttl`, all in unix seconds.
pub fn is_expired(created_at: i64, ttl: Duration, now: i64) -> bool {
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    now > created_at.saturating_add(ttl)
}

/// Answer of [`StorageBackend::last_update`](crate::StorageBackend::last_update).
///
/// `created_at` is 0 when no record exists. When the backend had to read the
/// whole record to learn its timestamp, `record` carries it so the caller can
/// serve it without a second round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastUpdate {
    pub created_at: i64,
    pub record: Option<CacheRecord>,
}

impl LastUpdate {
    /// Build from a full read; the record is carried along.
    pub fn from_record(record: Option<CacheRecord>) -> Self {
        Self {
            created_at: record.as_ref().map_or(0, |r| r.created_at),
            record,
        }
    }

    /// Timestamp-only answer.
    pub fn timestamp(created_at: i64) -> Self {
        Self {
            created_at,
            record: None,
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: i64) -> bool {
        is_expired(self.created_at, ttl, now)
    }
}
