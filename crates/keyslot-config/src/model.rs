// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for keyslot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. The slot password is deliberately absent: it is
//! read from `KEYSLOT_PASSWORD` or an interactive prompt, never from a file.

use std::path::PathBuf;

use keyslot_core::{StrategyMode, ValueEncoding};
use serde::{Deserialize, Serialize};

/// Top-level keyslot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyslotConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Vault service endpoint settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// The slot to retrieve.
    #[serde(default)]
    pub slot: SlotConfig,

    /// Key-derivation settings.
    #[serde(default)]
    pub kdf: KdfConfig,

    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Vault service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL of the slots API; must end with `/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request network timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on check-endpoint calls while an approval is pending.
    #[serde(default = "default_max_checks")]
    pub max_checks: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_checks: default_max_checks(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.enceeper.com/api/v1/user/slots/".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_checks() -> u32 {
    10
}

/// Slot selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlotConfig {
    /// Identifier of the slot at the vault service.
    #[serde(default)]
    pub identifier: String,

    /// Text decoding applied to the decrypted value.
    #[serde(default)]
    pub value_encoding: ValueEncoding,
}

/// Key-derivation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    /// Directory holding accelerator executables (`<dir>/scrypt`).
    /// Unset or empty disables the accelerator.
    #[serde(default)]
    pub accelerator_dir: Option<String>,

    /// scrypt CPU/memory cost (power of two).
    #[serde(default = "default_kdf_n")]
    pub n: u32,

    /// scrypt block size.
    #[serde(default = "default_kdf_r")]
    pub r: u32,

    /// scrypt parallelism.
    #[serde(default = "default_kdf_p")]
    pub p: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            accelerator_dir: None,
            n: default_kdf_n(),
            r: default_kdf_r(),
            p: default_kdf_p(),
        }
    }
}

impl KdfConfig {
    /// Accelerator directory to use, if any. Blank values count as unset.
    pub fn accelerator_path(&self) -> Option<PathBuf> {
        self.accelerator_dir
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }
}

fn default_kdf_n() -> u32 {
    32768
}

fn default_kdf_r() -> u32 {
    8
}

fn default_kdf_p() -> u32 {
    1
}

/// Which storage backend holds the cache record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// One JSON file per key inside `cache.path` (a directory).
    #[default]
    File,
    /// A SQLite database at `cache.path`.
    Sqlite,
}

/// Local cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: CacheBackendKind,

    /// Directory (file backend) or database file (sqlite backend).
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// Key the record is stored under.
    #[serde(default = "default_cache_key")]
    pub key: String,

    /// Freshness window in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Refresh strategy.
    #[serde(default)]
    pub strategy: StrategyMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            path: default_cache_path(),
            key: default_cache_key(),
            ttl_secs: default_ttl_secs(),
            strategy: StrategyMode::default(),
        }
    }
}

fn default_cache_path() -> String {
    dirs::cache_dir()
        .map(|p| p.join("keyslot"))
        .unwrap_or_else(|| PathBuf::from(".keyslot"))
        .display()
        .to_string()
}

fn default_cache_key() -> String {
    "keyslot".to_string()
}

fn default_ttl_secs() -> u64 {
    3600
}
