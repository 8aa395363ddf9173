// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keyslot.toml` > `~/.config/keyslot/keyslot.toml` >
//! `/etc/keyslot/keyslot.toml` with environment variable overrides via the
//! `KEYSLOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeyslotConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keyslot/keyslot.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "keyslot.toml";

/// Environment variable carrying the slot password. Never read into the
/// config model.
pub const PASSWORD_ENV_VAR: &str = "KEYSLOT_PASSWORD";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keyslot/keyslot.toml` (system-wide)
/// 3. `~/.config/keyslot/keyslot.toml` (user XDG config)
/// 4. `./keyslot.toml` (local directory)
/// 5. `KEYSLOT_*` environment variables
pub fn load_config() -> Result<KeyslotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KeyslotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyslotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeyslotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyslotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeyslotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/keyslot/keyslot.toml`, when a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("keyslot").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `KEYSLOT_CACHE_TTL_SECS` must map to `cache.ttl_secs`, not
/// `cache.ttl.secs`. `KEYSLOT_PASSWORD` is skipped.
fn env_provider() -> Env {
    Env::prefixed("KEYSLOT_").ignore(&["password"]).map(|key| {
        let mapped = key
            .as_str()
            .replacen("log_", "log.", 1)
            .replacen("service_", "service.", 1)
            .replacen("slot_", "slot.", 1)
            .replacen("kdf_", "kdf.", 1)
            .replacen("cache_", "cache.", 1);
        mapped.into()
    })
}
