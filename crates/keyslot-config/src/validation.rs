// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes:
//! URL shape, scrypt parameter rules, and cache key safety.

use crate::diagnostic::ConfigError;
use crate::model::KeyslotConfig;

/// Largest buffer size the scrypt parameter rules allow (`2^32 - 1`).
const SIZE_MAX: u64 = u32::MAX as u64;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KeyslotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.service.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        errors.push(validation(format!(
            "service.base_url `{base_url}` must be an http(s) URL"
        )));
    }
    if !base_url.ends_with('/') {
        errors.push(validation(format!(
            "service.base_url `{base_url}` must end with `/`"
        )));
    }

    if config.service.timeout_secs == 0 {
        errors.push(validation("service.timeout_secs must be at least 1"));
    }

    if config.service.max_checks == 0 {
        errors.push(validation("service.max_checks must be at least 1"));
    }

    if config.slot.identifier.trim().is_empty() {
        errors.push(validation("slot.identifier must not be empty"));
    }

    errors.extend(validate_kdf(config));

    if config.cache.path.trim().is_empty() {
        errors.push(validation("cache.path must not be empty"));
    }

    let key = &config.cache.key;
    if key.trim().is_empty() {
        errors.push(validation("cache.key must not be empty"));
    } else if key.contains(['/', '\\']) || key == "." || key == ".." {
        errors.push(validation(format!(
            "cache.key `{key}` must not contain path separators"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_kdf(config: &KeyslotConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    let (n, r, p) = (
        u64::from(config.kdf.n),
        u64::from(config.kdf.r),
        u64::from(config.kdf.p),
    );

    if r == 0 || p == 0 {
        errors.push(validation("kdf.r and kdf.p must be at least 1"));
        return errors;
    }
    if r * p >= 1 << 30 {
        errors.push(validation(format!(
            "kdf.r * kdf.p must be below 2^30, got {}",
            r * p
        )));
    }
    if n < 2 || !n.is_power_of_two() {
        errors.push(validation(format!(
            "kdf.n must be a power of two of at least 2, got {n}"
        )));
    }
    if n * 128 * r > SIZE_MAX {
        errors.push(validation(format!("kdf.n {n} is too big for r = {r}")));
    }
    if r * 128 * p > SIZE_MAX {
        errors.push(validation(format!("kdf.r {r} is too big for p = {p}")));
    }
    errors
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
