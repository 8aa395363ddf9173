// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot password acquisition via the KEYSLOT_PASSWORD environment variable or
//! a TTY prompt.

use keyslot_config::PASSWORD_ENV_VAR;
use keyslot_core::KeyslotError;
use secrecy::SecretString;

/// Get the slot password.
///
/// Priority:
/// 1. `KEYSLOT_PASSWORD` environment variable (cron jobs, containers)
/// 2. Interactive TTY prompt via `rpassword`
///
/// Returns an error if neither source is available.
pub fn read_slot_password() -> Result<SecretString, KeyslotError> {
    if let Some(password) = password_from_env() {
        return Ok(password);
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("Slot password: ");
        let password = rpassword::read_password()
            .map_err(|e| KeyslotError::Config(format!("failed to read password: {e}")))?;
        return Ok(SecretString::from(password));
    }

    Err(KeyslotError::Config(format!(
        "no slot password provided. Set {PASSWORD_ENV_VAR} or run interactively."
    )))
}

/// The password from `KEYSLOT_PASSWORD`, when set and non-empty.
pub fn password_from_env() -> Option<SecretString> {
    match std::env::var(PASSWORD_ENV_VAR) {
        Ok(password) if !password.is_empty() => Some(SecretString::from(password)),
        _ => None,
    }
}
