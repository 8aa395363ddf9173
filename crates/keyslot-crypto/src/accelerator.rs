// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External key-derivation executables.
//!
//! A native scrypt binary is orders of magnitude faster than the pure
//! implementation. It lives at `<dir>/scrypt` and is invoked as
//! `scrypt <hex salt> <hex password padded to 8 digits> <N>`; the derived
//! key is the last non-empty stdout line, in hex.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use keyslot_core::KeyslotError;
use secrecy::ExposeSecret;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::kdf::{KdfProvider, KdfRequest};
use crate::scrypt::ScryptParams;

/// Executable name of the scrypt accelerator.
pub const SCRYPT_METHOD: &str = "scrypt";

/// Hex-encode `password` and right-pad it with `0` to a multiple of eight
/// digits. An empty password becomes `"00000000"`.
pub fn pad_password_hex(password: &[u8]) -> Zeroizing<String> {
    let mut hex = Zeroizing::new(hex::encode(password));
    let padded_len = (hex.len() / 8 + usize::from(hex.is_empty() || hex.len() % 8 != 0)) * 8;
    while hex.len() < padded_len {
        hex.push('0');
    }
    hex
}

/// Runs `<dir>/<method>` to derive slot keys.
///
/// Anything short of a clean exit with hex output is reported as
/// "unavailable" so the chain falls through to the pure implementation.
#[derive(Debug, Clone)]
pub struct AcceleratorProvider {
    executable: PathBuf,
}

impl AcceleratorProvider {
    /// Accelerator for the scrypt method inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_method(dir, SCRYPT_METHOD)
    }

    pub fn with_method(dir: impl AsRef<Path>, method: &str) -> Self {
        Self {
            executable: dir.as_ref().join(method),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The binary only takes `N`; every other parameter is fixed to the
    /// slot preset.
    fn supports(params: &ScryptParams) -> bool {
        let preset = ScryptParams::slot();
        params.r == preset.r
            && params.p == preset.p
            && params.prf == preset.prf
            && params.output_len == preset.output_len
    }
}

#[async_trait]
impl KdfProvider for AcceleratorProvider {
    fn name(&self) -> &str {
        "accelerator"
    }

    async fn derive(
        &self,
        request: &KdfRequest<'_>,
    ) -> Result<Option<Zeroizing<Vec<u8>>>, KeyslotError> {
        if !Self::supports(&request.params) {
            debug!("accelerator skipped: parameters differ from the slot preset");
            return Ok(None);
        }
        if !is_executable(&self.executable).await {
            debug!(path = %self.executable.display(), "no accelerator executable");
            return Ok(None);
        }

        let password_hex = pad_password_hex(request.password.expose_secret().as_bytes());
        let output = match tokio::process::Command::new(&self.executable)
            .arg(hex::encode(request.salt))
            .arg(password_hex.as_str())
            .arg(request.params.n.to_string())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(path = %self.executable.display(), error = %e, "failed to run accelerator");
                return Ok(None);
            }
        };

        if !output.status.success() {
            warn!(
                path = %self.executable.display(),
                code = output.status.code().unwrap_or(-1),
                "accelerator exited with failure, using built-in scrypt"
            );
            return Ok(None);
        }

        let stdout = Zeroizing::new(String::from_utf8_lossy(&output.stdout).into_owned());
        let Some(line) = stdout.lines().rev().map(str::trim).find(|l| !l.is_empty()) else {
            warn!(path = %self.executable.display(), "accelerator printed no key");
            return Ok(None);
        };

        match hex::decode(line) {
            Ok(key) if !key.is_empty() => Ok(Some(Zeroizing::new(key))),
            _ => {
                warn!(path = %self.executable.display(), "accelerator output is not hex");
                Ok(None)
            }
        }
    }
}

#[cfg(unix)]
async fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
async fn is_executable(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
