// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password-based key derivation through an ordered chain of providers.
//!
//! Each provider either derives the key, answers `Ok(None)` ("unavailable",
//! the chain moves on) or fails hard. The standard chain tries the
//! accelerator executable first and the built-in scrypt last.

use std::path::PathBuf;

use async_trait::async_trait;
use keyslot_core::KeyslotError;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

use crate::accelerator::AcceleratorProvider;
use crate::scrypt::{scrypt, ScryptParams};

/// Inputs of one derivation.
pub struct KdfRequest<'a> {
    pub password: &'a SecretString,
    pub salt: &'a [u8],
    pub params: ScryptParams,
}

impl std::fmt::Debug for KdfRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdfRequest")
            .field("password", &"[REDACTED]")
            .field("salt", &hex::encode(self.salt))
            .field("params", &self.params)
            .finish()
    }
}

/// One way of computing a derived key.
#[async_trait]
pub trait KdfProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Derive the key, or `Ok(None)` when this provider cannot serve the
    /// request.
    async fn derive(
        &self,
        request: &KdfRequest<'_>,
    ) -> Result<Option<Zeroizing<Vec<u8>>>, KeyslotError>;
}

/// The pure scrypt implementation, run on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScryptProvider;

#[async_trait]
impl KdfProvider for ScryptProvider {
    fn name(&self) -> &str {
        "scrypt"
    }

    async fn derive(
        &self,
        request: &KdfRequest<'_>,
    ) -> Result<Option<Zeroizing<Vec<u8>>>, KeyslotError> {
        let password = Zeroizing::new(request.password.expose_secret().as_bytes().to_vec());
        let salt = request.salt.to_vec();
        let params = request.params;

        let key = tokio::task::spawn_blocking(move || scrypt(&password, &salt, &params))
            .await
            .map_err(|e| KeyslotError::Internal(format!("scrypt task failed: {e}")))??;
        Ok(Some(key))
    }
}

/// Ordered provider list; the first provider that answers wins.
pub struct KdfChain {
    providers: Vec<Box<dyn KdfProvider>>,
}

impl KdfChain {
    pub fn new(providers: Vec<Box<dyn KdfProvider>>) -> Self {
        Self { providers }
    }

    /// Accelerator in `accelerator_dir` (when given), then built-in scrypt.
    pub fn standard(accelerator_dir: Option<PathBuf>) -> Self {
        let mut providers: Vec<Box<dyn KdfProvider>> = Vec::with_capacity(2);
        if let Some(dir) = accelerator_dir {
            providers.push(Box::new(AcceleratorProvider::new(dir)));
        }
        providers.push(Box::new(ScryptProvider));
        Self::new(providers)
    }

    /// Names of the providers in order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run the chain.
    pub async fn derive(&self, request: &KdfRequest<'_>) -> Result<Zeroizing<Vec<u8>>, KeyslotError> {
        request.params.validate()?;

        for provider in &self.providers {
            if let Some(key) = provider.derive(request).await? {
                debug!(provider = provider.name(), "derived key");
                return Ok(key);
            }
            debug!(provider = provider.name(), "key derivation provider unavailable");
        }

        Err(KeyslotError::Config(
            "no key derivation provider is available".into(),
        ))
    }
}

impl Default for KdfChain {
    fn default() -> Self {
        Self::standard(None)
    }
}

impl std::fmt::Debug for KdfChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdfChain")
            .field("providers", &self.provider_names())
            .finish()
    }
}
