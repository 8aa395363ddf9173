// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot retrieval: fetch, approval polling and unlocking.
//!
//! A retrieval either gets the slot right away or an approval request
//! (`{"ref", "ttl"}`). In the latter case the client polls
//! `check/{ref}` every `floor(ttl / max_checks)` seconds until the slot is
//! served, the approval window closes, or `max_checks` checks were made.
//! HTTP 428 means "still pending"; any other failure ends the retrieval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keyslot_config::KeyslotConfig;
use keyslot_core::{Fetcher, KeyslotError, SecretBytes, SecretSource, ValueEncoding};
use keyslot_crypto::{cipher, Envelope, KdfChain, KdfRequest, ScryptParams};
use secrecy::SecretString;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::credentials::Credentials;
use crate::http::HttpFetcher;
use crate::types::{ApiResponse, ApiResult, PendingApproval, SlotResponse};

/// Slots API of the public vault service.
pub const DEFAULT_BASE_URL: &str = "https://www.enceeper.com/api/v1/user/slots/";

/// Upper bound on check-endpoint calls per approval request.
pub const DEFAULT_MAX_CHECKS: u32 = 10;

/// Per-request network timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bookkeeping for one approval request.
#[derive(Debug, Clone)]
pub struct PollState {
    pub reference: String,
    pub deadline: Instant,
    pub interval: Duration,
    pub checks: u32,
}

impl PollState {
    pub fn new(pending: &PendingApproval, max_checks: u32) -> Self {
        let ttl = Duration::from_secs(pending.ttl);
        Self {
            reference: pending.reference.clone(),
            deadline: Instant::now() + ttl,
            interval: Duration::from_secs(pending.ttl / u64::from(max_checks.max(1))),
            checks: 0,
        }
    }

    /// Whether another check may be made.
    pub fn may_check(&self, max_checks: u32) -> bool {
        self.checks < max_checks && Instant::now() < self.deadline
    }
}

/// Retrieves and unlocks one slot.
pub struct SlotClient {
    fetcher: Arc<dyn Fetcher>,
    credentials: Credentials,
    base_url: String,
    max_checks: u32,
    kdf: KdfChain,
    scrypt_params: ScryptParams,
    value_encoding: ValueEncoding,
    cancel: CancellationToken,
}

impl SlotClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, credentials: Credentials) -> Self {
        Self {
            fetcher,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_checks: DEFAULT_MAX_CHECKS,
            kdf: KdfChain::standard(None),
            scrypt_params: ScryptParams::slot(),
            value_encoding: ValueEncoding::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Client over HTTP configured from `config`; the identifier comes from
    /// `slot.identifier`.
    pub fn from_config(config: &KeyslotConfig, password: SecretString) -> Result<Self, KeyslotError> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.service.timeout_secs))?;
        let scrypt_params = ScryptParams::slot().with_cost(config.kdf.n, config.kdf.r, config.kdf.p)?;
        let credentials = Credentials::new(config.slot.identifier.clone(), password);

        Ok(Self::new(Arc::new(fetcher), credentials)
            .with_base_url(&config.service.base_url)
            .with_max_checks(config.service.max_checks)
            .with_kdf(KdfChain::standard(config.kdf.accelerator_path()))
            .with_scrypt_params(scrypt_params)
            .with_value_encoding(config.slot.value_encoding))
    }

    /// Base URL of the slots API; a trailing `/` is added when missing.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    pub fn with_max_checks(mut self, max_checks: u32) -> Self {
        self.max_checks = max_checks.max(1);
        self
    }

    pub fn with_kdf(mut self, kdf: KdfChain) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_scrypt_params(mut self, params: ScryptParams) -> Self {
        self.scrypt_params = params;
        self
    }

    pub fn with_value_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.value_encoding = encoding;
        self
    }

    /// Token that aborts approval polling when cancelled.
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn identifier(&self) -> &str {
        self.credentials.identifier()
    }

    /// Fetch the encrypted slot, waiting for approval when the service asks
    /// for it. `Ok(None)` when the approval window closed unanswered.
    pub async fn fetch_slot(&self) -> Result<Option<SlotResponse>, KeyslotError> {
        let url = format!("{}{}", self.base_url, self.credentials.identifier());
        debug!(identifier = self.credentials.identifier(), "requesting slot");

        let body = self.fetcher.fetch(&url).await?;
        match ApiResponse::parse(&body)? {
            ApiResult::Resolved(slot) => Ok(Some(slot)),
            ApiResult::Pending(pending) => self.await_approval(&pending).await,
        }
    }

    async fn await_approval(
        &self,
        pending: &PendingApproval,
    ) -> Result<Option<SlotResponse>, KeyslotError> {
        let mut state = PollState::new(pending, self.max_checks);
        info!(
            ttl_secs = pending.ttl,
            interval_secs = state.interval.as_secs(),
            "slot retrieval awaits approval"
        );

        while state.may_check(self.max_checks) {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(KeyslotError::Cancelled),
                _ = tokio::time::sleep(state.interval) => {}
            }
            state.checks += 1;

            let url = format!("{}check/{}", self.base_url, state.reference);
            match self.fetcher.fetch(&url).await {
                Ok(body) => match ApiResponse::parse(&body)? {
                    ApiResult::Resolved(slot) => {
                        info!(checks = state.checks, "slot retrieval approved");
                        return Ok(Some(slot));
                    }
                    ApiResult::Pending(_) => {
                        debug!(check = state.checks, "approval still pending");
                    }
                },
                Err(e) if e.is_pending_approval() => {
                    debug!(check = state.checks, "approval still pending");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(checks = state.checks, "approval window closed without an answer");
        Ok(None)
    }

    /// Decrypt a fetched slot: derive the password key, open the slot key,
    /// open the value and apply the configured text decoding.
    pub async fn unlock(&self, slot: &SlotResponse) -> Result<SecretBytes, KeyslotError> {
        let slot_envelope = Envelope::parse(&slot.slot)?;
        slot_envelope.ensure_supported_version()?;
        let salt = slot_envelope.scrypt_salt()?;

        let derived = self
            .kdf
            .derive(&KdfRequest {
                password: self.credentials.password(),
                salt: &salt,
                params: self.scrypt_params,
            })
            .await?;
        let slot_key_hex = cipher::decrypt(&derived, &slot_envelope)?;
        drop(derived);

        let slot_key = Zeroizing::new(
            hex::decode(slot_key_hex.trim_ascii())
                .map_err(|_| KeyslotError::Protocol("slot key is not hex text".into()))?,
        );

        let value_envelope = Envelope::parse(&slot.value)?;
        value_envelope.ensure_supported_version()?;
        let plaintext = cipher::decrypt(&slot_key, &value_envelope)?;

        debug!(identifier = self.credentials.identifier(), "slot unlocked");
        Ok(decode_value(plaintext, self.value_encoding))
    }

    /// One full retrieval. `Ok(None)` when approval never came.
    pub async fn get_value(&self) -> Result<Option<SecretBytes>, KeyslotError> {
        match self.fetch_slot().await? {
            Some(slot) => self.unlock(&slot).await.map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for SlotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotClient")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("max_checks", &self.max_checks)
            .field("kdf", &self.kdf)
            .field("scrypt_params", &self.scrypt_params)
            .field("value_encoding", &self.value_encoding)
            .finish()
    }
}

#[async_trait]
impl SecretSource for SlotClient {
    async fn fetch_value(&self) -> Result<Option<SecretBytes>, KeyslotError> {
        self.get_value().await
    }
}

/// Turn decrypted value bytes into what the cache decodes.
pub fn decode_value(plaintext: SecretBytes, encoding: ValueEncoding) -> SecretBytes {
    match encoding {
        ValueEncoding::Utf8 => plaintext,
        ValueEncoding::LegacyLatin1 => to_latin1(&plaintext),
    }
}

/// UTF-8 to ISO-8859-1. Code points above U+00FF and invalid sequences
/// become `?`.
fn to_latin1(bytes: &[u8]) -> SecretBytes {
    let mut out = Zeroizing::new(Vec::with_capacity(bytes.len()));
    for chunk in bytes.utf8_chunks() {
        out.extend(chunk.valid().chars().map(|c| u8::try_from(c).unwrap_or(b'?')));
        if !chunk.invalid().is_empty() {
            out.push(b'?');
        }
    }
    out
}
