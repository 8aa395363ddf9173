// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot source that asks for the password only when a fetch is needed.
//!
//! Batch-mode `get` and `status` never reach the vault service, so they must
//! not prompt. The [`SlotClient`] is built on the first fetch and reused.

use async_trait::async_trait;
use keyslot_client::{read_slot_password, SlotClient};
use keyslot_config::KeyslotConfig;
use keyslot_core::{KeyslotError, SecretBytes, SecretSource};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

pub struct LazySlotSource {
    config: KeyslotConfig,
    cancel: CancellationToken,
    client: OnceCell<SlotClient>,
}

impl LazySlotSource {
    pub fn new(config: KeyslotConfig, cancel: CancellationToken) -> Self {
        Self {
            config,
            cancel,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&SlotClient, KeyslotError> {
        self.client
            .get_or_try_init(|| async {
                // rpassword blocks on the terminal.
                let password = tokio::task::spawn_blocking(read_slot_password)
                    .await
                    .map_err(|e| KeyslotError::Internal(format!("password prompt failed: {e}")))??;
                Ok::<_, KeyslotError>(
                    SlotClient::from_config(&self.config, password)?
                        .with_cancellation_token(self.cancel.clone()),
                )
            })
            .await
    }
}

#[async_trait]
impl SecretSource for LazySlotSource {
    async fn fetch_value(&self) -> Result<Option<SecretBytes>, KeyslotError> {
        self.client().await?.get_value().await
    }
}
