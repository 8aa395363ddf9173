// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Producer of fresh secret values for the cache orchestrator.

use async_trait::async_trait;

use crate::error::KeyslotError;
use crate::types::SecretBytes;

/// Produces the decrypted value text of a slot.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Run one fetch-and-decrypt cycle.
    ///
    /// `Ok(None)` means the value is not available yet (an approval request
    /// expired unanswered); it is not an error.
    async fn fetch_value(&self) -> Result<Option<SecretBytes>, KeyslotError>;
}
