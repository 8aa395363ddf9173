// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport trait for talking to the vault service.

use async_trait::async_trait;

use crate::error::KeyslotError;

/// Retrieves a response body from the vault service.
///
/// Implementations map timeouts and connectivity failures to
/// [`KeyslotError::Network`] and non-success statuses to
/// [`KeyslotError::RemoteApi`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return its body as text.
    async fn fetch(&self, url: &str) -> Result<String, KeyslotError>;
}
