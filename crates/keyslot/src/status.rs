// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyslot status` command implementation.
//!
//! Reports when the cached record was written and whether it is past its
//! TTL. Never contacts the vault service.

use keyslot_cache::CacheOrchestrator;
use keyslot_core::KeyslotError;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize, PartialEq)]
pub struct StatusResponse {
    pub backend: String,
    pub key: String,
    pub strategy: String,
    pub ttl_secs: u64,
    /// Unix seconds, 0 when no record exists.
    pub last_update: i64,
    pub last_update_human: Option<String>,
    pub stale: bool,
}

impl StatusResponse {
    pub async fn collect(cache: &CacheOrchestrator) -> Result<Self, KeyslotError> {
        let last_update = cache.last_update().await?;
        Ok(Self {
            backend: cache.backend_name().to_string(),
            key: cache.key().to_string(),
            strategy: cache.strategy().to_string(),
            ttl_secs: cache.ttl().as_secs(),
            last_update,
            last_update_human: format_timestamp(last_update),
            stale: cache.is_stale(last_update),
        })
    }

    pub fn render_plain(&self) -> String {
        let updated = self.last_update_human.as_deref().unwrap_or("never");
        format!(
            "backend:     {}\nkey:         {}\nstrategy:    {}\nttl:         {}s\nlast update: {}\nstale:       {}",
            self.backend,
            self.key,
            self.strategy,
            self.ttl_secs,
            updated,
            if self.stale { "yes" } else { "no" },
        )
    }
}

/// RFC 3339 rendering of a unix timestamp; `None` for 0 (no record).
fn format_timestamp(secs: i64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    chrono::DateTime::from_timestamp(secs, 0).map(|t| t.to_rfc3339())
}

/// Run the `keyslot status` command.
pub async fn run_status(cache: &CacheOrchestrator, json: bool) -> Result<(), KeyslotError> {
    let status = StatusResponse::collect(cache).await?;
    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| KeyslotError::Internal(format!("failed to serialize status: {e}")))?;
        println!("{out}");
    } else {
        println!("{}", status.render_plain());
    }
    Ok(())
}
