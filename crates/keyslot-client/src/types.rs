// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault service response types.

use keyslot_core::KeyslotError;
use serde::{Deserialize, Serialize};

/// Envelope of every slots API answer: `{"result": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub result: ApiResult,
}

/// Either the slot itself or an approval request to poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiResult {
    Pending(PendingApproval),
    Resolved(SlotResponse),
}

/// The owner has to approve this retrieval; poll `check/{reference}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
    #[serde(rename = "ref")]
    pub reference: String,
    /// Seconds the approval request stays open.
    pub ttl: u64,
}

/// Encrypted slot material as served by the vault service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotResponse {
    /// Slot-key envelope (JSON text).
    pub slot: String,
    /// Descriptive metadata, passed through untouched.
    #[serde(default)]
    pub meta: serde_json::Value,
    /// Value envelope (JSON text).
    pub value: String,
}

impl ApiResponse {
    /// Parse a response body.
    pub fn parse(body: &str) -> Result<ApiResult, KeyslotError> {
        let response: ApiResponse = serde_json::from_str(body)
            .map_err(|e| KeyslotError::Protocol(format!("unexpected service response: {e}")))?;

        if let ApiResult::Pending(pending) = &response.result
            && pending.reference.is_empty()
        {
            return Err(KeyslotError::Protocol(
                "approval request without a reference".into(),
            ));
        }
        Ok(response.result)
    }
}
