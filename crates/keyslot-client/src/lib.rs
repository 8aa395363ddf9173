// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault service client for keyslot.
//!
//! Fetches a slot over HTTP, waits for owner approval when the service asks
//! for it, and unlocks the value with the slot password.

pub mod credentials;
pub mod http;
pub mod prompt;
pub mod slot;
pub mod types;

pub use credentials::Credentials;
pub use http::HttpFetcher;
pub use prompt::read_slot_password;
pub use slot::{decode_value, PollState, SlotClient};
pub use types::{ApiResponse, ApiResult, PendingApproval, SlotResponse};
