// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for keyslot.
//!
//! This crate provides the error type, the shared cache and strategy types,
//! and the adapter traits (transport, storage, secret source) used
//! throughout the workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{KeyslotError, PENDING_APPROVAL_STATUS};
pub use types::{is_expired, CacheRecord, LastUpdate, SecretBytes, StrategyMode, ValueEncoding};

pub use traits::{Fetcher, SecretSource, StorageBackend};
