// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Every seam between the orchestration logic and an outside collaborator is
//! a trait here, using `#[async_trait]` for dynamic dispatch compatibility.

pub mod fetch;
pub mod source;
pub mod storage;

pub use fetch::Fetcher;
pub use source::SecretSource;
pub use storage::StorageBackend;
