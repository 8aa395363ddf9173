// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for keyslot integration tests.
//!
//! Provides mock adapters and sealed fixtures for fast, deterministic,
//! CI-runnable tests without a vault service.
//!
//! # Components
//!
//! - [`MockFetcher`] - Scripted transport that records requested URLs
//! - [`MemoryBackend`] - In-memory storage backend with failure injection
//! - [`CountingSource`] - Secret source that counts invocations
//! - [`SlotFixture`] - Sealed slot and value envelopes for a known password

pub mod counting_source;
pub mod fixtures;
pub mod memory_backend;
pub mod mock_fetcher;

pub use counting_source::CountingSource;
pub use fixtures::{cheap_params, seal_envelope, SlotFixture};
pub use memory_backend::MemoryBackend;
pub use mock_fetcher::{pending_error, FetchCall, MockFetcher};
