// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted transport for deterministic client tests.
//!
//! `MockFetcher` implements `Fetcher` by popping pre-configured answers from
//! a FIFO queue and recording every requested URL together with the (tokio)
//! instant it was requested at, so tests running on a paused clock can check
//! poll spacing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use keyslot_core::{Fetcher, KeyslotError, PENDING_APPROVAL_STATUS};

/// One recorded request.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub url: String,
    pub at: Instant,
}

/// A fetcher that answers from a queue.
///
/// When the queue is empty every further call fails with
/// `KeyslotError::Internal`.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<VecDeque<Result<String, KeyslotError>>>>,
    calls: Arc<Mutex<Vec<FetchCall>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful body.
    pub async fn push_body(&self, body: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(body.into()));
    }

    /// Queue an error.
    pub async fn push_error(&self, error: KeyslotError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// Queue `count` "approval still pending" answers (HTTP 428).
    pub async fn push_pending(&self, count: usize) {
        let mut responses = self.responses.lock().await;
        for _ in 0..count {
            responses.push_back(Err(pending_error()));
        }
    }

    /// Queue a `{"result":{"ref", "ttl"}}` body.
    pub async fn push_approval_request(&self, reference: &str, ttl_secs: u64) {
        self.push_body(
            serde_json::json!({"result": {"ref": reference, "ttl": ttl_secs}}).to_string(),
        )
        .await;
    }

    /// All requests made so far.
    pub async fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().await.clone()
    }

    /// Requested URLs in order.
    pub async fn urls(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|c| c.url.clone()).collect()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

/// The error the check endpoint produces while approval is pending.
pub fn pending_error() -> KeyslotError {
    KeyslotError::RemoteApi {
        status: PENDING_APPROVAL_STATUS,
        message: "Precondition Required".into(),
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, KeyslotError> {
        self.calls.lock().await.push(FetchCall {
            url: url.to_string(),
            at: Instant::now(),
        });
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(KeyslotError::Internal(format!("no scripted response for {url}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_in_order_and_records_urls() {
        let fetcher = MockFetcher::new();
        fetcher.push_body("first").await;
        fetcher.push_pending(1).await;

        assert_eq!(fetcher.fetch("http://a/1").await.unwrap(), "first");
        assert!(fetcher.fetch("http://a/2").await.unwrap_err().is_pending_approval());
        assert!(matches!(
            fetcher.fetch("http://a/3").await,
            Err(KeyslotError::Internal(_))
        ));
        assert_eq!(
            fetcher.urls().await,
            vec!["http://a/1", "http://a/2", "http://a/3"]
        );
    }
}
