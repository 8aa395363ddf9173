// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret source stub that counts invocations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use keyslot_core::{KeyslotError, SecretBytes, SecretSource};

/// A `SecretSource` answering from a queue.
///
/// An empty queue repeats the fallback value (or `None` when unset).
#[derive(Clone, Default)]
pub struct CountingSource {
    answers: Arc<Mutex<VecDeque<Result<Option<Vec<u8>>, KeyslotError>>>>,
    fallback: Option<Vec<u8>>,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    /// Source that always yields `value`.
    pub fn returning(value: impl Into<Vec<u8>>) -> Self {
        Self {
            fallback: Some(value.into()),
            ..Self::default()
        }
    }

    /// Source that always yields `None` (approval still pending).
    pub fn pending() -> Self {
        Self::default()
    }

    /// Queue a one-off answer ahead of the fallback.
    pub async fn push(&self, answer: Result<Option<Vec<u8>>, KeyslotError>) {
        self.answers.lock().await.push_back(answer);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretSource for CountingSource {
    async fn fetch_value(&self) -> Result<Option<SecretBytes>, KeyslotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .answers
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()));
        answer.map(|value| value.map(Zeroizing::new))
    }
}
