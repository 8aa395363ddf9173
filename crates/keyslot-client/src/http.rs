// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest-backed transport for the vault service.

use std::time::Duration;

use async_trait::async_trait;
use keyslot_core::{Fetcher, KeyslotError};
use tracing::debug;

/// Longest response-body excerpt carried into an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// GETs URLs with a per-request timeout.
///
/// Non-success statuses become [`KeyslotError::RemoteApi`]; timeouts and
/// connection failures become [`KeyslotError::Network`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, KeyslotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("keyslot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KeyslotError::Network {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, KeyslotError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        debug!(status = %status, url, "vault service response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            let message = if body.is_empty() {
                status.to_string()
            } else {
                let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
                format!("{status}: {excerpt}")
            };
            return Err(KeyslotError::RemoteApi {
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(|e| network_error(url, e))
    }
}

fn network_error(url: &str, e: reqwest::Error) -> KeyslotError {
    let message = if e.is_timeout() {
        format!("request to {url} timed out")
    } else {
        format!("request to {url} failed: {e}")
    };
    KeyslotError::Network {
        message,
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slots/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result":{}}"#))
            .mount(&server)
            .await;

        let body = fetcher()
            .fetch(&format!("{}/slots/abc", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, r#"{"result":{}}"#);
    }

    #[tokio::test]
    async fn precondition_required_is_pending_approval() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slots/check/ref1"))
            .respond_with(ResponseTemplate::new(428))
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/slots/check/ref1", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_pending_approval(), "got {err:?}");
    }

    #[tokio::test]
    async fn error_status_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("slot is locked"))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&server.uri()).await.unwrap_err();
        match err {
            KeyslotError::RemoteApi { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("slot is locked"), "got {message}");
            }
            other => panic!("expected RemoteApi, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_server_is_a_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_millis(100)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(
            matches!(&err, KeyslotError::Network { message, .. } if message.contains("timed out")),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = fetcher().fetch(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(err, KeyslotError::Network { .. }), "got {err:?}");
    }
}
