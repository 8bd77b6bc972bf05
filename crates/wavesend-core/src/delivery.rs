//! Delivery API client
//!
//! The worker talks to the external message provider through the
//! [`DeliveryApi`] trait; [`HttpDeliveryClient`] is the production
//! implementation. Tests substitute a scripted fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wavesend_common::config::DeliveryConfig;

/// Rate-limit feedback carried on every provider response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window, if reported
    pub remaining: Option<i64>,
    /// Seconds until the window resets, if reported
    pub reset_after_secs: Option<u64>,
}

/// Outcome of a successful send
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub provider_message_id: String,
    pub rate_limit: RateLimitInfo,
}

/// Delivery failures, split by whether a retry can help
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The credential was rejected. Retrying with the same key is
    /// pointless, so this is terminal.
    #[error("API key rejected by provider")]
    InvalidApiKey,

    #[error("Provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl DeliveryError {
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::InvalidApiKey => false,
            DeliveryError::Provider { .. } | DeliveryError::Network(_) => true,
        }
    }
}

/// External delivery provider contract
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    async fn send(&self, api_key: &str, to: &str, text: &str)
        -> Result<SendReceipt, DeliveryError>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(alias = "msgId", alias = "id")]
    message_id: Option<String>,
}

/// HTTP client for the delivery provider
pub struct HttpDeliveryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDeliveryClient {
    pub fn new(config: &DeliveryConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    fn parse_rate_limit(headers: &reqwest::header::HeaderMap) -> RateLimitInfo {
        let header_int = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok())
        };

        RateLimitInfo {
            remaining: header_int("X-RateLimit-Remaining"),
            reset_after_secs: header_int("X-RateLimit-Reset").map(|v| v.max(0) as u64),
        }
    }
}

#[async_trait]
impl DeliveryApi for HttpDeliveryClient {
    async fn send(
        &self,
        api_key: &str,
        to: &str,
        text: &str,
    ) -> Result<SendReceipt, DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&SendRequest { to, text })
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        let rate_limit = Self::parse_rate_limit(response.headers());

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DeliveryError::InvalidApiKey);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: SendResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let provider_message_id = body.message_id.unwrap_or_default();
        debug!(provider_message_id = %provider_message_id, "message accepted by provider");

        Ok(SendReceipt {
            provider_message_id,
            rate_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> DeliveryConfig {
        DeliveryConfig {
            endpoint,
            api_key: None,
            request_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_successful_send_returns_receipt_with_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(bearer_token("key-1"))
            .and(body_json(serde_json::json!({
                "to": "+31612345678",
                "text": "hello"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message_id": "prov-42"}))
                    .insert_header("X-RateLimit-Remaining", "17")
                    .insert_header("X-RateLimit-Reset", "30"),
            )
            .mount(&server)
            .await;

        let client = HttpDeliveryClient::new(&config(format!("{}/send", server.uri()))).unwrap();
        let receipt = client.send("key-1", "+31612345678", "hello").await.unwrap();

        assert_eq!(receipt.provider_message_id, "prov-42");
        assert_eq!(receipt.rate_limit.remaining, Some(17));
        assert_eq!(receipt.rate_limit.reset_after_secs, Some(30));
    }

    #[tokio::test]
    async fn test_401_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = HttpDeliveryClient::new(&config(server.uri())).unwrap();
        let err = client.send("bad", "+123", "x").await.unwrap_err();

        assert!(matches!(err, DeliveryError::InvalidApiKey));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_5xx_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = HttpDeliveryClient::new(&config(server.uri())).unwrap();
        let err = client.send("key", "+123", "x").await.unwrap_err();

        match &err {
            DeliveryError::Provider { status, message } => {
                assert_eq!(*status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_rate_limit_headers_are_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "m-1"})),
            )
            .mount(&server)
            .await;

        let client = HttpDeliveryClient::new(&config(server.uri())).unwrap();
        let receipt = client.send("key", "+123", "x").await.unwrap();

        assert_eq!(receipt.provider_message_id, "m-1");
        assert_eq!(receipt.rate_limit, RateLimitInfo::default());
    }
}
