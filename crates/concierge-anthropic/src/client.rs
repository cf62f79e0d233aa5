// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin client for the non-streaming Anthropic Messages API.

use std::time::Duration;

use concierge_core::ConciergeError;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const MESSAGES_PATH: &str = "/v1/messages";

/// Upper bound for one completion round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Posts message requests with auth headers and a single retry on
/// overload or server errors.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: String,
    retry_delay: Duration,
}

/// Outcome of one HTTP attempt.
enum Attempt {
    Done(MessageResponse),
    Transient(ConciergeError),
    Failed(ConciergeError),
}

impl AnthropicClient {
    /// `base_url` is the API origin; the Messages path is appended.
    pub fn new(api_key: &str, api_version: &str, base_url: &str) -> Result<Self, ConciergeError> {
        let header = |name: &str, value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| ConciergeError::Config(format!("invalid {name} header: {e}")))
        };
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header("x-api-key", api_key)?);
        headers.insert("anthropic-version", header("anthropic-version", api_version)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| provider_error("failed to build HTTP client", e))?;

        Ok(Self {
            http,
            endpoint: format!("{}{MESSAGES_PATH}", base_url.trim_end_matches('/')),
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Overrides the pause before the retry (tests use zero).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends `request`, retrying once on 429, 500, 503 or 529.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ConciergeError> {
        match self.attempt(request).await {
            Attempt::Done(response) => return Ok(response),
            Attempt::Failed(err) => return Err(err),
            Attempt::Transient(err) => {
                warn!(error = %err, delay_ms = self.retry_delay.as_millis() as u64, "transient completion failure, retrying once");
            }
        }

        tokio::time::sleep(self.retry_delay).await;
        match self.attempt(request).await {
            Attempt::Done(response) => Ok(response),
            Attempt::Transient(err) | Attempt::Failed(err) => Err(err),
        }
    }

    async fn attempt(&self, request: &MessageRequest) -> Attempt {
        let response = match self.http.post(&self.endpoint).json(request).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::Failed(ConciergeError::Timeout {
                    duration: REQUEST_TIMEOUT,
                });
            }
            Err(e) => return Attempt::Failed(provider_error("completion request failed", e)),
        };

        let status = response.status();
        debug!(%status, "completion response received");
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Failed(provider_error("failed to read completion body", e)),
        };

        if status.is_success() {
            return match serde_json::from_str::<MessageResponse>(&body) {
                Ok(parsed) => Attempt::Done(parsed),
                Err(e) => Attempt::Failed(provider_error("unexpected completion body", e)),
            };
        }

        let err = ConciergeError::Provider {
            message: describe_failure(status, &body),
            source: None,
        };
        if is_transient(status) {
            Attempt::Transient(err)
        } else {
            Attempt::Failed(err)
        }
    }
}

fn provider_error(
    context: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> ConciergeError {
    ConciergeError::Provider {
        message: format!("{context}: {source}"),
        source: Some(Box::new(source)),
    }
}

/// Prefers the structured API error, falling back to the raw body.
fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => format!("anthropic returned {status} ({}): {}", api.error.type_, api.error.message),
        Err(_) => format!("anthropic returned {status}: {body}"),
    }
}

fn is_transient(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> AnthropicClient {
        AnthropicClient::new("test-api-key", "2023-06-01", base_url)
            .unwrap()
            .with_retry_delay(Duration::ZERO)
    }

    fn test_request() -> MessageRequest {
        MessageRequest {
            model: "claude-sonnet-4-20250514".into(),
            messages: vec![ApiMessage::user("Hello")],
            system: None,
            max_tokens: 1024,
            stream: false,
        }
    }

    fn ok_body(id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        })
    }

    #[test]
    fn endpoint_joins_base_url_and_path() {
        let client = AnthropicClient::new("k", "2023-06-01", "https://api.anthropic.com/").unwrap();
        assert_eq!(client.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn invalid_header_value_is_config_error() {
        let err = AnthropicClient::new("bad\nkey", "2023-06-01", "http://x").unwrap_err();
        assert!(matches!(err, ConciergeError::Config(_)));
    }

    #[tokio::test]
    async fn complete_message_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("msg_test", "Hi there!")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_message(&test_request()).await.unwrap();

        assert_eq!(result.id, "msg_test");
        assert_eq!(result.usage.input_tokens, 10);
        assert_eq!(result.text(), "Hi there!");
    }

    #[tokio::test]
    async fn complete_message_retries_on_429() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "rate_limit_error", "message": "Rate limited"}
        });

        // First request returns 429, second returns 200.
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_json(&error_body))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("msg_retry", "After retry")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_message(&test_request()).await.unwrap();
        assert_eq!(result.id, "msg_retry");
    }

    #[tokio::test]
    async fn complete_message_fails_on_400_without_retry() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "invalid_request_error", "message": "Bad model"}
        });
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .complete_message(&test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_message_exhausts_retries_on_503() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "overloaded_error", "message": "Service overloaded"}
        });

        // Both attempts return 503.
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(503).set_body_json(&error_body))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .complete_message(&test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("overloaded_error"), "got: {err}");
    }

    #[tokio::test]
    async fn client_sends_correct_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("msg_headers", "ok")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.complete_message(&test_request()).await;
        assert!(result.is_ok(), "headers should match: {result:?}");
    }
}
