// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for the Concierge session engine.
//!
//! This crate implements [`CompletionProvider`] for the Anthropic Messages API.
//! Replies are requested in one piece; there is no streaming.

pub mod client;
pub mod types;

use async_trait::async_trait;
use concierge_config::ConciergeConfig;
use concierge_core::{
    AdapterType, ChatTurn, CompletionProvider, CompletionRequest, CompletionResponse,
    ConciergeError, HealthStatus, PluginAdapter, Role, TokenUsage,
};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic Claude provider implementing [`CompletionProvider`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the given configuration.
    pub fn new(config: &ConciergeConfig) -> Result<Self, ConciergeError> {
        let api_key = resolve_api_key(&config.anthropic.api_key)?;
        let client = AnthropicClient::new(
            &api_key,
            &config.anthropic.api_version,
            &config.anthropic.base_url,
        )?;

        info!(endpoint = client.endpoint(), "Anthropic provider initialized");
        Ok(Self { client })
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: AnthropicClient) -> Self {
        Self { client }
    }
}

/// Converts a [`CompletionRequest`] into the Messages API shape.
///
/// The API requires the conversation to start with a user turn and to
/// alternate roles, so:
/// - operator turns are sent as assistant turns,
/// - assistant turns before the first user turn (the welcome message) are
///   folded into the system prompt,
/// - consecutive turns with the same role are joined with a blank line,
/// - the current message is appended as the final user turn.
fn to_message_request(request: &CompletionRequest) -> MessageRequest {
    let mut system = request.system_prompt.trim().to_string();
    let mut messages: Vec<ApiMessage> = Vec::new();

    let current = ChatTurn {
        role: Role::User,
        text: request.current_message.clone(),
    };
    for turn in request.history.iter().chain(std::iter::once(&current)) {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant | Role::HumanOperator => "assistant",
        };

        if messages.is_empty() && role == "assistant" {
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str("The conversation opened with this message from you:\n");
            system.push_str(&turn.text);
            continue;
        }

        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&turn.text);
            }
            _ => messages.push(ApiMessage {
                role: role.to_string(),
                content: turn.text.clone(),
            }),
        }
    }

    MessageRequest {
        model: request.model.clone(),
        messages,
        system: (!system.is_empty()).then_some(system),
        max_tokens: request.max_tokens,
        stream: false,
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ConciergeError> {
        let api_request = to_message_request(&request);
        debug!(
            model = %api_request.model,
            turns = api_request.messages.len(),
            "sending completion request"
        );

        let response = self.client.complete_message(&api_request).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ConciergeError::Provider {
                message: format!(
                    "empty reply from model (stop_reason: {})",
                    response.stop_reason.as_deref().unwrap_or("unknown")
                ),
                source: None,
            });
        }

        Ok(CompletionResponse {
            text,
            usage: TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
            model: response.model,
        })
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, ConciergeError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        ConciergeError::Config(
            "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn turn(role: Role, text: &str) -> ChatTurn {
        ChatTurn {
            role,
            text: text.into(),
        }
    }

    fn request(history: Vec<ChatTurn>, current: &str) -> CompletionRequest {
        CompletionRequest {
            model: "claude-sonnet-4-20250514".into(),
            system_prompt: "You are helpful.".into(),
            history,
            current_message: current.into(),
            business_context: None,
            max_tokens: 256,
        }
    }

    #[test]
    fn resolve_api_key_from_config() {
        assert_eq!(resolve_api_key(&Some("sk-test-123".into())).unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_empty_config_falls_back_to_env() {
        // Fails unless ANTHROPIC_API_KEY is set; either way never the empty string.
        if let Ok(key) = resolve_api_key(&Some(String::new())) {
            assert!(!key.is_empty());
        }
    }

    #[test]
    fn empty_history_sends_single_user_turn() {
        let req = to_message_request(&request(vec![], "Hello"));
        assert_eq!(req.messages, vec![ApiMessage::user("Hello")]);
        assert_eq!(req.system.as_deref(), Some("You are helpful."));
        assert_eq!(req.max_tokens, 256);
    }

    #[test]
    fn leading_welcome_folds_into_system_prompt() {
        let history = vec![
            turn(Role::Assistant, "Hi Ana! Welcome to Casa Pepe."),
            turn(Role::User, "Are you open?"),
            turn(Role::Assistant, "Yes, until 11pm."),
        ];
        let req = to_message_request(&request(history, "Great, thanks"));

        let system = req.system.unwrap();
        assert!(system.starts_with("You are helpful."));
        assert!(system.contains("Welcome to Casa Pepe"));
        assert_eq!(
            req.messages,
            vec![
                ApiMessage::user("Are you open?"),
                ApiMessage::assistant("Yes, until 11pm."),
                ApiMessage::user("Great, thanks"),
            ]
        );
    }

    #[test]
    fn operator_turns_are_assistant_and_same_roles_merge() {
        let history = vec![
            turn(Role::User, "hello"),
            turn(Role::Assistant, "hi"),
            turn(Role::HumanOperator, "I'm Marta from the front desk"),
            turn(Role::User, "still there?"),
        ];
        let req = to_message_request(&request(history, "anyone?"));
        assert_eq!(
            req.messages,
            vec![
                ApiMessage::user("hello"),
                ApiMessage::assistant("hi\n\nI'm Marta from the front desk"),
                ApiMessage::user("still there?\n\nanyone?"),
            ]
        );
    }

    #[tokio::test]
    async fn complete_maps_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-sonnet-4-20250514",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "We open at 9."}],
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 20}
            })))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("k", "2023-06-01", &server.uri())
            .unwrap()
            .with_retry_delay(Duration::ZERO);
        let provider = AnthropicProvider::with_client(client);
        let reply = provider.complete(request(vec![], "When do you open?")).await.unwrap();

        assert_eq!(reply.text, "We open at 9.");
        assert_eq!(reply.usage, TokenUsage::new(10, 20));
        assert_eq!(reply.usage.total_tokens, 30);
        assert_eq!(reply.model, "claude-sonnet-4-20250514");
    }

    #[tokio::test]
    async fn empty_reply_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_2",
                "type": "message",
                "role": "assistant",
                "content": [],
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "max_tokens",
                "usage": {"input_tokens": 10, "output_tokens": 0}
            })))
            .mount(&server)
            .await;

        let client = AnthropicClient::new("k", "2023-06-01", &server.uri()).unwrap();
        let provider = AnthropicProvider::with_client(client);
        let err = provider.complete(request(vec![], "hi")).await.unwrap_err();
        assert!(matches!(err, ConciergeError::Provider { .. }));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let client = AnthropicClient::new("test-key", "2023-06-01", "http://localhost").unwrap();
        let provider = AnthropicProvider::with_client(client);

        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.version(), semver::Version::new(0, 1, 0));
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
    }
}
