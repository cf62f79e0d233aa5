// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements [`CompletionProvider`] with a scripted queue of
//! replies and failures, and records every request it receives.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use concierge_core::{
    AdapterType, CompletionProvider, CompletionRequest, CompletionResponse, ConciergeError,
    HealthStatus, PluginAdapter, TokenUsage,
};

/// One scripted provider outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply { text: String, usage: TokenUsage },
    Fail(String),
}

impl Scripted {
    pub fn reply(text: impl Into<String>, input_tokens: u32, output_tokens: u32) -> Self {
        Self::Reply {
            text: text.into(),
            usage: TokenUsage::new(input_tokens, output_tokens),
        }
    }
}

/// A mock provider that returns pre-configured outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" with 10 input and 20 output tokens is returned.
#[derive(Default)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider pre-loaded with the given outcomes.
    pub fn with_script(script: Vec<Scripted>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(script))),
            requests: Arc::default(),
        }
    }

    /// Add an outcome to the end of the queue.
    pub async fn push(&self, outcome: Scripted) {
        self.script.lock().await.push_back(outcome);
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
impl CompletionProvider for MockProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ConciergeError> {
        let model = request.model.clone();
        self.requests.lock().await.push(request);

        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Scripted::reply("mock response", 10, 20));
        match outcome {
            Scripted::Reply { text, usage } => Ok(CompletionResponse { text, usage, model }),
            Scripted::Fail(message) => Err(ConciergeError::Provider {
                message,
                source: None,
            }),
        }
    }
}
