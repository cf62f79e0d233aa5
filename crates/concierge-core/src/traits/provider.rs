// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for the AI-completion capability.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for an LLM completion backend.
///
/// Treated as a black box: given a system prompt, prior turns and the
/// current message, it returns reply text plus token counts. It must accept
/// an empty history.
#[async_trait]
pub trait CompletionProvider: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ConciergeError>;
}
