// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Concierge session engine.

use thiserror::Error;

/// The primary error type used across all Concierge adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// A session, business, or message that was looked up does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The external business provider failed and no usable cache entry exists.
    ///
    /// Callers may retry the whole request later.
    #[error("business lookup unavailable for {business_id}")]
    LookupUnavailable {
        business_id: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The AI-completion capability failed.
    ///
    /// The orchestrator recovers from this by emitting an apology reply; the
    /// underlying message is logged, never shown to the end user.
    #[error("agent unavailable: {message}")]
    AgentUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed input, rejected before any store mutation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The policy check denied the action.
    #[error("forbidden: {action}: {reason}")]
    Forbidden { action: String, reason: String },

    /// Configuration errors (invalid TOML, missing keys, missing API keys).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Completion provider errors (API failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Raw external lookup adapter errors (HTTP failure, unexpected status).
    #[error("lookup error: {message}")]
    Lookup {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConciergeError {
    /// Shorthand for a [`ConciergeError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Returns true when retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LookupUnavailable { .. } | Self::Timeout { .. }
        )
    }

    /// Returns true for the not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
