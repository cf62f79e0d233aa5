// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Concierge session engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Formats a timestamp the way every persisted record stores it.
///
/// Fixed-width millisecond precision keeps lexical and chronological order
/// identical, which the message history relies on.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses a timestamp produced by [`format_timestamp`] (or any RFC 3339 string).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Lookup,
}

// --- Sessions and messages ---

/// The partition a session lives in.
///
/// Sessions are stored either in the global collection or nested under the
/// business they belong to. Every lookup by session id or phone must name the
/// same partition the session was created under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionScope {
    /// The platform-wide assistant.
    Global,
    /// A business-specific assistant.
    Business(String),
}

impl SessionScope {
    /// Builds a scope from an optional business id.
    pub fn from_business(business_id: Option<&str>) -> Self {
        match business_id {
            Some(id) => Self::Business(id.to_string()),
            None => Self::Global,
        }
    }

    /// The storage partition key (`global` or `business:<id>`).
    pub fn partition_key(&self) -> String {
        match self {
            Self::Global => "global".to_string(),
            Self::Business(id) => format!("business:{id}"),
        }
    }

    /// Returns the business id for business-scoped sessions.
    pub fn business_id(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::Business(id) => Some(id),
        }
    }
}

impl std::fmt::Display for SessionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.partition_key())
    }
}

/// A persisted conversation session with running usage totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Absent for global sessions.
    pub business_id: Option<String>,
    pub participant_name: String,
    pub participant_phone: String,
    pub participant_email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_tokens: i64,
    pub total_cost_usd: f64,
}

impl Session {
    /// Creates a session with zeroed totals.
    pub fn new(
        scope: &SessionScope,
        participant_name: String,
        participant_phone: String,
        participant_email: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let ts = format_timestamp(now);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: scope.business_id().map(str::to_string),
            participant_name,
            participant_phone,
            participant_email,
            created_at: ts.clone(),
            updated_at: ts,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_tokens: 0,
            total_cost_usd: 0.0,
        }
    }

    /// The partition this session was created under.
    pub fn scope(&self) -> SessionScope {
        SessionScope::from_business(self.business_id.as_deref())
    }
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user.
    User,
    /// The AI assistant (including welcome and apology messages).
    Assistant,
    /// A human operator answering on behalf of the business or platform.
    HumanOperator,
}

/// Token counts reported by the completion provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Builds a usage record whose total is the sum of input and output.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// Back-reference to the message an operator is replying to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTo {
    pub message_id: String,
    pub text: String,
    pub author: String,
}

/// A single message within a session. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub role: Role,
    pub text: String,
    pub created_at: String,
    /// Only assistant replies produced by the completion provider carry usage.
    pub usage: Option<TokenUsage>,
    pub cost_usd: Option<f64>,
    /// Set for human-operator messages.
    pub author_name: Option<String>,
    pub reply_to: Option<ReplyTo>,
}

impl Message {
    /// Creates a plain message with no usage, author, or reply reference.
    pub fn new(session_id: &str, role: Role, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role,
            text: text.into(),
            created_at: format_timestamp(now),
            usage: None,
            cost_usd: None,
            author_name: None,
            reply_to: None,
        }
    }

    /// Attaches provider usage and the computed cost.
    pub fn with_usage(mut self, usage: TokenUsage, cost_usd: f64) -> Self {
        self.usage = Some(usage);
        self.cost_usd = Some(cost_usd);
        self
    }
}

// --- Directory ---

/// Moderation state of a business listing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unclaimed,
    Pending,
    Approved,
    Rejected,
}

/// A model id plus system prompt template controlling one assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub model: String,
    pub system_prompt_template: String,
}

impl AgentProfile {
    /// Both fields are required; stored profiles are used verbatim.
    pub fn has_blank_field(&self) -> bool {
        self.model.trim().is_empty() || self.system_prompt_template.trim().is_empty()
    }
}

/// Where a stored agent profile applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentProfileKey {
    /// The profile used by global sessions.
    Global,
    /// The profile an owner configured for their businesses.
    Owner(String),
}

impl AgentProfileKey {
    /// The storage key (`global` or `owner:<id>`).
    pub fn storage_key(&self) -> String {
        match self {
            Self::Global => "global".to_string(),
            Self::Owner(id) => format!("owner:{id}"),
        }
    }
}

/// The internally curated, authoritative record of a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub owner_id: Option<String>,
    pub verification_status: VerificationStatus,
    pub agent_enabled: bool,
    pub agent_config: Option<AgentProfile>,
}

/// A customer review returned by the external provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author: String,
    pub rating: Option<f64>,
    pub text: String,
    pub relative_time: Option<String>,
}

/// Rich, volatile business details from the external provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<u32>,
    #[serde(default)]
    pub opening_hours: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub maps_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl BusinessDetails {
    /// Overlays `newer` onto `self`: every field present in `newer` wins,
    /// absent or empty fields keep their previous value.
    pub fn merge(&mut self, newer: BusinessDetails) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        fn take_vec<T>(slot: &mut Vec<T>, value: Vec<T>) {
            if !value.is_empty() {
                *slot = value;
            }
        }

        take(&mut self.name, newer.name);
        take(&mut self.address, newer.address);
        take(&mut self.phone, newer.phone);
        take(&mut self.website, newer.website);
        take(&mut self.rating, newer.rating);
        take(&mut self.rating_count, newer.rating_count);
        take_vec(&mut self.opening_hours, newer.opening_hours);
        take_vec(&mut self.photos, newer.photos);
        take_vec(&mut self.reviews, newer.reviews);
        take(&mut self.maps_url, newer.maps_url);
        take_vec(&mut self.categories, newer.categories);
    }
}

/// A cache entry as stored, before any TTL decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDetails {
    pub business_id: String,
    pub details: BusinessDetails,
    pub cached_at: String,
}

/// The authoritative record merged with (optional) provider details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessContext {
    pub record: BusinessRecord,
    pub details: Option<BusinessDetails>,
}

impl BusinessContext {
    /// The display name, preferring the curated record over provider data.
    pub fn display_name(&self) -> &str {
        if !self.record.name.is_empty() {
            return &self.record.name;
        }
        self.details
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .unwrap_or(&self.record.id)
    }
}

// --- Completion ---

/// One prior turn handed to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
        }
    }
}

/// A request to the AI-completion capability.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    /// Prior turns, oldest first. May be empty.
    pub history: Vec<ChatTurn>,
    pub current_message: String,
    pub business_context: Option<BusinessContext>,
    pub max_tokens: u32,
}

/// The provider's reply plus the tokens it consumed.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
    /// Model that actually served the request.
    pub model: String,
}
