// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Concierge session engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the pricing entry used for unknown model ids.
pub const DEFAULT_PRICING_KEY: &str = "default";

/// Placeholder replaced with the current RFC 3339 timestamp in system prompts.
pub const CURRENT_DATE_PLACEHOLDER: &str = "{{currentDate}}";

/// Longest accepted `cache.ttl_hours` (ten years).
pub const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

/// Top-level Concierge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConciergeConfig {
    /// Assistant identity, default profile and canned texts.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Business detail cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// External places provider settings.
    #[serde(default)]
    pub places: PlacesConfig,

    /// Model pricing table.
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Assistant identity and default behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the platform assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Model used when no stored profile applies.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// System prompt template used when no stored profile applies.
    /// May contain `{{currentDate}}`.
    #[serde(default = "default_system_prompt")]
    pub default_system_prompt: String,

    /// Path to a markdown file holding the default system prompt.
    /// Takes precedence over `default_system_prompt` if both are set.
    #[serde(default)]
    pub default_system_prompt_file: Option<String>,

    /// Welcome text for global sessions. Supports `{{name}}` and `{{agent}}`.
    #[serde(default = "default_welcome_template")]
    pub welcome_template: String,

    /// Welcome text for business sessions. Supports `{{name}}` and `{{business}}`.
    #[serde(default = "default_business_welcome_template")]
    pub business_welcome_template: String,

    /// Reply persisted when the completion provider fails.
    #[serde(default = "default_apology_message")]
    pub apology_message: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            default_model: default_model(),
            default_system_prompt: default_system_prompt(),
            default_system_prompt_file: None,
            welcome_template: default_welcome_template(),
            business_welcome_template: default_business_welcome_template(),
            apology_message: default_apology_message(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl AgentConfig {
    /// Returns the default system prompt template, reading
    /// `default_system_prompt_file` when it is set.
    ///
    /// An unreadable file is logged and the inline template used instead.
    pub fn load_default_system_prompt(&self) -> String {
        let Some(path) = &self.default_system_prompt_file else {
            return self.default_system_prompt.clone();
        };
        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => {
                tracing::warn!(path = %path, "system prompt file is empty, using inline prompt");
                self.default_system_prompt.clone()
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "failed to read system prompt file, using inline prompt");
                self.default_system_prompt.clone()
            }
        }
    }
}

fn default_agent_name() -> String {
    "concierge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_system_prompt() -> String {
    "You are a friendly concierge assistant that helps people discover local businesses. \
     Answer concisely and only with information you are confident about. \
     The current date is {{currentDate}}."
        .to_string()
}

fn default_welcome_template() -> String {
    "Hi {{name}}! I'm {{agent}}, your concierge. How can I help you today?".to_string()
}

fn default_business_welcome_template() -> String {
    "Hi {{name}}! Welcome to {{business}}. How can I help you today?".to_string()
}

fn default_apology_message() -> String {
    "Sorry, I can't answer right now. Please try again in a moment.".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Base URL of the Messages API.
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
            base_url: default_anthropic_base_url(),
        }
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("concierge").join("concierge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("concierge.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Business detail cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Entries older than this are treated as absent.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// Serve an expired entry when the provider fails instead of erroring.
    #[serde(default)]
    pub serve_stale_on_failure: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            serve_stale_on_failure: false,
        }
    }
}

fn default_ttl_hours() -> u64 {
    720
}

/// External places provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlacesConfig {
    /// Provider API key. `None` requires the `PLACES_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_places_base_url")]
    pub base_url: String,

    /// Language requested for localized fields.
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_places_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_places_base_url(),
            language_code: default_language_code(),
            timeout_secs: default_places_timeout_secs(),
        }
    }
}

fn default_places_base_url() -> String {
    "https://places.googleapis.com/v1".to_string()
}

fn default_language_code() -> String {
    "en".to_string()
}

fn default_places_timeout_secs() -> u64 {
    10
}

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPriceConfig {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Pricing table keyed by exact model id, with a mandatory `default` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    #[serde(default = "default_pricing_models")]
    pub models: BTreeMap<String, ModelPriceConfig>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            models: default_pricing_models(),
        }
    }
}

fn default_pricing_models() -> BTreeMap<String, ModelPriceConfig> {
    // USD per MTok, Anthropic list prices.
    let price = |input_per_mtok, output_per_mtok| ModelPriceConfig {
        input_per_mtok,
        output_per_mtok,
    };
    BTreeMap::from([
        (DEFAULT_PRICING_KEY.to_string(), price(3.0, 15.0)),
        ("claude-sonnet-4-20250514".to_string(), price(3.0, 15.0)),
        ("claude-opus-4-20250514".to_string(), price(15.0, 75.0)),
        ("claude-haiku-4-5-20250901".to_string(), price(1.0, 5.0)),
        ("claude-3-5-haiku-20241022".to_string(), price(0.80, 4.0)),
    ])
}
