// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, a complete pricing table and non-negative prices.

use crate::diagnostic::ConfigError;
use crate::model::{ConciergeConfig, DEFAULT_PRICING_KEY, MAX_TTL_HOURS};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ConciergeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.agent.default_model.trim().is_empty() {
        fail("agent.default_model must not be empty".to_string());
    }

    if config.agent.welcome_template.trim().is_empty() {
        fail("agent.welcome_template must not be empty".to_string());
    }

    if config.agent.business_welcome_template.trim().is_empty() {
        fail("agent.business_welcome_template must not be empty".to_string());
    }

    if config.agent.apology_message.trim().is_empty() {
        fail("agent.apology_message must not be empty".to_string());
    }

    if config.agent.max_tokens == 0 {
        fail("agent.max_tokens must be greater than 0".to_string());
    }

    if config.cache.ttl_hours == 0 {
        fail("cache.ttl_hours must be greater than 0".to_string());
    } else if config.cache.ttl_hours > MAX_TTL_HOURS {
        fail(format!(
            "cache.ttl_hours must be at most {MAX_TTL_HOURS}, got {}",
            config.cache.ttl_hours
        ));
    }

    if config.places.timeout_secs == 0 {
        fail("places.timeout_secs must be greater than 0".to_string());
    }

    if !config.pricing.models.contains_key(DEFAULT_PRICING_KEY) {
        fail(format!(
            "pricing.models must contain a `{DEFAULT_PRICING_KEY}` entry"
        ));
    }

    for (model, price) in &config.pricing.models {
        if price.input_per_mtok < 0.0 || price.output_per_mtok < 0.0 {
            fail(format!(
                "pricing.models.{model} prices must be non-negative, got input={} output={}",
                price.input_per_mtok, price.output_per_mtok
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelPriceConfig;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = ConciergeConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ConciergeConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn missing_default_pricing_fails_validation() {
        let mut config = ConciergeConfig::default();
        config.pricing.models.remove(DEFAULT_PRICING_KEY);
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "`default` entry"));
    }

    #[test]
    fn negative_price_fails_validation() {
        let mut config = ConciergeConfig::default();
        config.pricing.models.insert(
            "cheap".to_string(),
            ModelPriceConfig {
                input_per_mtok: -1.0,
                output_per_mtok: 2.0,
            },
        );
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "pricing.models.cheap"));
    }

    #[test]
    fn oversized_ttl_fails_validation() {
        let mut config = ConciergeConfig::default();
        config.cache.ttl_hours = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "at most"));

        config.cache.ttl_hours = MAX_TTL_HOURS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ConciergeConfig::default();
        config.cache.ttl_hours = 0;
        config.agent.max_tokens = 0;
        config.agent.welcome_template = "  ".to_string();
        config.agent.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_error(&errors, "ttl_hours"));
        assert!(has_error(&errors, "max_tokens"));
        assert!(has_error(&errors, "welcome_template"));
        assert!(has_error(&errors, "log_level"));
    }
}
