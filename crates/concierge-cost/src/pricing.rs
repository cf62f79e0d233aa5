// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model pricing tables and cost calculation.
//!
//! Prices are USD per million tokens and come from the `[pricing.models]`
//! config table. Unknown model ids fall back to the mandatory `default` entry.

use std::collections::HashMap;

use concierge_config::model::{DEFAULT_PRICING_KEY, PricingConfig};
use concierge_core::{ConciergeError, TokenUsage};

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Cost per million input tokens.
    pub input_per_mtok: f64,
    /// Cost per million output tokens.
    pub output_per_mtok: f64,
}

/// Pricing lookup by exact model id.
#[derive(Debug, Clone)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
    default: ModelPricing,
}

impl PricingTable {
    /// Builds a table from explicit entries plus the fallback price.
    pub fn new(models: HashMap<String, ModelPricing>, default: ModelPricing) -> Self {
        Self { models, default }
    }

    /// Builds the table from configuration.
    ///
    /// Fails when the `default` entry is missing.
    pub fn from_config(config: &PricingConfig) -> Result<Self, ConciergeError> {
        let default = config
            .models
            .get(DEFAULT_PRICING_KEY)
            .map(|p| ModelPricing {
                input_per_mtok: p.input_per_mtok,
                output_per_mtok: p.output_per_mtok,
            })
            .ok_or_else(|| {
                ConciergeError::Config(format!(
                    "pricing table has no `{DEFAULT_PRICING_KEY}` entry"
                ))
            })?;

        let models = config
            .models
            .iter()
            .filter(|(id, _)| id.as_str() != DEFAULT_PRICING_KEY)
            .map(|(id, p)| {
                (
                    id.clone(),
                    ModelPricing {
                        input_per_mtok: p.input_per_mtok,
                        output_per_mtok: p.output_per_mtok,
                    },
                )
            })
            .collect();

        Ok(Self { models, default })
    }

    /// Look up pricing for a model id, falling back to the default entry.
    pub fn get_pricing(&self, model: &str) -> ModelPricing {
        self.models.get(model).copied().unwrap_or(self.default)
    }

    /// The fallback price used for unknown models.
    pub fn default_pricing(&self) -> ModelPricing {
        self.default
    }

    /// Returns true when `model` has its own entry.
    pub fn is_known(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }
}

/// Calculate cost in USD for raw token counts.
///
/// Formula: `input / 1e6 * price_in + output / 1e6 * price_out`.
pub fn calculate_cost(input_tokens: u32, output_tokens: u32, pricing: &ModelPricing) -> f64 {
    let input = (input_tokens as f64 / 1_000_000.0) * pricing.input_per_mtok;
    let output = (output_tokens as f64 / 1_000_000.0) * pricing.output_per_mtok;
    input + output
}

/// Calculate cost in USD for a provider usage record.
pub fn calculate_usage_cost(usage: &TokenUsage, pricing: &ModelPricing) -> f64 {
    calculate_cost(usage.input_tokens, usage.output_tokens, pricing)
}
