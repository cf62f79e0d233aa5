// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cost ledger: a pure mapping from model and token counts to USD.

use concierge_config::model::PricingConfig;
use concierge_core::{ConciergeError, TokenUsage};

use crate::pricing::{self, PricingTable};

/// Prices completions. Holds no state beyond the immutable pricing table.
#[derive(Debug, Clone)]
pub struct CostLedger {
    table: PricingTable,
}

impl CostLedger {
    pub fn new(table: PricingTable) -> Self {
        Self { table }
    }

    /// Builds a ledger from the `[pricing]` config section.
    pub fn from_config(config: &PricingConfig) -> Result<Self, ConciergeError> {
        PricingTable::from_config(config).map(Self::new)
    }

    /// Cost in USD of one completion. Unknown models use the default price.
    pub fn cost(&self, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        let pricing = self.table.get_pricing(model);
        pricing::calculate_cost(input_tokens, output_tokens, &pricing)
    }

    /// Cost in USD of a provider usage record.
    pub fn cost_for_usage(&self, model: &str, usage: &TokenUsage) -> f64 {
        self.cost(model, usage.input_tokens, usage.output_tokens)
    }

    pub fn table(&self) -> &PricingTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::pricing::ModelPricing;

    fn ledger() -> CostLedger {
        let models = HashMap::from([(
            "claude-opus-4-20250514".to_string(),
            ModelPricing {
                input_per_mtok: 15.0,
                output_per_mtok: 75.0,
            },
        )]);
        CostLedger::new(PricingTable::new(
            models,
            ModelPricing {
                input_per_mtok: 3.0,
                output_per_mtok: 15.0,
            },
        ))
    }

    #[test]
    fn unknown_model_costs_the_same_as_default() {
        let ledger = ledger();
        let default = ledger.table().default_pricing();
        for (input, output) in [(0, 0), (1, 1), (10, 20), (1_000_000, 250_000), (u32::MAX, 7)] {
            let expected = pricing::calculate_cost(input, output, &default);
            assert_eq!(ledger.cost("never-heard-of-it", input, output), expected);
        }
    }

    #[test]
    fn known_model_uses_its_own_price() {
        let ledger = ledger();
        let cost = ledger.cost("claude-opus-4-20250514", 1_000_000, 1_000_000);
        assert!((cost - 90.0).abs() < 1e-9);
    }

    #[test]
    fn cost_is_deterministic() {
        let ledger = ledger();
        let a = ledger.cost_for_usage("x", &TokenUsage::new(10, 20));
        let b = ledger.cost_for_usage("x", &TokenUsage::new(10, 20));
        assert_eq!(a, b);
        assert!(a > 0.0);
    }

    #[test]
    fn default_config_builds_a_ledger() {
        let ledger = CostLedger::from_config(&PricingConfig::default()).unwrap();
        assert!(ledger.cost("claude-sonnet-4-20250514", 10, 20) > 0.0);
    }
}
