// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost calculation for the Concierge session engine.
//!
//! This crate provides:
//! - **Pricing**: a per-model table loaded from config with a mandatory default entry
//! - **Cost ledger**: a pure, deterministic `(model, input, output) -> USD` function

pub mod ledger;
pub mod pricing;

pub use ledger::CostLedger;
pub use pricing::{ModelPricing, PricingTable};
