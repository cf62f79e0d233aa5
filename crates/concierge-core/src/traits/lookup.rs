// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External business lookup trait for third-party place providers.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::BusinessDetails;

/// Adapter for a third-party business information provider.
#[async_trait]
pub trait BusinessLookup: PluginAdapter {
    /// Fetches fresh details for a business.
    ///
    /// Returns `Ok(None)` when the provider does not know the id, and an error
    /// when the provider could not be reached or answered unexpectedly.
    async fn lookup(&self, business_id: &str) -> Result<Option<BusinessDetails>, ConciergeError>;
}
