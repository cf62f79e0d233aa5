// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory store trait for curated business records and agent profiles.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::types::{AgentProfile, AgentProfileKey, BusinessRecord};

/// Authoritative store of business records and stored agent profiles.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn get_business(&self, business_id: &str)
    -> Result<Option<BusinessRecord>, ConciergeError>;

    /// Inserts or fully replaces a business record.
    async fn upsert_business(&self, record: &BusinessRecord) -> Result<(), ConciergeError>;

    /// Returns the stored profile for `key`, if one was configured.
    async fn agent_profile(
        &self,
        key: &AgentProfileKey,
    ) -> Result<Option<AgentProfile>, ConciergeError>;

    async fn set_agent_profile(
        &self,
        key: &AgentProfileKey,
        profile: &AgentProfile,
    ) -> Result<(), ConciergeError>;
}
