// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-level agent configuration resolution.
//!
//! Business sessions use the owner's stored profile, then the record's own
//! `agent_config`. Global sessions use the stored global profile. Anything
//! unresolved falls back to the configured default. Resolution never fails.
//!
//! A profile that is found is used verbatim. Writers reject profiles with a
//! blank field (see [`AgentProfile::has_blank_field`]).

use std::sync::Arc;

use concierge_config::model::{AgentConfig, CURRENT_DATE_PLACEHOLDER};
use concierge_core::{
    AgentProfile, AgentProfileKey, BusinessRecord, Clock, DirectoryStore, SessionScope,
    format_timestamp,
};
use strum::Display;
use tracing::{debug, warn};

/// Where a resolved configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ProfileSource {
    Owner,
    Business,
    Global,
    Default,
}

/// Model and fully substituted system prompt for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAgent {
    pub model: String,
    pub system_prompt: String,
    pub source: ProfileSource,
}

pub struct AgentConfigResolver {
    directory: Arc<dyn DirectoryStore>,
    clock: Arc<dyn Clock>,
    default_profile: AgentProfile,
}

impl AgentConfigResolver {
    pub fn new(directory: Arc<dyn DirectoryStore>, clock: Arc<dyn Clock>, agent: &AgentConfig) -> Self {
        Self {
            directory,
            clock,
            default_profile: AgentProfile {
                model: agent.default_model.clone(),
                system_prompt_template: agent.load_default_system_prompt(),
            },
        }
    }

    /// Resolves the configuration for a session scope, reading the business
    /// record from the directory when the scope names one.
    pub async fn resolve(&self, scope: &SessionScope) -> ResolvedAgent {
        match scope {
            SessionScope::Global => self.resolve_global().await,
            SessionScope::Business(id) => match self.directory.get_business(id).await {
                Ok(Some(record)) => self.resolve_for_business(&record).await,
                Ok(None) => {
                    warn!(business_id = %id, "business not in directory, using default agent config");
                    self.finish(self.default_profile.clone(), ProfileSource::Default)
                }
                Err(e) => {
                    warn!(business_id = %id, error = %e, "directory read failed, using default agent config");
                    self.finish(self.default_profile.clone(), ProfileSource::Default)
                }
            },
        }
    }

    /// Resolves the configuration for an already loaded business record.
    pub async fn resolve_for_business(&self, record: &BusinessRecord) -> ResolvedAgent {
        if let Some(owner_id) = &record.owner_id {
            match self
                .directory
                .agent_profile(&AgentProfileKey::Owner(owner_id.clone()))
                .await
            {
                Ok(Some(profile)) => return self.finish(profile, ProfileSource::Owner),
                Ok(None) => {}
                Err(e) => {
                    warn!(business_id = %record.id, owner_id = %owner_id, error = %e, "owner profile read failed");
                }
            }
        }
        match &record.agent_config {
            Some(profile) => self.finish(profile.clone(), ProfileSource::Business),
            None => self.finish(self.default_profile.clone(), ProfileSource::Default),
        }
    }

    async fn resolve_global(&self) -> ResolvedAgent {
        match self.directory.agent_profile(&AgentProfileKey::Global).await {
            Ok(Some(profile)) => self.finish(profile, ProfileSource::Global),
            Ok(None) => self.finish(self.default_profile.clone(), ProfileSource::Default),
            Err(e) => {
                warn!(error = %e, "global profile read failed, using default agent config");
                self.finish(self.default_profile.clone(), ProfileSource::Default)
            }
        }
    }

    fn finish(&self, profile: AgentProfile, source: ProfileSource) -> ResolvedAgent {
        let AgentProfile {
            model,
            system_prompt_template,
        } = profile;
        let system_prompt = system_prompt_template
            .replace(CURRENT_DATE_PLACEHOLDER, &format_timestamp(self.clock.now()));
        debug!(model = %model, source = %source, "agent config resolved");
        ResolvedAgent {
            model,
            system_prompt,
            source,
        }
    }
}
