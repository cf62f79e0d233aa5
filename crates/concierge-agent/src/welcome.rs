// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic welcome texts.

use concierge_config::model::AgentConfig;

#[derive(Debug, Clone)]
pub struct WelcomeTemplates {
    agent_name: String,
    global: String,
    business: String,
}

impl WelcomeTemplates {
    pub fn from_config(agent: &AgentConfig) -> Self {
        Self {
            agent_name: agent.name.clone(),
            global: agent.welcome_template.clone(),
            business: agent.business_welcome_template.clone(),
        }
    }

    /// Fills `{{name}}`, `{{agent}}` and, for business sessions, `{{business}}`.
    pub fn render(&self, participant_name: &str, business_name: Option<&str>) -> String {
        let template = match business_name {
            Some(_) => &self.business,
            None => &self.global,
        };
        // Single pass, so placeholders inside substituted values stay literal.
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let value = after.find("}}").and_then(|end| {
                let value = match &after[..end] {
                    "name" => participant_name,
                    "agent" => self.agent_name.as_str(),
                    "business" => business_name.unwrap_or_default(),
                    _ => return None,
                };
                Some((value, end))
            });
            match value {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str("{{");
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
