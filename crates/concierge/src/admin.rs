// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrative commands over the local database.
//!
//! These run with direct database access, so they act with admin rights and
//! never reach the completion or lookup providers.

use std::path::PathBuf;

use colored::Colorize;
use concierge_config::ConciergeConfig;
use concierge_core::{
    AgentProfile, AgentProfileKey, BusinessRecord, ConciergeError, DetailCacheStore,
    DirectoryStore, Session, SessionScope, SessionStore, StorageAdapter,
};
use concierge_storage::SqliteStorage;
use tracing::info;

use crate::shell::print_message;

/// Opens and migrates the configured database.
pub(crate) async fn open_storage(config: &ConciergeConfig) -> Result<SqliteStorage, ConciergeError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

pub async fn list_sessions(
    config: &ConciergeConfig,
    business_id: Option<&str>,
    json: bool,
) -> Result<(), ConciergeError> {
    let storage = open_storage(config).await?;
    let sessions = storage
        .list_sessions(&SessionScope::from_business(business_id))
        .await?;

    if json {
        let out = serde_json::to_string_pretty(&sessions)
            .map_err(|e| ConciergeError::Internal(format!("failed to encode sessions: {e}")))?;
        println!("{out}");
    } else if sessions.is_empty() {
        println!("{}", "no sessions".dimmed());
    } else {
        for session in &sessions {
            println!("{}", session_line(session));
        }
    }

    storage.close().await
}

fn session_line(session: &Session) -> String {
    format!(
        "{}  {:<20} {:<16} {:>8} tok  ${:.4}  {}",
        session.id,
        session.participant_name,
        session.participant_phone,
        session.total_tokens,
        session.total_cost_usd,
        session.updated_at,
    )
}

pub async fn print_history(
    config: &ConciergeConfig,
    session_id: &str,
    business_id: Option<&str>,
) -> Result<(), ConciergeError> {
    let storage = open_storage(config).await?;
    let scope = SessionScope::from_business(business_id);
    let session = storage
        .get_session(session_id, &scope)
        .await?
        .ok_or_else(|| ConciergeError::not_found("session", session_id))?;

    println!(
        "{} {} ({})",
        "session".bold(),
        session.id,
        session.participant_name
    );
    for message in storage.get_history(session_id, &scope).await? {
        print_message(&message);
    }
    println!("{}", session_line(&session).dimmed());

    storage.close().await
}

pub async fn upsert_business(
    config: &ConciergeConfig,
    record: BusinessRecord,
) -> Result<(), ConciergeError> {
    if record.id.trim().is_empty() || record.name.trim().is_empty() {
        return Err(ConciergeError::Validation(
            "business id and name must not be blank".into(),
        ));
    }
    if record.agent_config.as_ref().is_some_and(AgentProfile::has_blank_field) {
        return Err(ConciergeError::Validation(
            "business agent config needs both a model and a system prompt".into(),
        ));
    }

    let storage = open_storage(config).await?;
    storage.upsert_business(&record).await?;
    info!(business_id = %record.id, status = %record.verification_status, "business stored");
    println!("{} {}", "stored".green(), record.id);
    storage.close().await
}

pub async fn show_business(config: &ConciergeConfig, business_id: &str) -> Result<(), ConciergeError> {
    let storage = open_storage(config).await?;
    let record = storage
        .get_business(business_id)
        .await?
        .ok_or_else(|| ConciergeError::not_found("business", business_id))?;
    let cached = storage.get_entry(business_id).await?;

    let out = serde_json::to_string_pretty(&serde_json::json!({
        "record": record,
        "cached_details": cached,
    }))
    .map_err(|e| ConciergeError::Internal(format!("failed to encode business: {e}")))?;
    println!("{out}");

    storage.close().await
}

pub async fn set_agent_profile(
    config: &ConciergeConfig,
    global: bool,
    owner: Option<String>,
    model: String,
    prompt: Option<String>,
    prompt_file: Option<PathBuf>,
) -> Result<(), ConciergeError> {
    let key = match (global, owner) {
        (true, _) => AgentProfileKey::Global,
        (false, Some(owner)) => AgentProfileKey::Owner(owner),
        (false, None) => {
            return Err(ConciergeError::Validation(
                "pass --global or --owner <id>".into(),
            ));
        }
    };

    let system_prompt_template = match (prompt, prompt_file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
            ConciergeError::Config(format!("failed to read {}: {e}", path.display()))
        })?,
        (None, None) => String::new(),
    };
    let profile = AgentProfile {
        model,
        system_prompt_template,
    };
    if profile.has_blank_field() {
        return Err(ConciergeError::Validation(
            "agent profile needs both a model and a system prompt".into(),
        ));
    }

    let storage = open_storage(config).await?;
    storage.set_agent_profile(&key, &profile).await?;
    println!("{} {}", "stored".green(), key.storage_key());
    storage.close().await
}
