// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge shell` command implementation.
//!
//! Launches an interactive REPL that plays the participant side of a
//! conversation. The session is found by phone number within the chosen
//! scope, so running the shell again with the same number resumes it.

use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use concierge_agent::{PostMessage, SessionOrchestrator, StartSession};
use concierge_anthropic::AnthropicProvider;
use concierge_config::ConciergeConfig;
use concierge_context::BusinessDetailCache;
use concierge_core::{
    AdapterType, BusinessDetails, BusinessLookup, ConciergeError, HealthStatus, Message,
    PluginAdapter, Role, StorageAdapter, SystemClock,
};
use concierge_places::PlacesLookup;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};

use crate::ShellArgs;
use crate::admin::open_storage;

/// Runs the `concierge shell` interactive REPL.
pub async fn run_shell(config: ConciergeConfig, args: ShellArgs) -> Result<(), ConciergeError> {
    let storage = Arc::new(open_storage(&config).await?);

    let provider = Arc::new(AnthropicProvider::new(&config).inspect_err(|_| {
        eprintln!(
            "error: Anthropic API key required. Set anthropic.api_key in config or the ANTHROPIC_API_KEY env var"
        );
    })?);
    let clock = Arc::new(SystemClock);
    let cache = Arc::new(BusinessDetailCache::new(
        storage.clone(),
        build_lookup(&config),
        clock.clone(),
        &config.cache,
    ));
    let orchestrator = SessionOrchestrator::new(
        &config,
        storage.clone(),
        storage.clone(),
        cache,
        provider,
        clock,
    )?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| ConciergeError::Internal(format!("failed to initialize readline: {e}")))?;

    let Some(name) = field_or_prompt(&mut rl, args.name, "name")? else {
        return storage.close().await;
    };
    let Some(phone) = field_or_prompt(&mut rl, args.phone, "phone")? else {
        return storage.close().await;
    };

    let started = orchestrator
        .start_or_resume(StartSession {
            name,
            phone,
            email: args.email,
            business_id: args.business.clone(),
        })
        .await?;
    let session_id = started.session.id.clone();
    let business_id = args.business;

    let heading = match &business_id {
        Some(id) => format!("concierge shell ({id})"),
        None => "concierge shell".to_string(),
    };
    println!("{}", heading.bold().green());
    if started.is_resumed {
        println!("{}", format!("resumed session {session_id}").dimmed());
    }
    println!("Type {} to exit, {} to reprint.\n", "/quit".yellow(), "/history".yellow());

    let mut history = started.history;
    for message in &history {
        print_message(message);
    }

    let prompt = format!("{}> ", "you".cyan());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let trimmed = line.trim();
        match trimmed {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                for message in &history {
                    print_message(message);
                }
                continue;
            }
            _ => {}
        }
        let _ = rl.add_history_entry(&line);

        let result = orchestrator
            .post_message(PostMessage {
                session_id: session_id.clone(),
                business_id: business_id.clone(),
                text: trimmed.to_string(),
                prior_history: Some(history.clone()),
            })
            .await;

        match result {
            Ok(outcome) => {
                print_message(&outcome.reply);
                history.push(outcome.user_message);
                history.push(outcome.reply);
            }
            Err(e) => {
                if matches!(e, ConciergeError::LookupUnavailable { .. }) {
                    eprintln!(
                        "{}",
                        "business details are unavailable right now, please try again".yellow()
                    );
                } else {
                    eprintln!("{}: {e}", "error".red());
                }
                // The user message may already be stored; resync before the next turn.
                history = orchestrator
                    .get_history(&session_id, business_id.as_deref())
                    .await?;
            }
        }
    }

    orchestrator.settle().await;
    let session = orchestrator
        .get_session(&session_id, business_id.as_deref())
        .await?;
    println!(
        "{}",
        format!(
            "session {}: {} tokens ({} in / {} out), ${:.4}",
            session.id,
            session.total_tokens,
            session.total_input_tokens,
            session.total_output_tokens,
            session.total_cost_usd
        )
        .dimmed()
    );
    storage.close().await
}

/// Uses the given value, or asks for it. `None` means the user bailed out.
fn field_or_prompt(
    rl: &mut DefaultEditor,
    value: Option<String>,
    label: &str,
) -> Result<Option<String>, ConciergeError> {
    if let Some(value) = value {
        return Ok(Some(value));
    }
    match rl.readline(&format!("{label}: ")) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(e) => Err(ConciergeError::Internal(format!("failed to read {label}: {e}"))),
    }
}

/// Builds the Places lookup, or a directory-only fallback when it is not
/// configured. With the fallback, business context is the record alone.
fn build_lookup(config: &ConciergeConfig) -> Arc<dyn BusinessLookup> {
    match PlacesLookup::new(&config.places) {
        Ok(lookup) => Arc::new(lookup),
        Err(e) => {
            warn!(error = %e, "places lookup disabled, business context limited to directory records");
            Arc::new(DirectoryOnlyLookup)
        }
    }
}

/// Knows no provider details for any business.
struct DirectoryOnlyLookup;

#[async_trait]
impl PluginAdapter for DirectoryOnlyLookup {
    fn name(&self) -> &str {
        "directory-only"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Lookup
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Degraded("places lookup not configured".into()))
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        Ok(())
    }
}

#[async_trait]
impl BusinessLookup for DirectoryOnlyLookup {
    async fn lookup(&self, business_id: &str) -> Result<Option<BusinessDetails>, ConciergeError> {
        info!(business_id, "no provider configured, skipping details");
        Ok(None)
    }
}

pub(crate) fn print_message(message: &Message) {
    let label = match message.role {
        Role::User => "you".cyan(),
        Role::Assistant => "assistant".green(),
        Role::HumanOperator => message
            .author_name
            .as_deref()
            .unwrap_or("operator")
            .magenta(),
    };
    if let Some(reply_to) = &message.reply_to {
        println!("  {}", format!("> {}: {}", reply_to.author, reply_to.text).dimmed());
    }
    match message.usage {
        Some(usage) => println!(
            "{label}: {} {}",
            message.text,
            format!("[{} tok]", usage.total_tokens).dimmed()
        ),
        None => println!("{label}: {}", message.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_lookup_knows_nothing() {
        let lookup = DirectoryOnlyLookup;
        assert_eq!(lookup.lookup("biz-1").await.unwrap(), None);
        assert_eq!(lookup.adapter_type(), AdapterType::Lookup);
    }
}
