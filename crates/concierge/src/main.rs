// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concierge - a conversational assistant for local businesses.
//!
//! This is the binary entry point: an interactive participant shell plus a
//! handful of administrative commands over the local database.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod shell;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use concierge_config::ConciergeConfig;
use concierge_core::{AgentProfile, BusinessRecord, VerificationStatus};

/// Concierge - a conversational assistant for local businesses.
#[derive(Parser, Debug)]
#[command(name = "concierge", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the global assistant or a business assistant.
    Shell(ShellArgs),
    /// List sessions in a scope, most recently updated first.
    Sessions {
        /// Business whose sessions to list (global sessions when omitted).
        #[arg(long)]
        business: Option<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print the transcript of a session.
    History {
        session_id: String,
        #[arg(long)]
        business: Option<String>,
    },
    /// Manage directory records.
    Business {
        #[command(subcommand)]
        action: BusinessCommands,
    },
    /// Manage agent profiles.
    AgentProfile {
        #[command(subcommand)]
        action: AgentProfileCommands,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Args, Debug)]
struct ShellArgs {
    /// Talk to this business's assistant instead of the global one.
    #[arg(long)]
    business: Option<String>,
    /// Participant name (prompted when omitted).
    #[arg(long)]
    name: Option<String>,
    /// Participant phone number (prompted when omitted).
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

#[derive(Subcommand, Debug)]
enum BusinessCommands {
    /// Create or replace a directory record.
    Upsert {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long, default_value_t = VerificationStatus::Unclaimed)]
        status: VerificationStatus,
        /// Enable the business assistant.
        #[arg(long)]
        agent_enabled: bool,
        /// Per-business model override.
        #[arg(long, requires = "prompt")]
        model: Option<String>,
        /// Per-business system prompt override.
        #[arg(long, requires = "model")]
        prompt: Option<String>,
    },
    /// Show a record and its cached provider details.
    Show { id: String },
}

#[derive(Subcommand, Debug)]
enum AgentProfileCommands {
    /// Store the global profile or an owner's profile.
    Set {
        /// Set the profile used by global sessions.
        #[arg(long, conflicts_with = "owner", required_unless_present = "owner")]
        global: bool,
        /// Set the profile an owner's businesses use.
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        model: String,
        #[arg(long, conflicts_with = "prompt_file", required_unless_present = "prompt_file")]
        prompt: Option<String>,
        #[arg(long)]
        prompt_file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate configuration and print the effective settings.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            concierge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Shell(args)) => shell::run_shell(config, args).await,
        Some(Commands::Sessions { business, json }) => {
            admin::list_sessions(&config, business.as_deref(), json).await
        }
        Some(Commands::History {
            session_id,
            business,
        }) => admin::print_history(&config, &session_id, business.as_deref()).await,
        Some(Commands::Business { action }) => match action {
            BusinessCommands::Upsert {
                id,
                name,
                category,
                owner,
                status,
                agent_enabled,
                model,
                prompt,
            } => {
                let agent_config = model.zip(prompt).map(|(model, system_prompt_template)| AgentProfile {
                    model,
                    system_prompt_template,
                });
                let record = BusinessRecord {
                    id,
                    name,
                    category,
                    owner_id: owner,
                    verification_status: status,
                    agent_enabled,
                    agent_config,
                };
                admin::upsert_business(&config, record).await
            }
            BusinessCommands::Show { id } => admin::show_business(&config, &id).await,
        },
        Some(Commands::AgentProfile { action }) => match action {
            AgentProfileCommands::Set {
                global,
                owner,
                model,
                prompt,
                prompt_file,
            } => {
                admin::set_agent_profile(&config, global, owner, model, prompt, prompt_file).await
            }
        },
        Some(Commands::Config {
            action: ConfigCommands::Check,
        }) => {
            print_config_summary(&config);
            Ok(())
        }
        None => {
            println!("concierge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<ConciergeConfig, Vec<concierge_config::ConfigError>> {
    match path {
        Some(path) => concierge_config::load_and_validate_path(path),
        None => concierge_config::load_and_validate(),
    }
}

fn print_config_summary(config: &ConciergeConfig) {
    let key_state = |key: &Option<String>, env: &str| match key {
        Some(_) => "set in config".to_string(),
        None if std::env::var(env).is_ok() => format!("from {env}"),
        None => "missing".yellow().to_string(),
    };

    println!("{}", "config ok".green().bold());
    println!("  agent.name          {}", config.agent.name);
    println!("  agent.default_model {}", config.agent.default_model);
    println!("  storage.database    {}", config.storage.database_path);
    println!(
        "  cache.ttl_hours     {} (serve stale: {})",
        config.cache.ttl_hours, config.cache.serve_stale_on_failure
    );
    println!(
        "  anthropic.api_key   {}",
        key_state(&config.anthropic.api_key, "ANTHROPIC_API_KEY")
    );
    println!(
        "  places.api_key      {}",
        key_state(&config.places.api_key, "PLACES_API_KEY")
    );
    println!("  priced models       {}", config.pricing.models.len());
}

/// Initialize tracing subscriber with the configured log level.
///
/// `RUST_LOG` wins when set; otherwise our crates log at `log_level` and
/// everything else at `warn`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("concierge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_business_upsert() {
        let cli = Cli::try_parse_from([
            "concierge",
            "business",
            "upsert",
            "biz-1",
            "--name",
            "Casa Pepe",
            "--status",
            "approved",
            "--agent-enabled",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Business {
                action:
                    BusinessCommands::Upsert {
                        status,
                        agent_enabled,
                        ..
                    },
            }) => {
                assert_eq!(status, VerificationStatus::Approved);
                assert!(agent_enabled);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn agent_profile_requires_a_target() {
        let err = Cli::try_parse_from(["concierge", "agent-profile", "set", "--model", "m", "--prompt", "p"]);
        assert!(err.is_err());
    }

    #[test]
    fn business_override_needs_model_and_prompt() {
        let model_only = Cli::try_parse_from([
            "concierge", "business", "upsert", "biz-1", "--name", "Casa Pepe", "--model", "m",
        ]);
        assert!(model_only.is_err());

        let both = Cli::try_parse_from([
            "concierge", "business", "upsert", "biz-1", "--name", "Casa Pepe", "--model", "m",
            "--prompt", "p",
        ]);
        assert!(both.is_ok());
    }
}
