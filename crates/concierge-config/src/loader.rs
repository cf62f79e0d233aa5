// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./concierge.toml` > `~/.config/concierge/concierge.toml` >
//! `/etc/concierge/concierge.toml` with environment variable overrides via `CONCIERGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ConciergeConfig;

const SYSTEM_CONFIG_PATH: &str = "/etc/concierge/concierge.toml";
const LOCAL_CONFIG_PATH: &str = "concierge.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/concierge/concierge.toml` (system-wide)
/// 3. `~/.config/concierge/concierge.toml` (user XDG config)
/// 4. `./concierge.toml` (local directory)
/// 5. `CONCIERGE_*` environment variables
pub fn load_config() -> Result<ConciergeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ConciergeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConciergeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Every file location consulted by [`load_config`], lowest precedence first.
pub fn config_paths() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(user) = user_config_path() {
        paths.push(user);
    }
    paths.push(std::path::PathBuf::from(LOCAL_CONFIG_PATH));
    paths
}

fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("concierge/concierge.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `CONCIERGE_CACHE_TTL_HOURS` must map to `cache.ttl_hours`,
/// not `cache.ttl.hours`.
fn env_provider() -> Env {
    Env::prefixed("CONCIERGE_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name onto its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["agent", "anthropic", "storage", "cache", "places"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
