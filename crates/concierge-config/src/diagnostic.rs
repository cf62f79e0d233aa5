// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports deserialization failures without source positions. This
//! module turns them into miette diagnostics that point at the offending key
//! in the TOML file and suggest the closest valid key for typos.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key needs before it is offered as a fix.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem found while loading or validating.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(code(concierge::config::unknown_key), help("{}", unknown_key_help(suggestion.as_deref(), valid_keys)))]
    UnknownKey {
        key: String,
        /// Dotted table path, or `top level`.
        section: String,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(concierge::config::invalid_type), help("use a value of type {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(code(concierge::config::missing_key), help("add `{key} = ...` to concierge.toml"))]
    MissingKey { key: String },

    /// A value deserialized but failed a semantic check.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(concierge::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(concierge::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let valid = valid_keys.join(", ");
    match suggestion {
        Some(key) => format!("did you mean `{key}`? expected one of: {valid}"),
        None => format!("expected one of: {valid}"),
    }
}

/// Converts every error carried by `err` into a diagnostic.
///
/// `toml_sources` holds `(path, content)` pairs for the files that were
/// loaded; spans are attached when the offending key can be found in one.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &section, field, toml_sources).unzip();
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: describe_section(&section),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.iter().map(|k| k.to_string()).collect(),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    // For value errors the path ends with the key itself.
                    let (table, key) = match section.split_last() {
                        Some((key, table)) => (table.to_vec(), key.clone()),
                        None => (Vec::new(), String::new()),
                    };
                    let (span, src) = locate(&error, &table, &key, toml_sources).unzip();
                    ConfigError::InvalidType {
                        key: section.join("."),
                        detail: format!("found {actual}"),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: qualified(&section, field),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn describe_section(path: &[String]) -> String {
    if path.is_empty() {
        "top level".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

fn qualified(path: &[String], key: &str) -> String {
    path.iter()
        .map(String::as_str)
        .chain(std::iter::once(key))
        .collect::<Vec<_>>()
        .join(".")
}

/// Picks the source the error came from: the file named in its metadata,
/// or the only source when there is just one (inline strings).
fn locate(
    error: &figment::Error,
    table: &[String],
    key: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let (name, content) = match origin {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path)?,
        None if toml_sources.len() == 1 => &toml_sources[0],
        None => return None,
    };

    let offset = find_key_offset(content, table, key)?;
    Some((
        SourceSpan::new(offset.into(), key.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// Byte offset of `key` inside the `[table]` section of `content`.
///
/// Only lines between the section header and the next header are searched.
/// An empty `table` means the lines before the first header. Nested tables
/// are matched by their full dotted header first, then by the first segment.
pub fn find_key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let Some(first) = table.first() else {
        return scan_section(content, None, key);
    };
    let full = format!("[{}]", table.join("."));
    scan_section(content, Some(&full), key)
        .or_else(|| scan_section(content, Some(&format!("[{first}]")), key))
}

fn scan_section(content: &str, header: Option<&str>, key: &str) -> Option<usize> {
    let mut in_section = header.is_none();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            in_section = header.is_some_and(|h| trimmed.trim_end() == h);
        } else if in_section && is_assignment_of(trimmed, key) {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

fn is_assignment_of(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// The valid key closest to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Prints each diagnostic to stderr with miette's graphical renderer.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
