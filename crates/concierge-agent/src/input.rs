// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Participant input normalisation. All checks run before any store mutation.

use concierge_core::ConciergeError;

const MIN_PHONE_DIGITS: usize = 6;
const MAX_PHONE_DIGITS: usize = 20;

/// Strips separators from a phone number and checks its shape.
///
/// Accepted: an optional leading `+` followed by 6 to 20 digits, once spaces,
/// `-`, `.`, `(` and `)` are removed.
pub fn normalise_phone(raw: &str) -> Result<String, ConciergeError> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '(' | ')'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConciergeError::Validation(format!(
            "phone number {raw:?} contains invalid characters"
        )));
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(ConciergeError::Validation(format!(
            "phone number {raw:?} must have {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits"
        )));
    }
    Ok(compact)
}

pub fn normalise_name(raw: &str) -> Result<String, ConciergeError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ConciergeError::Validation("participant name is required".into()));
    }
    Ok(name.to_string())
}

/// Blank input means no email.
pub fn normalise_email(raw: Option<&str>) -> Result<Option<String>, ConciergeError> {
    let Some(email) = raw.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(Some(email.to_string()))
        }
        _ => Err(ConciergeError::Validation(format!(
            "email {email:?} is not a valid address"
        ))),
    }
}

/// Message text, trimmed and required to be non-empty.
pub fn normalise_text(raw: &str) -> Result<String, ConciergeError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ConciergeError::Validation("message text is empty".into()));
    }
    Ok(text.to_string())
}
