// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business context assembly: the curated record merged with cached
//! provider details, and its rendering into the system prompt.

use std::fmt::Write as _;

use concierge_core::{BusinessContext, BusinessRecord, ConciergeError};
use tracing::warn;

use crate::cache::BusinessDetailCache;

/// At most this many reviews are rendered into the prompt.
const MAX_PROMPT_REVIEWS: usize = 5;

/// Loads provider details for `record` and pairs them with it.
///
/// A business the provider does not know still gets a context built from the
/// record alone. `LookupUnavailable` is propagated.
pub async fn load_business_context(
    cache: &BusinessDetailCache,
    record: BusinessRecord,
) -> Result<BusinessContext, ConciergeError> {
    let details = match cache.fetch(&record.id).await {
        Ok(details) => Some(details),
        Err(e) if e.is_not_found() => {
            warn!(business_id = %record.id, "provider has no details for business");
            None
        }
        Err(e) => return Err(e),
    };
    Ok(BusinessContext { record, details })
}

/// Renders the context as a prompt section. Record fields win over provider data.
pub fn render_business_context(context: &BusinessContext) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Business you represent");
    let _ = writeln!(out, "Name: {}", context.display_name());
    if !context.record.category.is_empty() {
        let _ = writeln!(out, "Category: {}", context.record.category);
    }

    let Some(details) = &context.details else {
        return out;
    };
    if let Some(address) = &details.address {
        let _ = writeln!(out, "Address: {address}");
    }
    if let Some(phone) = &details.phone {
        let _ = writeln!(out, "Phone: {phone}");
    }
    if let Some(website) = &details.website {
        let _ = writeln!(out, "Website: {website}");
    }
    match (details.rating, details.rating_count) {
        (Some(rating), Some(count)) => {
            let _ = writeln!(out, "Rating: {rating:.1} ({count} reviews)");
        }
        (Some(rating), None) => {
            let _ = writeln!(out, "Rating: {rating:.1}");
        }
        _ => {}
    }
    if let Some(maps_url) = &details.maps_url {
        let _ = writeln!(out, "Map: {maps_url}");
    }
    if !details.opening_hours.is_empty() {
        let _ = writeln!(out, "Opening hours:");
        for line in &details.opening_hours {
            let _ = writeln!(out, "- {line}");
        }
    }
    if !details.reviews.is_empty() {
        let _ = writeln!(out, "Recent reviews:");
        for review in details.reviews.iter().take(MAX_PROMPT_REVIEWS) {
            let author = if review.author.is_empty() {
                "Anonymous"
            } else {
                &review.author
            };
            match review.rating {
                Some(rating) => {
                    let _ = writeln!(out, "- {author} ({rating:.0}/5): {}", review.text);
                }
                None => {
                    let _ = writeln!(out, "- {author}: {}", review.text);
                }
            }
        }
    }
    out
}

/// Appends the rendered business section to a resolved system prompt.
pub fn compose_system_prompt(system_prompt: &str, context: Option<&BusinessContext>) -> String {
    match context {
        Some(context) => format!(
            "{}\n\n{}",
            system_prompt.trim_end(),
            render_business_context(context).trim_end()
        ),
        None => system_prompt.to_string(),
    }
}
