// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw persistence of business detail cache entries.

use concierge_core::{BusinessDetails, CachedDetails, ConciergeError};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

pub async fn get_entry(
    db: &Database,
    business_id: &str,
) -> Result<Option<CachedDetails>, ConciergeError> {
    let business_id = business_id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<CachedDetails>> {
            conn.query_row(
                "SELECT business_id, details, cached_at FROM business_details_cache
                 WHERE business_id = ?1",
                params![business_id],
                |row| {
                    let raw: String = row.get(1)?;
                    let details = serde_json::from_str::<BusinessDetails>(&raw).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                    })?;
                    Ok(CachedDetails {
                        business_id: row.get(0)?,
                        details,
                        cached_at: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the entry for `entry.business_id`.
pub async fn put_entry(db: &Database, entry: &CachedDetails) -> Result<(), ConciergeError> {
    let details = serde_json::to_string(&entry.details).map_err(ConciergeError::storage)?;
    let business_id = entry.business_id.clone();
    let cached_at = entry.cached_at.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO business_details_cache (business_id, details, cached_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (business_id) DO UPDATE SET
                     details = excluded.details,
                     cached_at = excluded.cached_at",
                params![business_id, details, cached_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
