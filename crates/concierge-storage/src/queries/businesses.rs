// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory operations: business records and stored agent profiles.

use std::str::FromStr;

use concierge_core::{
    AgentProfile, AgentProfileKey, BusinessRecord, ConciergeError, VerificationStatus,
    format_timestamp,
};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

fn business_from_row(row: &Row<'_>) -> rusqlite::Result<BusinessRecord> {
    let status: String = row.get(4)?;
    let verification_status = VerificationStatus::from_str(&status)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    let model: Option<String> = row.get(6)?;
    let prompt: Option<String> = row.get(7)?;
    let agent_config = match (model, prompt) {
        (Some(model), Some(system_prompt_template)) => Some(AgentProfile {
            model,
            system_prompt_template,
        }),
        _ => None,
    };

    Ok(BusinessRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        owner_id: row.get(3)?,
        verification_status,
        agent_enabled: row.get(5)?,
        agent_config,
    })
}

pub async fn get_business(
    db: &Database,
    id: &str,
) -> Result<Option<BusinessRecord>, ConciergeError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<BusinessRecord>> {
            conn.query_row(
                "SELECT id, name, category, owner_id, verification_status, agent_enabled,
                        agent_model, agent_system_prompt
                 FROM businesses WHERE id = ?1",
                params![id],
                business_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a business or replace every field of an existing one.
pub async fn upsert_business(db: &Database, record: &BusinessRecord) -> Result<(), ConciergeError> {
    let record = record.clone();
    let now = format_timestamp(chrono::Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            let (model, prompt) = match record.agent_config {
                Some(profile) => (Some(profile.model), Some(profile.system_prompt_template)),
                None => (None, None),
            };
            conn.execute(
                "INSERT INTO businesses (id, name, category, owner_id, verification_status,
                     agent_enabled, agent_model, agent_system_prompt, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (id) DO UPDATE SET
                     name = excluded.name,
                     category = excluded.category,
                     owner_id = excluded.owner_id,
                     verification_status = excluded.verification_status,
                     agent_enabled = excluded.agent_enabled,
                     agent_model = excluded.agent_model,
                     agent_system_prompt = excluded.agent_system_prompt,
                     updated_at = excluded.updated_at",
                params![
                    record.id,
                    record.name,
                    record.category,
                    record.owner_id,
                    record.verification_status.to_string(),
                    record.agent_enabled,
                    model,
                    prompt,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_agent_profile(
    db: &Database,
    key: &AgentProfileKey,
) -> Result<Option<AgentProfile>, ConciergeError> {
    let key = key.storage_key();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<AgentProfile>> {
            conn.query_row(
                "SELECT model, system_prompt_template FROM agent_profiles WHERE key = ?1",
                params![key],
                |row| {
                    Ok(AgentProfile {
                        model: row.get(0)?,
                        system_prompt_template: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_agent_profile(
    db: &Database,
    key: &AgentProfileKey,
    profile: &AgentProfile,
) -> Result<(), ConciergeError> {
    let key = key.storage_key();
    let profile = profile.clone();
    let now = format_timestamp(chrono::Utc::now());
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO agent_profiles (key, model, system_prompt_template, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (key) DO UPDATE SET
                     model = excluded.model,
                     system_prompt_template = excluded.system_prompt_template,
                     updated_at = excluded.updated_at",
                params![key, profile.model, profile.system_prompt_template, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("dir.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    fn record(id: &str) -> BusinessRecord {
        BusinessRecord {
            id: id.to_string(),
            name: "Casa Pepe".into(),
            category: "restaurant".into(),
            owner_id: Some("owner-1".into()),
            verification_status: VerificationStatus::Approved,
            agent_enabled: true,
            agent_config: Some(AgentProfile {
                model: "claude-haiku-4-5-20250901".into(),
                system_prompt_template: "You work at Casa Pepe.".into(),
            }),
        }
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let (db, _dir) = setup_db().await;
        let rec = record("biz-1");
        upsert_business(&db, &rec).await.unwrap();
        assert_eq!(get_business(&db, "biz-1").await.unwrap(), Some(rec));
        assert_eq!(get_business(&db, "biz-404").await.unwrap(), None);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_fields() {
        let (db, _dir) = setup_db().await;
        upsert_business(&db, &record("biz-1")).await.unwrap();

        let mut changed = record("biz-1");
        changed.verification_status = VerificationStatus::Rejected;
        changed.agent_enabled = false;
        changed.agent_config = None;
        upsert_business(&db, &changed).await.unwrap();

        assert_eq!(get_business(&db, "biz-1").await.unwrap(), Some(changed));
    }

    #[tokio::test]
    async fn agent_profiles_are_keyed() {
        let (db, _dir) = setup_db().await;
        let global = AgentProfile {
            model: "m-global".into(),
            system_prompt_template: "global".into(),
        };
        let owner = AgentProfile {
            model: "m-owner".into(),
            system_prompt_template: "owner".into(),
        };
        set_agent_profile(&db, &AgentProfileKey::Global, &global).await.unwrap();
        set_agent_profile(&db, &AgentProfileKey::Owner("owner-1".into()), &owner)
            .await
            .unwrap();

        assert_eq!(
            get_agent_profile(&db, &AgentProfileKey::Global).await.unwrap(),
            Some(global)
        );
        assert_eq!(
            get_agent_profile(&db, &AgentProfileKey::Owner("owner-1".into()))
                .await
                .unwrap(),
            Some(owner.clone())
        );
        assert_eq!(
            get_agent_profile(&db, &AgentProfileKey::Owner("owner-2".into()))
                .await
                .unwrap(),
            None
        );

        let updated = AgentProfile {
            model: "m-owner-2".into(),
            ..owner
        };
        set_agent_profile(&db, &AgentProfileKey::Owner("owner-1".into()), &updated)
            .await
            .unwrap();
        assert_eq!(
            get_agent_profile(&db, &AgentProfileKey::Owner("owner-1".into()))
                .await
                .unwrap(),
            Some(updated)
        );
    }
}
