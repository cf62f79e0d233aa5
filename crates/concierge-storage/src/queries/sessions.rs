// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session operations, including the atomic create-with-welcome unit.

use concierge_core::{ConciergeError, Message, Session, SessionScope};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::messages::insert_message_row;

const SESSION_COLUMNS: &str = "id, business_id, participant_name, participant_phone, \
     participant_email, created_at, updated_at, total_input_tokens, total_output_tokens, \
     total_tokens, total_cost_usd";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        business_id: row.get(1)?,
        participant_name: row.get(2)?,
        participant_phone: row.get(3)?,
        participant_email: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        total_input_tokens: row.get(7)?,
        total_output_tokens: row.get(8)?,
        total_tokens: row.get(9)?,
        total_cost_usd: row.get(10)?,
    })
}

/// Insert a session and its welcome message in one transaction.
pub async fn create_with_welcome_message(
    db: &Database,
    session: Session,
    welcome: Message,
) -> Result<(Session, Message), ConciergeError> {
    if welcome.session_id != session.id {
        return Err(ConciergeError::Validation(format!(
            "welcome message belongs to session {}, not {}",
            welcome.session_id, session.id
        )));
    }

    db.connection()
        .call(move |conn| -> rusqlite::Result<(Session, Message)> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO sessions (id, scope, business_id, participant_name, participant_phone,
                     participant_email, created_at, updated_at, total_input_tokens,
                     total_output_tokens, total_tokens, total_cost_usd)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    session.id,
                    session.scope().partition_key(),
                    session.business_id,
                    session.participant_name,
                    session.participant_phone,
                    session.participant_email,
                    session.created_at,
                    session.updated_at,
                    session.total_input_tokens,
                    session.total_output_tokens,
                    session.total_tokens,
                    session.total_cost_usd,
                ],
            )?;
            insert_message_row(&tx, &welcome)?;
            tx.commit()?;
            Ok((session, welcome))
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by id within its scope.
pub async fn get_session(
    db: &Database,
    id: &str,
    scope: &SessionScope,
) -> Result<Option<Session>, ConciergeError> {
    let id = id.to_string();
    let scope = scope.partition_key();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Session>> {
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 AND scope = ?2"),
                params![id, scope],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently created session for a phone number within a scope.
pub async fn find_by_phone(
    db: &Database,
    phone: &str,
    scope: &SessionScope,
) -> Result<Option<Session>, ConciergeError> {
    let phone = phone.to_string();
    let scope = scope.partition_key();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<Session>> {
            conn.query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE scope = ?1 AND participant_phone = ?2
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params![scope, phone],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All sessions in a scope, most recently updated first.
pub async fn list_sessions(
    db: &Database,
    scope: &SessionScope,
) -> Result<Vec<Session>, ConciergeError> {
    let scope = scope.partition_key();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<Session>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE scope = ?1
                 ORDER BY updated_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![scope], session_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
