// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations and the save-with-aggregate-increment unit.

use std::str::FromStr;

use concierge_core::{ConciergeError, Message, ReplyTo, Role, SessionScope, TokenUsage};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::database::{Database, map_tr_err};

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let role = Role::from_str(&role)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    let input: Option<u32> = row.get(5)?;
    let output: Option<u32> = row.get(6)?;
    let total: Option<u32> = row.get(7)?;
    let usage = match (input, output, total) {
        (Some(input_tokens), Some(output_tokens), Some(total_tokens)) => Some(TokenUsage {
            input_tokens,
            output_tokens,
            total_tokens,
        }),
        _ => None,
    };

    let reply_to: Option<String> = row.get(10)?;
    let reply_to = reply_to
        .map(|raw| serde_json::from_str::<ReplyTo>(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role,
        text: row.get(3)?,
        created_at: row.get(4)?,
        usage,
        cost_usd: row.get(8)?,
        author_name: row.get(9)?,
        reply_to,
    })
}

/// Insert one message row on an open connection or transaction.
pub(crate) fn insert_message_row(conn: &Connection, message: &Message) -> rusqlite::Result<()> {
    let reply_to = message
        .reply_to
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO messages (id, session_id, role, text, created_at, input_tokens,
             output_tokens, total_tokens, cost_usd, author_name, reply_to)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            message.id,
            message.session_id,
            message.role.to_string(),
            message.text,
            message.created_at,
            message.usage.map(|u| u.input_tokens),
            message.usage.map(|u| u.output_tokens),
            message.usage.map(|u| u.total_tokens),
            message.cost_usd,
            message.author_name,
            reply_to,
        ],
    )?;
    Ok(())
}

/// Append a message and apply its usage to the session totals atomically.
///
/// The totals are incremented in SQL (`total = total + ?`) inside the same
/// transaction as the insert, so concurrent saves for one session never lose
/// an update. Messages without usage only bump `updated_at`, which never
/// moves backwards when saves commit out of timestamp order.
pub async fn save_message(
    db: &Database,
    scope: &SessionScope,
    message: Message,
) -> Result<Message, ConciergeError> {
    let scope_key = scope.partition_key();
    let session_id = message.session_id.clone();

    let saved = db
        .connection()
        .call(move |conn| -> rusqlite::Result<Option<Message>> {
            let tx = conn.transaction()?;

            let usage = message.usage.unwrap_or_default();
            let cost = message.cost_usd.unwrap_or(0.0);
            let updated = tx.execute(
                "UPDATE sessions SET
                     updated_at = MAX(updated_at, ?1),
                     total_input_tokens = total_input_tokens + ?2,
                     total_output_tokens = total_output_tokens + ?3,
                     total_tokens = total_tokens + ?4,
                     total_cost_usd = total_cost_usd + ?5
                 WHERE id = ?6 AND scope = ?7",
                params![
                    message.created_at,
                    usage.input_tokens,
                    usage.output_tokens,
                    usage.total_tokens,
                    cost,
                    message.session_id,
                    scope_key,
                ],
            )?;
            if updated == 0 {
                // Dropping the transaction rolls it back.
                return Ok(None);
            }

            insert_message_row(&tx, &message)?;
            tx.commit()?;
            Ok(Some(message))
        })
        .await
        .map_err(map_tr_err)?;

    match saved {
        Some(message) => {
            debug!(
                session_id = %message.session_id,
                message_id = %message.id,
                role = %message.role,
                "message saved"
            );
            Ok(message)
        }
        None => Err(ConciergeError::not_found("session", session_id)),
    }
}

/// Messages of a session in its scope, oldest first (insertion order on ties).
pub async fn get_history(
    db: &Database,
    session_id: &str,
    scope: &SessionScope,
) -> Result<Vec<Message>, ConciergeError> {
    let session_id = session_id.to_string();
    let scope = scope.partition_key();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<Message>> {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.session_id, m.role, m.text, m.created_at, m.input_tokens,
                        m.output_tokens, m.total_tokens, m.cost_usd, m.author_name, m.reply_to
                 FROM messages m
                 JOIN sessions s ON s.id = m.session_id
                 WHERE m.session_id = ?1 AND s.scope = ?2
                 ORDER BY m.created_at ASC, m.rowid ASC",
            )?;
            let rows = stmt.query_map(params![session_id, scope], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
