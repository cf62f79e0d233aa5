// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use concierge_core::ConciergeError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Convert a tokio-rusqlite error into ConciergeError::Storage.
pub fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> ConciergeError
where
    tokio_rusqlite::Error<E>: std::error::Error + Send + Sync + 'static,
{
    ConciergeError::storage(e)
}

/// Handle to the single SQLite connection.
///
/// Query modules accept `&Database` and run their statements inside
/// `connection().call(..)`; an atomic unit is one transaction inside one call.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and run
    /// pending migrations.
    pub async fn open(path: &str) -> Result<Self, ConciergeError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, ConciergeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ConciergeError::storage)?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(ConciergeError::storage)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path = %path, wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database (tests and dry runs).
    pub async fn open_in_memory() -> Result<Self, ConciergeError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(ConciergeError::storage)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), ConciergeError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                }
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        let report = self
            .conn
            .call(|conn| crate::migrations::run_migrations(conn))
            .await
            .map_err(map_tr_err)?;
        for migration in report.applied_migrations() {
            debug!(version = migration.version(), name = migration.name(), "migration applied");
        }
        Ok(())
    }

    /// The shared tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn close(&self) -> Result<(), ConciergeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
