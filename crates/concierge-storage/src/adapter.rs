// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage, session, directory and cache traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use concierge_config::model::StorageConfig;
use concierge_core::{
    AdapterType, AgentProfile, AgentProfileKey, BusinessRecord, CachedDetails, ConciergeError,
    DetailCacheStore, DirectoryStore, HealthStatus, Message, PluginAdapter, Session, SessionScope,
    SessionStore, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database (e.g. an in-memory one in tests).
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ConciergeError> {
        self.db.get().ok_or_else(|| ConciergeError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ConciergeError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ConciergeError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ConciergeError> {
        self.db()?.close().await
    }
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn create_with_welcome_message(
        &self,
        session: Session,
        welcome: Message,
    ) -> Result<(Session, Message), ConciergeError> {
        queries::sessions::create_with_welcome_message(self.db()?, session, welcome).await
    }

    async fn save_message(
        &self,
        scope: &SessionScope,
        message: Message,
    ) -> Result<Message, ConciergeError> {
        queries::messages::save_message(self.db()?, scope, message).await
    }

    async fn find_by_phone(
        &self,
        phone: &str,
        scope: &SessionScope,
    ) -> Result<Option<Session>, ConciergeError> {
        queries::sessions::find_by_phone(self.db()?, phone, scope).await
    }

    async fn get_history(
        &self,
        session_id: &str,
        scope: &SessionScope,
    ) -> Result<Vec<Message>, ConciergeError> {
        queries::messages::get_history(self.db()?, session_id, scope).await
    }

    async fn get_session(
        &self,
        session_id: &str,
        scope: &SessionScope,
    ) -> Result<Option<Session>, ConciergeError> {
        queries::sessions::get_session(self.db()?, session_id, scope).await
    }

    async fn list_sessions(&self, scope: &SessionScope) -> Result<Vec<Session>, ConciergeError> {
        queries::sessions::list_sessions(self.db()?, scope).await
    }
}

#[async_trait]
impl DirectoryStore for SqliteStorage {
    async fn get_business(
        &self,
        business_id: &str,
    ) -> Result<Option<BusinessRecord>, ConciergeError> {
        queries::businesses::get_business(self.db()?, business_id).await
    }

    async fn upsert_business(&self, record: &BusinessRecord) -> Result<(), ConciergeError> {
        queries::businesses::upsert_business(self.db()?, record).await
    }

    async fn agent_profile(
        &self,
        key: &AgentProfileKey,
    ) -> Result<Option<AgentProfile>, ConciergeError> {
        queries::businesses::get_agent_profile(self.db()?, key).await
    }

    async fn set_agent_profile(
        &self,
        key: &AgentProfileKey,
        profile: &AgentProfile,
    ) -> Result<(), ConciergeError> {
        queries::businesses::set_agent_profile(self.db()?, key, profile).await
    }
}

#[async_trait]
impl DetailCacheStore for SqliteStorage {
    async fn get_entry(&self, business_id: &str) -> Result<Option<CachedDetails>, ConciergeError> {
        queries::details_cache::get_entry(self.db()?, business_id).await
    }

    async fn put_entry(&self, entry: &CachedDetails) -> Result<(), ConciergeError> {
        queries::details_cache::put_entry(self.db()?, entry).await
    }
}
