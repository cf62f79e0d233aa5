// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter traits for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Message, Session, SessionScope};

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections
/// and provide the foundation for sessions, the business directory
/// and the detail cache.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ConciergeError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), ConciergeError>;
}

/// Persistence of sessions and their append-only message history.
///
/// Every read that names a session id also names the scope the session was
/// created under; a session is invisible from any other scope.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a new session together with its first (welcome) message.
    ///
    /// Either both rows exist afterwards or neither does.
    async fn create_with_welcome_message(
        &self,
        session: Session,
        welcome: Message,
    ) -> Result<(Session, Message), ConciergeError>;

    /// Appends a message and, when it carries usage and cost, increments the
    /// parent session's totals in the same atomic unit.
    ///
    /// Returns `NotFound` if the session does not exist in `scope`.
    async fn save_message(
        &self,
        scope: &SessionScope,
        message: Message,
    ) -> Result<Message, ConciergeError>;

    /// Returns the most recently created session for `phone` in `scope`.
    async fn find_by_phone(
        &self,
        phone: &str,
        scope: &SessionScope,
    ) -> Result<Option<Session>, ConciergeError>;

    /// Returns the session's messages, oldest first.
    async fn get_history(
        &self,
        session_id: &str,
        scope: &SessionScope,
    ) -> Result<Vec<Message>, ConciergeError>;

    async fn get_session(
        &self,
        session_id: &str,
        scope: &SessionScope,
    ) -> Result<Option<Session>, ConciergeError>;

    /// Lists every session in `scope`, most recently updated first.
    async fn list_sessions(&self, scope: &SessionScope) -> Result<Vec<Session>, ConciergeError>;
}
