// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete orchestrator stack with mock adapters,
//! a temp SQLite database, and a manual clock. Helpers seed the directory
//! and drive conversations the way a front end would.

use std::sync::Arc;

use concierge_agent::{PostMessage, PostOutcome, SessionOrchestrator, StartOutcome, StartSession};
use concierge_config::ConciergeConfig;
use concierge_config::model::StorageConfig;
use concierge_context::BusinessDetailCache;
use concierge_core::{
    BusinessRecord, ConciergeError, DirectoryStore, StorageAdapter, VerificationStatus,
};
use concierge_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::mock_lookup::MockLookup;
use crate::mock_provider::{MockProvider, Scripted};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    script: Vec<Scripted>,
    lookup: MockLookup,
    config: ConciergeConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            script: Vec::new(),
            lookup: MockLookup::new(),
            config: ConciergeConfig::default(),
        }
    }

    /// Set the provider's scripted outcomes.
    pub fn with_script(mut self, script: Vec<Scripted>) -> Self {
        self.script = script;
        self
    }

    pub fn with_lookup(mut self, lookup: MockLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Adjust the configuration before the stack is built.
    pub fn with_config(mut self, configure: impl FnOnce(&mut ConciergeConfig)) -> Self {
        configure(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ConciergeError> {
        let temp_dir = tempfile::TempDir::new().map_err(ConciergeError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let clock = Arc::new(ManualClock::default());
        let provider = Arc::new(MockProvider::with_script(self.script));
        let lookup = Arc::new(self.lookup);

        let cache = Arc::new(BusinessDetailCache::new(
            storage.clone(),
            lookup.clone(),
            clock.clone(),
            &config.cache,
        ));
        let orchestrator = SessionOrchestrator::new(
            &config,
            storage.clone(),
            storage.clone(),
            cache.clone(),
            provider.clone(),
            clock.clone(),
        )?;

        Ok(TestHarness {
            orchestrator,
            storage,
            cache,
            provider,
            lookup,
            clock,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub orchestrator: SessionOrchestrator,
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub cache: Arc<BusinessDetailCache>,
    pub provider: Arc<MockProvider>,
    pub lookup: Arc<MockLookup>,
    pub clock: Arc<ManualClock>,
    pub config: ConciergeConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Registers an approved business with its agent enabled, owned by `owner-1`.
    pub async fn seed_business(&self, business_id: &str, name: &str) -> Result<BusinessRecord, ConciergeError> {
        let record = BusinessRecord {
            id: business_id.to_string(),
            name: name.to_string(),
            category: "restaurant".to_string(),
            owner_id: Some("owner-1".to_string()),
            verification_status: VerificationStatus::Approved,
            agent_enabled: true,
            agent_config: None,
        };
        self.storage.upsert_business(&record).await?;
        Ok(record)
    }

    pub async fn start(
        &self,
        name: &str,
        phone: &str,
        business_id: Option<&str>,
    ) -> Result<StartOutcome, ConciergeError> {
        self.orchestrator
            .start_or_resume(StartSession {
                name: name.to_string(),
                phone: phone.to_string(),
                email: None,
                business_id: business_id.map(str::to_string),
            })
            .await
    }

    /// Posts a participant message, letting the orchestrator load history.
    pub async fn post(
        &self,
        session_id: &str,
        business_id: Option<&str>,
        text: &str,
    ) -> Result<PostOutcome, ConciergeError> {
        self.orchestrator
            .post_message(PostMessage {
                session_id: session_id.to_string(),
                business_id: business_id.map(str::to_string),
                text: text.to_string(),
                prior_history: None,
            })
            .await
    }

    /// Waits for background cache writes and closes storage.
    pub async fn shutdown(&self) -> Result<(), ConciergeError> {
        self.orchestrator.settle().await;
        self.storage.close().await
    }
}
