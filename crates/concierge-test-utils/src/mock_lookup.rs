// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock business lookup with call counting.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use concierge_core::{
    AdapterType, BusinessDetails, BusinessLookup, ConciergeError, HealthStatus, PluginAdapter,
};

/// Returns configured details per id; unknown ids are "not found".
/// While `set_failing(true)` every call errors.
#[derive(Default)]
pub struct MockLookup {
    details: Mutex<HashMap<String, BusinessDetails>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_details(self, business_id: &str, details: BusinessDetails) -> Self {
        self.insert(business_id, details);
        self
    }

    pub fn insert(&self, business_id: &str, details: BusinessDetails) {
        if let Ok(mut map) = self.details.lock() {
            map.insert(business_id.to_string(), details);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockLookup {
    fn name(&self) -> &str {
        "mock-lookup"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Lookup
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        Ok(())
    }
}

#[async_trait]
impl BusinessLookup for MockLookup {
    async fn lookup(&self, business_id: &str) -> Result<Option<BusinessDetails>, ConciergeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConciergeError::Lookup {
                message: format!("mock lookup down for {business_id}"),
                source: None,
            });
        }
        let map = self
            .details
            .lock()
            .map_err(|_| ConciergeError::Internal("mock lookup lock poisoned".into()))?;
        Ok(map.get(business_id).cloned())
    }
}
