// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-aside layer in front of the external business lookup.
//!
//! Entries are stored through [`DetailCacheStore`] and judged fresh or stale
//! against the injected [`Clock`]. An entry exactly `ttl` old is still a hit;
//! anything older is treated as absent. There is no size-based eviction.

use std::sync::{Arc, Mutex};

use chrono::Duration;
use concierge_config::model::{CacheConfig, MAX_TTL_HOURS};
use concierge_core::{
    BusinessDetails, BusinessLookup, CachedDetails, Clock, ConciergeError, DetailCacheStore,
    format_timestamp, parse_timestamp,
};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Time-bounded cache of provider details, keyed by business id.
pub struct BusinessDetailCache {
    store: Arc<dyn DetailCacheStore>,
    lookup: Arc<dyn BusinessLookup>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    serve_stale: bool,
    // Background writes started by `fetch`, drained by `settle`.
    pending: Mutex<JoinSet<()>>,
}

impl BusinessDetailCache {
    pub fn new(
        store: Arc<dyn DetailCacheStore>,
        lookup: Arc<dyn BusinessLookup>,
        clock: Arc<dyn Clock>,
        config: &CacheConfig,
    ) -> Self {
        let hours = config.ttl_hours.min(MAX_TTL_HOURS);
        if hours < config.ttl_hours {
            warn!(ttl_hours = config.ttl_hours, max = MAX_TTL_HOURS, "cache ttl clamped");
        }
        let ttl = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        Self {
            store,
            lookup,
            clock,
            ttl,
            serve_stale: config.serve_stale_on_failure,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The fresh entry for `business_id`, or `None` when absent or expired.
    pub async fn get(&self, business_id: &str) -> Result<Option<CachedDetails>, ConciergeError> {
        let Some(entry) = self.store.get_entry(business_id).await? else {
            debug!(business_id, "detail cache miss");
            return Ok(None);
        };
        if self.is_fresh(&entry) {
            debug!(business_id, cached_at = %entry.cached_at, "detail cache hit");
            Ok(Some(entry))
        } else {
            debug!(business_id, cached_at = %entry.cached_at, "detail cache entry expired");
            Ok(None)
        }
    }

    /// Merges `details` into the stored entry and resets `cached_at`.
    pub async fn set(
        &self,
        business_id: &str,
        details: BusinessDetails,
    ) -> Result<CachedDetails, ConciergeError> {
        write_entry(self.store.as_ref(), self.clock.as_ref(), business_id, details).await
    }

    /// Cache-aside read.
    ///
    /// A fresh hit is returned as is. On a miss the lookup is consulted, its
    /// result is written back in the background and returned immediately.
    /// Provider not-found maps to `NotFound`; provider failure maps to
    /// `LookupUnavailable` unless stale serving is enabled and an expired
    /// entry exists. Store read errors are returned as is.
    pub async fn fetch(&self, business_id: &str) -> Result<BusinessDetails, ConciergeError> {
        let existing = self.store.get_entry(business_id).await?;
        if let Some(entry) = &existing
            && self.is_fresh(entry)
        {
            debug!(business_id, cached_at = %entry.cached_at, "detail cache hit");
            return Ok(entry.details.clone());
        }
        debug!(business_id, "detail cache miss, querying lookup");

        match self.lookup.lookup(business_id).await {
            Ok(Some(details)) => {
                self.spawn_write(business_id, details.clone());
                Ok(details)
            }
            Ok(None) => Err(ConciergeError::not_found("business details", business_id)),
            Err(e) => match existing {
                Some(entry) if self.serve_stale => {
                    warn!(
                        business_id,
                        cached_at = %entry.cached_at,
                        error = %e,
                        "lookup failed, serving stale details"
                    );
                    Ok(entry.details)
                }
                _ => Err(ConciergeError::LookupUnavailable {
                    business_id: business_id.to_string(),
                    source: Some(Box::new(e)),
                }),
            },
        }
    }

    /// Waits for every background write started so far.
    pub async fn settle(&self) {
        let mut tasks = match self.pending.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "detail cache write task failed");
            }
        }
    }

    fn is_fresh(&self, entry: &CachedDetails) -> bool {
        match parse_timestamp(&entry.cached_at) {
            Some(cached_at) => self.clock.now() - cached_at <= self.ttl,
            None => {
                warn!(
                    business_id = %entry.business_id,
                    cached_at = %entry.cached_at,
                    "unparseable cache timestamp, treating entry as expired"
                );
                false
            }
        }
    }

    fn spawn_write(&self, business_id: &str, details: BusinessDetails) {
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let business_id = business_id.to_string();
        let task = async move {
            if let Err(e) = write_entry(store.as_ref(), clock.as_ref(), &business_id, details).await {
                warn!(business_id = %business_id, error = %e, "detail cache write failed");
            }
        };

        let mut guard = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Reap finished writes so the set does not grow without bound.
        while guard.try_join_next().is_some() {}
        guard.spawn(task);
    }
}

async fn write_entry(
    store: &dyn DetailCacheStore,
    clock: &dyn Clock,
    business_id: &str,
    details: BusinessDetails,
) -> Result<CachedDetails, ConciergeError> {
    let mut merged = store
        .get_entry(business_id)
        .await?
        .map(|entry| entry.details)
        .unwrap_or_default();
    merged.merge(details);

    let entry = CachedDetails {
        business_id: business_id.to_string(),
        details: merged,
        cached_at: format_timestamp(clock.now()),
    };
    store.put_entry(&entry).await?;
    debug!(business_id, "detail cache entry written");
    Ok(entry)
}
