// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backing store for the business detail cache.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::types::CachedDetails;

/// Raw persistence of cache entries. TTL decisions are made by the caller.
#[async_trait]
pub trait DetailCacheStore: Send + Sync {
    async fn get_entry(&self, business_id: &str) -> Result<Option<CachedDetails>, ConciergeError>;

    /// Overwrites the entry for `entry.business_id`.
    async fn put_entry(&self, entry: &CachedDetails) -> Result<(), ConciergeError>;
}
