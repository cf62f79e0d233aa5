// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter and store trait definitions.
//!
//! Pluggable backends extend the [`PluginAdapter`] base trait; all traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod cache;
pub mod directory;
pub mod lookup;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use cache::DetailCacheStore;
pub use directory::DirectoryStore;
pub use lookup::BusinessLookup;
pub use provider::CompletionProvider;
pub use storage::{SessionStore, StorageAdapter};
