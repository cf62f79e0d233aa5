// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Concierge integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - completion provider with scripted replies and failures
//! - [`MockLookup`] - business lookup with call counting
//! - [`ManualClock`] - clock moved by hand, for TTL tests
//! - [`TestHarness`] - orchestrator over a temp SQLite database

pub mod clock;
pub mod harness;
pub mod mock_lookup;
pub mod mock_provider;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_lookup::MockLookup;
pub use mock_provider::{MockProvider, Scripted};
