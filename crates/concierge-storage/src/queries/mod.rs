// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for operations on storage entities.

pub mod businesses;
pub mod details_cache;
pub mod messages;
pub mod sessions;
