// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context for completion calls: agent configuration resolution, the
//! business detail cache, and business context rendering.

pub mod business;
pub mod cache;
pub mod resolver;

pub use business::{compose_system_prompt, load_business_context, render_business_context};
pub use cache::BusinessDetailCache;
pub use resolver::{AgentConfigResolver, ProfileSource, ResolvedAgent};
