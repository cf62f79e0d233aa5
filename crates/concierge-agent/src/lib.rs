// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session orchestration for the Concierge session engine.
//!
//! The [`SessionOrchestrator`] is the entry point for every conversation:
//! - starts or resumes a session for a participant in a scope
//! - persists participant messages and the assistant's priced replies
//! - records human operator messages
//! - reads sessions and histories back
//!
//! Authorization decisions go through [`policy`]; participant input is
//! normalised by [`input`] before anything is written.

pub mod input;
pub mod orchestrator;
pub mod policy;
pub mod welcome;

pub use orchestrator::{
    PostMessage, PostOperatorMessage, PostOutcome, SessionOrchestrator, StartOutcome,
    StartSession,
};
pub use policy::{Action, Actor, Decision, Resource, authorize, check};
