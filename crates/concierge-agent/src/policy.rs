// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Centralised authorization for orchestrator operations.
//!
//! Every decision goes through [`check`]; callers that want an error use
//! [`authorize`], which turns a denial into [`ConciergeError::Forbidden`].

use concierge_core::{BusinessRecord, ConciergeError, VerificationStatus};
use strum::Display;

/// Who is acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Platform administrator.
    Admin { user_id: String },
    /// A signed-in platform user, possibly a business owner.
    User { user_id: String },
    /// Anonymous end user chatting with an assistant.
    Participant,
}

impl Actor {
    fn user_id(&self) -> Option<&str> {
        match self {
            Self::Admin { user_id } | Self::User { user_id } => Some(user_id),
            Self::Participant => None,
        }
    }
}

/// What is being acted upon.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// The platform-wide assistant and its sessions.
    Global,
    Business(&'a BusinessRecord),
    /// The agent profile an owner configured for their businesses.
    OwnerProfile(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    StartSession,
    PostMessage,
    PostOperatorMessage,
    ViewSessions,
    ManageAgentProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `actor` may perform `action` on `resource`.
pub fn check(actor: &Actor, resource: Resource<'_>, action: Action) -> Decision {
    if matches!(actor, Actor::Admin { .. }) {
        return Decision::Allow;
    }

    match action {
        Action::StartSession | Action::PostMessage => match resource {
            Resource::Global => Decision::Allow,
            Resource::Business(record) if record.agent_enabled => Decision::Allow,
            Resource::Business(record) => {
                Decision::Deny(format!("the assistant is disabled for business {}", record.id))
            }
            Resource::OwnerProfile(_) => Decision::Deny("not a conversation target".into()),
        },
        Action::PostOperatorMessage | Action::ViewSessions => match resource {
            Resource::Business(record) => owner_of_approved(actor, record),
            Resource::Global => Decision::Deny("global sessions are admin-only".into()),
            Resource::OwnerProfile(_) => Decision::Deny("not a session scope".into()),
        },
        Action::ManageAgentProfile => match resource {
            Resource::Business(record) => owner_of_approved(actor, record),
            Resource::OwnerProfile(owner_id) if actor.user_id() == Some(owner_id) => {
                Decision::Allow
            }
            Resource::OwnerProfile(_) => {
                Decision::Deny("only the owner may change their agent profile".into())
            }
            Resource::Global => Decision::Deny("the global profile is admin-only".into()),
        },
    }
}

fn owner_of_approved(actor: &Actor, record: &BusinessRecord) -> Decision {
    let is_owner = actor.user_id().is_some() && actor.user_id() == record.owner_id.as_deref();
    if !is_owner {
        return Decision::Deny(format!("not the owner of business {}", record.id));
    }
    if record.verification_status != VerificationStatus::Approved {
        return Decision::Deny(format!(
            "business {} is {}, not approved",
            record.id, record.verification_status
        ));
    }
    Decision::Allow
}

/// Like [`check`], but a denial becomes a `Forbidden` error.
pub fn authorize(actor: &Actor, resource: Resource<'_>, action: Action) -> Result<(), ConciergeError> {
    match check(actor, resource, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::debug!(action = %action, reason = %reason, "policy denied");
            Err(ConciergeError::Forbidden {
                action: action.to_string(),
                reason,
            })
        }
    }
}
