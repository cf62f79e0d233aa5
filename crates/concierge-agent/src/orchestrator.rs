// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session orchestrator: start or resume sessions, post participant and
//! operator messages, and read sessions back.
//!
//! The orchestrator is stateless between calls. Atomicity lives in the
//! [`SessionStore`]: a session is created together with its welcome message,
//! and each saved message applies its usage to the session totals in the
//! same transaction.

use std::sync::Arc;

use concierge_config::ConciergeConfig;
use concierge_context::{
    AgentConfigResolver, BusinessDetailCache, ResolvedAgent, compose_system_prompt,
    load_business_context,
};
use concierge_core::{
    AgentProfile, AgentProfileKey, BusinessContext, BusinessRecord, ChatTurn, Clock,
    CompletionProvider, CompletionRequest, ConciergeError, DirectoryStore, Message, ReplyTo, Role,
    Session, SessionScope, SessionStore,
};
use concierge_cost::CostLedger;
use tracing::{debug, error, info};

use crate::input::{normalise_email, normalise_name, normalise_phone, normalise_text};
use crate::policy::{Action, Actor, Resource, authorize};
use crate::welcome::WelcomeTemplates;

/// Input to [`SessionOrchestrator::start_or_resume`].
#[derive(Debug, Clone)]
pub struct StartSession {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub business_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub session: Session,
    pub history: Vec<Message>,
    pub is_resumed: bool,
}

/// Input to [`SessionOrchestrator::post_message`].
#[derive(Debug, Clone)]
pub struct PostMessage {
    pub session_id: String,
    pub business_id: Option<String>,
    pub text: String,
    /// History the caller already holds; loaded from the store when `None`.
    pub prior_history: Option<Vec<Message>>,
}

#[derive(Debug, Clone)]
pub struct PostOutcome {
    pub user_message: Message,
    /// The assistant reply, or the apology when the agent was unavailable.
    pub reply: Message,
    pub agent_unavailable: bool,
}

/// Input to [`SessionOrchestrator::post_operator_message`].
#[derive(Debug, Clone)]
pub struct PostOperatorMessage {
    pub session_id: String,
    pub business_id: Option<String>,
    pub text: String,
    pub author_name: String,
    pub reply_to: Option<ReplyTo>,
}

pub struct SessionOrchestrator {
    sessions: Arc<dyn SessionStore>,
    directory: Arc<dyn DirectoryStore>,
    cache: Arc<BusinessDetailCache>,
    resolver: AgentConfigResolver,
    provider: Arc<dyn CompletionProvider>,
    ledger: CostLedger,
    clock: Arc<dyn Clock>,
    welcome: WelcomeTemplates,
    apology_message: String,
    max_tokens: u32,
}

impl SessionOrchestrator {
    pub fn new(
        config: &ConciergeConfig,
        sessions: Arc<dyn SessionStore>,
        directory: Arc<dyn DirectoryStore>,
        cache: Arc<BusinessDetailCache>,
        provider: Arc<dyn CompletionProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConciergeError> {
        let ledger = CostLedger::from_config(&config.pricing)?;
        let resolver = AgentConfigResolver::new(directory.clone(), clock.clone(), &config.agent);
        Ok(Self {
            sessions,
            directory,
            cache,
            resolver,
            provider,
            ledger,
            clock,
            welcome: WelcomeTemplates::from_config(&config.agent),
            apology_message: config.agent.apology_message.clone(),
            max_tokens: config.agent.max_tokens,
        })
    }

    /// Returns the most recent session for `(phone, scope)` with its history,
    /// or creates one together with its welcome message.
    ///
    /// Find-then-create is not locked: two concurrent first contacts for the
    /// same phone and scope may both create a session.
    pub async fn start_or_resume(&self, req: StartSession) -> Result<StartOutcome, ConciergeError> {
        let name = normalise_name(&req.name)?;
        let phone = normalise_phone(&req.phone)?;
        let email = normalise_email(req.email.as_deref())?;
        let scope = SessionScope::from_business(req.business_id.as_deref());

        let record = self.load_business(&scope).await?;
        authorize(&Actor::Participant, resource_for(record.as_ref()), Action::StartSession)?;

        if let Some(session) = self.sessions.find_by_phone(&phone, &scope).await? {
            let history = self.sessions.get_history(&session.id, &scope).await?;
            info!(
                session_id = %session.id,
                scope = %scope,
                messages = history.len(),
                "session resumed"
            );
            return Ok(StartOutcome {
                session,
                history,
                is_resumed: true,
            });
        }

        let now = self.clock.now();
        let business_name = record.as_ref().map(business_display_name);
        let welcome_text = self.welcome.render(&name, business_name);
        let session = Session::new(&scope, name, phone, email, now);
        let welcome = Message::new(&session.id, Role::Assistant, welcome_text, now);

        let (session, welcome) = self
            .sessions
            .create_with_welcome_message(session, welcome)
            .await?;
        info!(session_id = %session.id, scope = %scope, "session created");

        Ok(StartOutcome {
            session,
            history: vec![welcome],
            is_resumed: false,
        })
    }

    /// Persists a participant message and the assistant's reply.
    ///
    /// A completion failure is not an error: an apology without usage is
    /// persisted instead and `agent_unavailable` is set. Storage errors and
    /// `LookupUnavailable` are returned; the user message may already have
    /// been saved by then.
    pub async fn post_message(&self, req: PostMessage) -> Result<PostOutcome, ConciergeError> {
        let text = normalise_text(&req.text)?;
        let scope = SessionScope::from_business(req.business_id.as_deref());

        let record = self.load_business(&scope).await?;
        authorize(&Actor::Participant, resource_for(record.as_ref()), Action::PostMessage)?;

        let user_message = Message::new(&req.session_id, Role::User, text.clone(), self.clock.now());
        let user_message = self.sessions.save_message(&scope, user_message).await?;
        debug!(session_id = %req.session_id, message_id = %user_message.id, "user message saved");

        let history = match req.prior_history {
            Some(history) => history,
            None => self.sessions.get_history(&req.session_id, &scope).await?,
        };
        let history: Vec<ChatTurn> = history
            .iter()
            .filter(|m| m.id != user_message.id)
            .map(ChatTurn::from)
            .collect();

        let (resolved, context) = match record {
            Some(record) => {
                let resolved = self.resolver.resolve_for_business(&record).await;
                let context = load_business_context(&self.cache, record).await?;
                (resolved, Some(context))
            }
            None => (self.resolver.resolve(&scope).await, None),
        };

        let reply = self
            .complete(&req.session_id, resolved, history, text, context)
            .await;
        let agent_unavailable = reply.is_err();
        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                let cause = std::error::Error::source(&e)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                error!(
                    session_id = %req.session_id,
                    error = %e,
                    cause = %cause,
                    "completion failed, sending apology"
                );
                Message::new(
                    &req.session_id,
                    Role::Assistant,
                    self.apology_message.clone(),
                    self.clock.now(),
                )
            }
        };
        let reply = self.sessions.save_message(&scope, reply).await?;

        Ok(PostOutcome {
            user_message,
            reply,
            agent_unavailable,
        })
    }

    /// Calls the provider and builds the priced assistant message.
    async fn complete(
        &self,
        session_id: &str,
        resolved: ResolvedAgent,
        history: Vec<ChatTurn>,
        current_message: String,
        context: Option<BusinessContext>,
    ) -> Result<Message, ConciergeError> {
        let request = CompletionRequest {
            model: resolved.model.clone(),
            system_prompt: compose_system_prompt(&resolved.system_prompt, context.as_ref()),
            history,
            current_message,
            business_context: context,
            max_tokens: self.max_tokens,
        };

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ConciergeError::AgentUnavailable {
                message: format!("{} provider failed", self.provider.name()),
                source: Some(Box::new(e)),
            })?;

        // Price by the model that actually served the request.
        let model = if response.model.is_empty() {
            resolved.model
        } else {
            response.model
        };
        let cost_usd = self.ledger.cost_for_usage(&model, &response.usage);
        info!(
            session_id = %session_id,
            model = %model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            cost_usd,
            "reply cost"
        );

        Ok(Message::new(session_id, Role::Assistant, response.text, self.clock.now())
            .with_usage(response.usage, cost_usd))
    }

    /// Persists a message written by a human operator. No completion call is
    /// made and the session totals are untouched.
    pub async fn post_operator_message(
        &self,
        actor: &Actor,
        req: PostOperatorMessage,
    ) -> Result<Message, ConciergeError> {
        let text = normalise_text(&req.text)?;
        let author_name = req.author_name.trim();
        if author_name.is_empty() {
            return Err(ConciergeError::Validation("operator author name is required".into()));
        }
        let scope = SessionScope::from_business(req.business_id.as_deref());

        let record = self.load_business(&scope).await?;
        authorize(actor, resource_for(record.as_ref()), Action::PostOperatorMessage)?;

        let mut message = Message::new(&req.session_id, Role::HumanOperator, text, self.clock.now());
        message.author_name = Some(author_name.to_string());
        message.reply_to = req.reply_to;

        let message = self.sessions.save_message(&scope, message).await?;
        info!(session_id = %req.session_id, author = %author_name, "operator message saved");
        Ok(message)
    }

    pub async fn get_history(
        &self,
        session_id: &str,
        business_id: Option<&str>,
    ) -> Result<Vec<Message>, ConciergeError> {
        let scope = SessionScope::from_business(business_id);
        self.require_session(session_id, &scope).await?;
        self.sessions.get_history(session_id, &scope).await
    }

    pub async fn get_session(
        &self,
        session_id: &str,
        business_id: Option<&str>,
    ) -> Result<Session, ConciergeError> {
        self.require_session(session_id, &SessionScope::from_business(business_id))
            .await
    }

    /// Sessions in a scope, most recently updated first.
    pub async fn list_sessions(
        &self,
        actor: &Actor,
        business_id: Option<&str>,
    ) -> Result<Vec<Session>, ConciergeError> {
        let scope = SessionScope::from_business(business_id);
        let record = self.load_business(&scope).await?;
        authorize(actor, resource_for(record.as_ref()), Action::ViewSessions)?;
        self.sessions.list_sessions(&scope).await
    }

    /// Stores an agent profile for the global assistant or for an owner.
    pub async fn set_agent_profile(
        &self,
        actor: &Actor,
        key: &AgentProfileKey,
        profile: &AgentProfile,
    ) -> Result<(), ConciergeError> {
        if profile.has_blank_field() {
            return Err(ConciergeError::Validation(
                "agent profile needs both a model and a system prompt".into(),
            ));
        }
        let resource = match key {
            AgentProfileKey::Global => Resource::Global,
            AgentProfileKey::Owner(owner_id) => Resource::OwnerProfile(owner_id),
        };
        authorize(actor, resource, Action::ManageAgentProfile)?;
        self.directory.set_agent_profile(key, profile).await?;
        info!(key = %key.storage_key(), model = %profile.model, "agent profile stored");
        Ok(())
    }

    /// Waits for background cache writes. Call before shutdown.
    pub async fn settle(&self) {
        self.cache.settle().await;
    }

    async fn require_session(
        &self,
        session_id: &str,
        scope: &SessionScope,
    ) -> Result<Session, ConciergeError> {
        self.sessions
            .get_session(session_id, scope)
            .await?
            .ok_or_else(|| ConciergeError::not_found("session", session_id))
    }

    /// The directory record for a business scope; `NotFound` when unknown.
    async fn load_business(
        &self,
        scope: &SessionScope,
    ) -> Result<Option<BusinessRecord>, ConciergeError> {
        let Some(business_id) = scope.business_id() else {
            return Ok(None);
        };
        self.directory
            .get_business(business_id)
            .await?
            .map(Some)
            .ok_or_else(|| ConciergeError::not_found("business", business_id))
    }
}

fn resource_for(record: Option<&BusinessRecord>) -> Resource<'_> {
    match record {
        Some(record) => Resource::Business(record),
        None => Resource::Global,
    }
}

fn business_display_name(record: &BusinessRecord) -> &str {
    if record.name.trim().is_empty() {
        &record.id
    } else {
        &record.name
    }
}
