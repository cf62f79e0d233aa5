// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end orchestrator scenarios over a temp SQLite database.

use std::sync::Arc;

use chrono::Duration;
use concierge_agent::{Actor, PostMessage, PostOperatorMessage};
use concierge_core::{BusinessDetails, ConciergeError, ReplyTo, Role, SessionStore, SessionScope};
use concierge_cost::CostLedger;
use concierge_test_utils::{MockLookup, Scripted, TestHarness};

const PHONE: &str = "+34600000000";

fn casa_pepe_details() -> BusinessDetails {
    BusinessDetails {
        name: Some("Casa Pepe".into()),
        address: Some("Calle Mayor 1, Madrid".into()),
        opening_hours: vec!["Monday: 9:00 AM – 11:00 PM".into()],
        ..Default::default()
    }
}

async fn business_harness(script: Vec<Scripted>) -> TestHarness {
    let harness = TestHarness::builder()
        .with_script(script)
        .with_lookup(MockLookup::new().with_details("biz-1", casa_pepe_details()))
        .build()
        .await
        .unwrap();
    harness.seed_business("biz-1", "Casa Pepe").await.unwrap();
    harness
}

#[tokio::test]
async fn business_conversation_accumulates_usage_and_resumes() {
    let h = business_harness(vec![
        Scripted::reply("We open at 9.", 10, 20),
        Scripted::reply("See you!", 5, 5),
    ])
    .await;

    let started = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();
    assert!(!started.is_resumed);
    assert_eq!(started.history.len(), 1);
    assert_eq!(started.history[0].role, Role::Assistant);
    assert!(started.history[0].text.contains("Casa Pepe"));
    assert_eq!(started.session.business_id.as_deref(), Some("biz-1"));
    let session_id = started.session.id.clone();

    let first = h.post(&session_id, Some("biz-1"), "When do you open?").await.unwrap();
    assert!(!first.agent_unavailable);
    assert_eq!(first.reply.text, "We open at 9.");
    assert_eq!(first.reply.usage.map(|u| u.total_tokens), Some(30));

    let second = h.post(&session_id, Some("biz-1"), "Thanks").await.unwrap();
    assert_eq!(second.reply.usage.map(|u| u.total_tokens), Some(10));

    let session = h.orchestrator.get_session(&session_id, Some("biz-1")).await.unwrap();
    assert_eq!(session.total_input_tokens, 15);
    assert_eq!(session.total_output_tokens, 25);
    assert_eq!(session.total_tokens, 40);
    let ledger = CostLedger::from_config(&h.config.pricing).unwrap();
    let model = &h.config.agent.default_model;
    let expected = ledger.cost(model, 10, 20) + ledger.cost(model, 5, 5);
    assert!((session.total_cost_usd - expected).abs() < 1e-12);
    // 3 USD/MTok in and 15 USD/MTok out.
    assert!((session.total_cost_usd - 0.00042).abs() < 1e-12);

    let resumed = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();
    assert!(resumed.is_resumed);
    assert_eq!(resumed.session.id, session_id);
    let roles: Vec<_> = resumed.history.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn provider_failure_persists_apology_without_usage() {
    let h = business_harness(vec![Scripted::Fail("upstream 529".into())]).await;
    let started = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();

    let outcome = h.post(&started.session.id, Some("biz-1"), "Hello?").await.unwrap();
    assert!(outcome.agent_unavailable);
    assert_eq!(outcome.reply.role, Role::Assistant);
    assert_eq!(outcome.reply.text, h.config.agent.apology_message);
    assert!(outcome.reply.usage.is_none());
    assert!(outcome.reply.cost_usd.is_none());

    let session = h
        .orchestrator
        .get_session(&started.session.id, Some("biz-1"))
        .await
        .unwrap();
    assert_eq!(session.total_tokens, 0);
    assert_eq!(session.total_cost_usd, 0.0);

    let history = h
        .orchestrator
        .get_history(&started.session.id, Some("biz-1"))
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].text, "Hello?");
}

#[tokio::test]
async fn resuming_twice_keeps_one_session() {
    let h = TestHarness::builder().build().await.unwrap();
    let a = h.start("Ana", PHONE, None).await.unwrap();
    let b = h.start("Ana", PHONE, None).await.unwrap();
    let c = h.start("Ana María", PHONE, None).await.unwrap();

    assert!(!a.is_resumed);
    assert!(b.is_resumed && c.is_resumed);
    assert_eq!(a.session.id, b.session.id);
    assert_eq!(a.session.id, c.session.id);
    assert_eq!(c.history.len(), 1);

    let admin = Actor::Admin {
        user_id: "root".into(),
    };
    let listed = h.orchestrator.list_sessions(&admin, None).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn global_and_business_sessions_are_partitioned() {
    let h = business_harness(vec![]).await;
    let global = h.start("Ana", PHONE, None).await.unwrap();
    let business = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();

    assert_ne!(global.session.id, business.session.id);
    assert!(!business.is_resumed);
    assert!(global.history[0].text.contains("concierge"));

    // A session id is invisible outside the scope it was created in.
    let err = h
        .orchestrator
        .get_history(&global.session.id, Some("biz-1"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let err = h.post(&business.session.id, None, "hi").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(
        h.storage
            .find_by_phone(PHONE, &SessionScope::Business("biz-2".into()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn completion_request_carries_history_and_business_context() {
    let h = business_harness(vec![]).await;
    let started = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();
    h.post(&started.session.id, Some("biz-1"), "Are you open on Monday?")
        .await
        .unwrap();

    let requests = h.provider.requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.current_message, "Are you open on Monday?");
    assert_eq!(request.history.len(), 1, "only the welcome precedes the message");
    assert_eq!(request.history[0].role, Role::Assistant);
    assert_eq!(request.model, h.config.agent.default_model);
    assert_eq!(request.max_tokens, h.config.agent.max_tokens);
    assert!(request.system_prompt.contains("2026-01-01T00:00:00.000Z"));
    assert!(request.system_prompt.contains("Calle Mayor 1, Madrid"));
    let context = request.business_context.as_ref().unwrap();
    assert_eq!(context.record.id, "biz-1");
    assert_eq!(context.details, Some(casa_pepe_details()));
}

#[tokio::test]
async fn caller_supplied_history_is_used_instead_of_store() {
    let h = TestHarness::builder().build().await.unwrap();
    let started = h.start("Ana", PHONE, None).await.unwrap();

    h.orchestrator
        .post_message(PostMessage {
            session_id: started.session.id.clone(),
            business_id: None,
            text: "hello".into(),
            prior_history: Some(Vec::new()),
        })
        .await
        .unwrap();

    let requests = h.provider.requests().await;
    assert!(requests[0].history.is_empty());
}

#[tokio::test]
async fn business_details_are_cached_until_ttl_expires() {
    let h = business_harness(vec![]).await;
    let started = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();
    let id = started.session.id.clone();

    h.post(&id, Some("biz-1"), "one").await.unwrap();
    h.orchestrator.settle().await;
    h.clock.advance(Duration::hours(720));
    h.post(&id, Some("biz-1"), "two").await.unwrap();
    assert_eq!(h.lookup.calls(), 1, "exactly TTL old is still fresh");

    h.clock.advance(Duration::seconds(1));
    h.post(&id, Some("biz-1"), "three").await.unwrap();
    assert_eq!(h.lookup.calls(), 2);
    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn lookup_outage_without_cache_fails_after_saving_user_message() {
    let h = business_harness(vec![]).await;
    h.lookup.set_failing(true);
    let started = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();

    let err = h.post(&started.session.id, Some("biz-1"), "hola").await.unwrap_err();
    assert!(matches!(err, ConciergeError::LookupUnavailable { .. }));
    assert!(err.is_retryable());
    assert_eq!(h.provider.call_count().await, 0);

    let history = h
        .orchestrator
        .get_history(&started.session.id, Some("biz-1"))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::User);
}

#[tokio::test]
async fn stale_details_served_when_enabled() {
    let h = TestHarness::builder()
        .with_lookup(MockLookup::new().with_details("biz-1", casa_pepe_details()))
        .with_config(|c| c.cache.serve_stale_on_failure = true)
        .build()
        .await
        .unwrap();
    h.seed_business("biz-1", "Casa Pepe").await.unwrap();
    let started = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();

    h.post(&started.session.id, Some("biz-1"), "one").await.unwrap();
    h.orchestrator.settle().await;
    h.clock.advance(Duration::hours(800));
    h.lookup.set_failing(true);

    let outcome = h.post(&started.session.id, Some("biz-1"), "two").await.unwrap();
    assert!(!outcome.agent_unavailable);
    let requests = h.provider.requests().await;
    let context = requests[1].business_context.as_ref().unwrap();
    assert_eq!(context.details, Some(casa_pepe_details()));
}

#[tokio::test]
async fn unknown_provider_business_still_gets_record_context() {
    let h = TestHarness::builder().build().await.unwrap();
    h.seed_business("biz-9", "Bar Nuevo").await.unwrap();
    let started = h.start("Ana", PHONE, Some("biz-9")).await.unwrap();

    h.post(&started.session.id, Some("biz-9"), "hi").await.unwrap();
    let requests = h.provider.requests().await;
    let context = requests[0].business_context.as_ref().unwrap();
    assert!(context.details.is_none());
    assert!(requests[0].system_prompt.contains("Bar Nuevo"));
}

#[tokio::test]
async fn operator_messages_join_history_without_usage() {
    let h = business_harness(vec![Scripted::reply("ok", 10, 20)]).await;
    let started = h.start("Ana", PHONE, Some("biz-1")).await.unwrap();
    let user = h.post(&started.session.id, Some("biz-1"), "Can I book?").await.unwrap();

    let owner = Actor::User {
        user_id: "owner-1".into(),
    };
    let operator = h
        .orchestrator
        .post_operator_message(
            &owner,
            PostOperatorMessage {
                session_id: started.session.id.clone(),
                business_id: Some("biz-1".into()),
                text: "Yes, for how many?".into(),
                author_name: "Marta".into(),
                reply_to: Some(ReplyTo {
                    message_id: user.user_message.id.clone(),
                    text: user.user_message.text.clone(),
                    author: "Ana".into(),
                }),
            },
        )
        .await
        .unwrap();
    assert_eq!(operator.role, Role::HumanOperator);

    let session = h
        .orchestrator
        .get_session(&started.session.id, Some("biz-1"))
        .await
        .unwrap();
    assert_eq!(session.total_tokens, 30);

    let history = h
        .orchestrator
        .get_history(&started.session.id, Some("biz-1"))
        .await
        .unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.author_name.as_deref(), Some("Marta"));
    assert_eq!(
        last.reply_to.as_ref().map(|r| r.message_id.as_str()),
        Some(user.user_message.id.as_str())
    );

    let listed = h.orchestrator.list_sessions(&owner, Some("biz-1")).await.unwrap();
    assert_eq!(listed.len(), 1);
    let err = h
        .orchestrator
        .list_sessions(&Actor::Participant, Some("biz-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConciergeError::Forbidden { .. }));
}

#[tokio::test]
async fn concurrent_posts_keep_totals_consistent() {
    let h = Arc::new(TestHarness::builder().build().await.unwrap());
    let started = h.start("Ana", PHONE, None).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let h = Arc::clone(&h);
        let session_id = started.session.id.clone();
        handles.push(tokio::spawn(async move {
            h.post(&session_id, None, &format!("message {i}")).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // The default mock reply uses 10 input and 20 output tokens.
    let session = h.orchestrator.get_session(&started.session.id, None).await.unwrap();
    assert_eq!(session.total_input_tokens, 100);
    assert_eq!(session.total_output_tokens, 200);
    assert_eq!(session.total_tokens, 300);

    let history = h.orchestrator.get_history(&started.session.id, None).await.unwrap();
    assert_eq!(history.len(), 21);
    let summed: i64 = history
        .iter()
        .filter_map(|m| m.usage)
        .map(|u| i64::from(u.total_tokens))
        .sum();
    assert_eq!(summed, session.total_tokens);
}

#[tokio::test]
async fn invalid_messages_are_rejected_before_any_write() {
    let h = TestHarness::builder().build().await.unwrap();
    let started = h.start("Ana", PHONE, None).await.unwrap();

    let err = h.post(&started.session.id, None, "   ").await.unwrap_err();
    assert!(matches!(err, ConciergeError::Validation(_)));
    let history = h.orchestrator.get_history(&started.session.id, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(h.provider.call_count().await, 0);
}
