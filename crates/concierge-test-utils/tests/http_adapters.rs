// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full stack against mocked Anthropic and Places endpoints.

use std::sync::Arc;

use concierge_agent::{PostMessage, SessionOrchestrator, StartSession};
use concierge_anthropic::AnthropicProvider;
use concierge_config::ConciergeConfig;
use concierge_context::BusinessDetailCache;
use concierge_core::{
    BusinessRecord, DirectoryStore, StorageAdapter, VerificationStatus,
};
use concierge_places::PlacesLookup;
use concierge_storage::SqliteStorage;
use concierge_test_utils::ManualClock;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_places(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/places/biz-1"))
        .and(header("x-goog-api-key", "places-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "biz-1",
            "displayName": {"text": "Casa Pepe"},
            "formattedAddress": "Calle Mayor 1, Madrid",
            "regularOpeningHours": {"weekdayDescriptions": ["Monday: 9:00 AM – 11:00 PM"]}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_anthropic(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(body_partial_json(json!({"model": "claude-sonnet-4-20250514"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "We open at 9 on Mondays."}],
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 120, "output_tokens": 12}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn business_question_flows_through_real_adapters() {
    let server = MockServer::start().await;
    mount_places(&server).await;
    mount_anthropic(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = ConciergeConfig::default();
    config.storage.database_path = dir.path().join("e2e.db").to_string_lossy().into_owned();
    config.anthropic.api_key = Some("sk-test".into());
    config.anthropic.base_url = server.uri();
    config.places.api_key = Some("places-key".into());
    config.places.base_url = format!("{}/v1", server.uri());

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await.unwrap();
    storage
        .upsert_business(&BusinessRecord {
            id: "biz-1".into(),
            name: "Casa Pepe".into(),
            category: "restaurant".into(),
            owner_id: Some("owner-1".into()),
            verification_status: VerificationStatus::Approved,
            agent_enabled: true,
            agent_config: None,
        })
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::default());
    let lookup = Arc::new(PlacesLookup::new(&config.places).unwrap());
    let cache = Arc::new(BusinessDetailCache::new(
        storage.clone(),
        lookup,
        clock.clone(),
        &config.cache,
    ));
    let provider = Arc::new(AnthropicProvider::new(&config).unwrap());
    let orchestrator = SessionOrchestrator::new(
        &config,
        storage.clone(),
        storage.clone(),
        cache,
        provider,
        clock,
    )
    .unwrap();

    let started = orchestrator
        .start_or_resume(StartSession {
            name: "Ana".into(),
            phone: "+34 600 000 000".into(),
            email: Some("ana@example.com".into()),
            business_id: Some("biz-1".into()),
        })
        .await
        .unwrap();
    assert_eq!(started.session.participant_phone, "+34600000000");

    let outcome = orchestrator
        .post_message(PostMessage {
            session_id: started.session.id.clone(),
            business_id: Some("biz-1".into()),
            text: "Are you open on Monday?".into(),
            prior_history: None,
        })
        .await
        .unwrap();
    assert!(!outcome.agent_unavailable);
    assert_eq!(outcome.reply.text, "We open at 9 on Mondays.");

    let session = orchestrator
        .get_session(&started.session.id, Some("biz-1"))
        .await
        .unwrap();
    assert_eq!(session.total_input_tokens, 120);
    assert_eq!(session.total_output_tokens, 12);
    assert_eq!(session.total_tokens, 132);
    assert!(session.total_cost_usd > 0.0);

    // The system prompt sent upstream carries the provider details.
    let requests = server.received_requests().await.unwrap();
    let completion = requests
        .iter()
        .find(|r| r.url.path() == "/v1/messages")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&completion.body).unwrap();
    let system = body["system"].as_str().unwrap();
    assert!(system.contains("Calle Mayor 1, Madrid"));
    assert_eq!(body["messages"].as_array().unwrap().last().unwrap()["role"], "user");

    orchestrator.settle().await;
    storage.close().await.unwrap();
}

#[tokio::test]
async fn anthropic_outage_yields_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "bad request"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = ConciergeConfig::default();
    config.storage.database_path = dir.path().join("e2e.db").to_string_lossy().into_owned();
    config.anthropic.api_key = Some("sk-test".into());
    config.anthropic.base_url = server.uri();

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await.unwrap();
    let clock = Arc::new(ManualClock::default());
    let lookup = Arc::new(concierge_test_utils::MockLookup::new());
    let cache = Arc::new(BusinessDetailCache::new(
        storage.clone(),
        lookup,
        clock.clone(),
        &config.cache,
    ));
    let provider = Arc::new(AnthropicProvider::new(&config).unwrap());
    let orchestrator =
        SessionOrchestrator::new(&config, storage.clone(), storage.clone(), cache, provider, clock)
            .unwrap();

    let started = orchestrator
        .start_or_resume(StartSession {
            name: "Ana".into(),
            phone: "+34600000000".into(),
            email: None,
            business_id: None,
        })
        .await
        .unwrap();
    let outcome = orchestrator
        .post_message(PostMessage {
            session_id: started.session.id.clone(),
            business_id: None,
            text: "hello".into(),
            prior_history: None,
        })
        .await
        .unwrap();
    assert!(outcome.agent_unavailable);
    assert_eq!(outcome.reply.text, config.agent.apology_message);
    storage.close().await.unwrap();
}
