// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Concierge session engine.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared throughout the Concierge workspace. Storage, lookup and completion
//! backends implement traits defined here.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, SystemClock};
pub use error::ConciergeError;
pub use types::{
    AdapterType, AgentProfile, AgentProfileKey, BusinessContext, BusinessDetails, BusinessRecord,
    CachedDetails, ChatTurn, CompletionRequest, CompletionResponse, HealthStatus, Message,
    ReplyTo, Review, Role, Session, SessionScope, TokenUsage, VerificationStatus,
    format_timestamp, parse_timestamp,
};

pub use traits::{
    BusinessLookup, CompletionProvider, DetailCacheStore, DirectoryStore, PluginAdapter,
    SessionStore, StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    #[test]
    fn role_uses_snake_case_names() {
        assert_eq!(Role::HumanOperator.to_string(), "human_operator");
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
        let json = serde_json::to_string(&Role::HumanOperator).unwrap();
        assert_eq!(json, "\"human_operator\"");
    }

    #[test]
    fn scope_partition_keys() {
        assert_eq!(SessionScope::Global.partition_key(), "global");
        let scope = SessionScope::from_business(Some("biz-1"));
        assert_eq!(scope.partition_key(), "business:biz-1");
        assert_eq!(scope.business_id(), Some("biz-1"));
        assert_eq!(SessionScope::from_business(None), SessionScope::Global);
    }

    #[test]
    fn token_usage_total_is_sum() {
        let usage = TokenUsage::new(10, 20);
        assert_eq!(usage.total_tokens, 30);
    }

    #[test]
    fn timestamps_are_fixed_width_and_parse_back() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        let formatted = format_timestamp(at);
        assert_eq!(formatted, "2026-03-01T09:05:07.000Z");
        assert_eq!(parse_timestamp(&formatted), Some(at));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn new_session_has_zero_totals_and_scope() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let scope = SessionScope::Business("biz-1".into());
        let session = Session::new(&scope, "Ana".into(), "+34600000000".into(), None, now);
        assert_eq!(session.total_tokens, 0);
        assert_eq!(session.total_cost_usd, 0.0);
        assert_eq!(session.created_at, session.updated_at);
        assert_eq!(session.scope(), scope);
    }

    #[test]
    fn details_merge_keeps_previous_values_for_absent_fields() {
        let mut current = BusinessDetails {
            name: Some("Old".into()),
            address: Some("Calle Mayor 1".into()),
            opening_hours: vec!["Mon: 9-5".into()],
            ..Default::default()
        };
        current.merge(BusinessDetails {
            name: Some("New".into()),
            rating: Some(4.5),
            ..Default::default()
        });
        assert_eq!(current.name.as_deref(), Some("New"));
        assert_eq!(current.address.as_deref(), Some("Calle Mayor 1"));
        assert_eq!(current.rating, Some(4.5));
        assert_eq!(current.opening_hours, vec!["Mon: 9-5".to_string()]);
    }

    #[test]
    fn error_helpers() {
        let err = ConciergeError::not_found("session", "s-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "session not found: s-1");

        let unavailable = ConciergeError::LookupUnavailable {
            business_id: "biz-1".into(),
            source: None,
        };
        assert!(unavailable.is_retryable());
        assert!(!ConciergeError::Validation("phone".into()).is_retryable());
    }

    #[test]
    fn context_display_name_prefers_record() {
        let record = BusinessRecord {
            id: "biz-1".into(),
            name: String::new(),
            category: "restaurant".into(),
            owner_id: None,
            verification_status: VerificationStatus::Approved,
            agent_enabled: true,
            agent_config: None,
        };
        let mut ctx = BusinessContext {
            record,
            details: Some(BusinessDetails {
                name: Some("Casa Pepe".into()),
                ..Default::default()
            }),
        };
        assert_eq!(ctx.display_name(), "Casa Pepe");
        ctx.record.name = "Pepe's".into();
        assert_eq!(ctx.display_name(), "Pepe's");
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider<T: CompletionProvider>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_session_store<T: SessionStore>() {}
        fn _assert_directory<T: DirectoryStore>() {}
        fn _assert_lookup<T: BusinessLookup>() {}
        fn _assert_cache_store<T: DetailCacheStore>() {}
        fn _assert_clock<T: Clock>() {}
    }
}
