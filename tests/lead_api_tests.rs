/// Integration tests for the lead persistence endpoint and the legacy
/// analytics endpoint, running against the in-memory store backend.
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use profile_leads_api::config::Config;
use profile_leads_api::errors::AppError;
use profile_leads_api::handlers::{create_lead, record_analytics_event, AppState};
use profile_leads_api::models::{AnalyticsEvent, NewLead};
use profile_leads_api::store::{LeadStore, MemoryLeadStore};
use serde_json::json;
use std::sync::Arc;

/// Helper to create test config
fn create_test_config() -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 8080,
        posthog_api_key: None,
        posthog_host: "https://us.i.posthog.com".to_string(),
    }
}

fn test_state() -> (Arc<MemoryLeadStore>, Arc<AppState>) {
    let store = Arc::new(MemoryLeadStore::new());
    let state = Arc::new(AppState {
        store: store.clone(),
        config: create_test_config(),
    });
    (store, state)
}

fn body_of(value: serde_json::Value) -> Bytes {
    Bytes::from(value.to_string())
}

/// A store whose writes always fail, for the transient-failure path.
struct FailingStore;

#[async_trait::async_trait]
impl LeadStore for FailingStore {
    async fn upsert_lead(&self, _lead: &NewLead) -> Result<(), AppError> {
        Err(AppError::InternalError("disk full".to_string()))
    }

    async fn find_lead(
        &self,
        _email: &str,
    ) -> Result<Option<profile_leads_api::models::Lead>, AppError> {
        Ok(None)
    }

    async fn record_event(
        &self,
        _event: AnalyticsEvent,
        _source: Option<&str>,
    ) -> Result<(), AppError> {
        Err(AppError::InternalError("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_insert_new_lead() {
    let (store, state) = test_state();

    let (status, _) = create_lead(
        State(state),
        body_of(json!({
            "email": "test@example.com",
            "willing_to_pay": true,
            "price_shown": 29,
            "main_problem": "Not getting enough matches on my profile",
            "source": "organic"
        })),
    )
    .await
    .expect("insert should succeed");

    assert_eq!(status, StatusCode::CREATED);

    let lead = store
        .find_lead("test@example.com")
        .await
        .unwrap()
        .expect("lead should exist");
    assert_eq!(lead.email, "test@example.com");
    assert!(lead.willing_to_pay);
    assert_eq!(lead.price_shown, 29.0);
    assert_eq!(lead.main_problem, "Not getting enough matches on my profile");
    assert_eq!(lead.source.as_deref(), Some("organic"));
    assert!(lead.updated_at.is_none());
}

#[tokio::test]
async fn test_email_normalized_on_write() {
    let (store, state) = test_state();

    let (status, _) = create_lead(
        State(state),
        body_of(json!({
            "email": "  MixedCase@Example.COM ",
            "willing_to_pay": true,
            "price_shown": 29,
            "main_problem": "  surrounded by whitespace problem  "
        })),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);

    // Stored under the trimmed, lowercased key with the problem trimmed
    let lead = store
        .find_lead("mixedcase@example.com")
        .await
        .unwrap()
        .expect("lead should be keyed by normalized email");
    assert_eq!(lead.main_problem, "surrounded by whitespace problem");
}

#[tokio::test]
async fn test_upsert_same_payload_twice_is_idempotent() {
    let (store, state) = test_state();

    let payload = json!({
        "email": "duplicate@example.com",
        "willing_to_pay": true,
        "price_shown": 29,
        "main_problem": "Original problem description here",
        "source": "utm_source_1"
    });

    create_lead(State(state.clone()), body_of(payload.clone()))
        .await
        .unwrap();
    create_lead(State(state), body_of(payload)).await.unwrap();

    assert_eq!(store.lead_count(), 1);
    let lead = store
        .find_lead("duplicate@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lead.source.as_deref(), Some("utm_source_1"));
    assert!(lead.updated_at.is_some());
}

#[tokio::test]
async fn test_upsert_updates_mutable_fields() {
    let (store, state) = test_state();

    create_lead(
        State(state.clone()),
        body_of(json!({
            "email": "repeat@example.com",
            "willing_to_pay": false,
            "price_shown": 29,
            "main_problem": "First version of the problem",
            "source": "utm_source_1"
        })),
    )
    .await
    .unwrap();

    create_lead(
        State(state),
        body_of(json!({
            "email": "repeat@example.com",
            "willing_to_pay": true,
            "price_shown": 49,
            "main_problem": "Second version of the problem",
            "source": "utm_source_2"
        })),
    )
    .await
    .unwrap();

    assert_eq!(store.lead_count(), 1);
    let lead = store.find_lead("repeat@example.com").await.unwrap().unwrap();
    assert!(lead.willing_to_pay);
    assert_eq!(lead.price_shown, 49.0);
    assert_eq!(lead.main_problem, "Second version of the problem");
    // Non-null incoming source overwrites
    assert_eq!(lead.source.as_deref(), Some("utm_source_2"));
}

#[tokio::test]
async fn test_upsert_preserves_source_when_incoming_is_null() {
    let (store, state) = test_state();

    create_lead(
        State(state.clone()),
        body_of(json!({
            "email": "attributed@example.com",
            "willing_to_pay": true,
            "price_shown": 29,
            "main_problem": "Problem with enough characters",
            "source": "utm_source_1"
        })),
    )
    .await
    .unwrap();

    create_lead(
        State(state),
        body_of(json!({
            "email": "attributed@example.com",
            "willing_to_pay": true,
            "price_shown": 29,
            "main_problem": "Problem with enough characters",
            "source": null
        })),
    )
    .await
    .unwrap();

    let lead = store
        .find_lead("attributed@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lead.source.as_deref(), Some("utm_source_1"));
}

#[tokio::test]
async fn test_willing_to_pay_false_is_stored_falsy() {
    let (store, state) = test_state();

    create_lead(
        State(state),
        body_of(json!({
            "email": "hesitant@example.com",
            "willing_to_pay": false,
            "price_shown": 29,
            "main_problem": "Still thinking about whether to pay"
        })),
    )
    .await
    .unwrap();

    let lead = store
        .find_lead("hesitant@example.com")
        .await
        .unwrap()
        .expect("row exists even when willing_to_pay is false");
    assert!(!lead.willing_to_pay);
}

#[tokio::test]
async fn test_validation_order_first_failure_wins() {
    let (_, state) = test_state();

    // Everything wrong at once: the email check fires first
    let err = create_lead(
        State(state.clone()),
        body_of(json!({
            "willing_to_pay": "yes",
            "price_shown": "twenty-nine"
        })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Email is required"));

    // Valid email, bad willing_to_pay and price: willing_to_pay fires next
    let err = create_lead(
        State(state),
        body_of(json!({
            "email": "a@b.com",
            "willing_to_pay": "yes",
            "price_shown": "twenty-nine"
        })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "willing_to_pay must be a boolean"));
}

#[tokio::test]
async fn test_rejects_missing_or_non_string_email() {
    let (_, state) = test_state();

    for payload in [
        json!({ "willing_to_pay": true, "price_shown": 29, "main_problem": "A long enough problem" }),
        json!({ "email": 42, "willing_to_pay": true, "price_shown": 29, "main_problem": "A long enough problem" }),
        json!({ "email": "", "willing_to_pay": true, "price_shown": 29, "main_problem": "A long enough problem" }),
    ] {
        let err = create_lead(State(state.clone()), body_of(payload))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Email is required"));
    }
}

#[tokio::test]
async fn test_rejects_malformed_email() {
    let (_, state) = test_state();

    for email in ["missing@domain", "spaces in@email.com", "not_an_email"] {
        let err = create_lead(
            State(state.clone()),
            body_of(json!({
                "email": email,
                "willing_to_pay": true,
                "price_shown": 29,
                "main_problem": "A long enough problem"
            })),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, AppError::BadRequest(ref msg) if msg == "Invalid email format"),
            "email {:?} should be rejected for shape",
            email
        );
    }
}

#[tokio::test]
async fn test_rejects_non_numeric_price() {
    let (_, state) = test_state();

    let err = create_lead(
        State(state),
        body_of(json!({
            "email": "a@b.com",
            "willing_to_pay": true,
            "price_shown": "29",
            "main_problem": "A long enough problem"
        })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "price_shown must be a number"));
}

#[tokio::test]
async fn test_malformed_body_maps_to_internal_error() {
    let (_, state) = test_state();

    let err = create_lead(State(state), Bytes::from_static(b"not json at all"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InternalError(_)));
}

#[tokio::test]
async fn test_missing_main_problem_maps_to_internal_error() {
    let (store, state) = test_state();

    let err = create_lead(
        State(state),
        body_of(json!({
            "email": "a@b.com",
            "willing_to_pay": true,
            "price_shown": 29
        })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InternalError(_)));
    // Nothing was written
    assert_eq!(store.lead_count(), 0);
}

#[tokio::test]
async fn test_store_failure_surfaces_store_message() {
    let state = Arc::new(AppState {
        store: Arc::new(FailingStore),
        config: create_test_config(),
    });

    let err = create_lead(
        State(state),
        body_of(json!({
            "email": "a@b.com",
            "willing_to_pay": true,
            "price_shown": 29,
            "main_problem": "A long enough problem"
        })),
    )
    .await
    .unwrap_err();

    match err {
        AppError::StoreWrite(msg) => assert!(msg.contains("disk full")),
        other => panic!("expected StoreWrite, got {:?}", other),
    }
}

// ============ Legacy analytics endpoint ============

#[tokio::test]
async fn test_analytics_event_recorded() {
    let (store, state) = test_state();

    let (status, _) = record_analytics_event(
        State(state),
        body_of(json!({ "event": "cta_click", "source": "twitter" })),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    let events = store.recorded_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, AnalyticsEvent::CtaClick);
    assert_eq!(events[0].1.as_deref(), Some("twitter"));
}

#[tokio::test]
async fn test_analytics_event_null_source() {
    let (store, state) = test_state();

    record_analytics_event(
        State(state),
        body_of(json!({ "event": "page_view", "source": null })),
    )
    .await
    .unwrap();

    let events = store.recorded_events();
    assert_eq!(events[0].0, AnalyticsEvent::PageView);
    assert_eq!(events[0].1, None);
}

#[tokio::test]
async fn test_analytics_requires_event_name() {
    let (_, state) = test_state();

    let err = record_analytics_event(State(state), body_of(json!({ "source": "twitter" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Event is required"));
}

#[tokio::test]
async fn test_analytics_rejects_unknown_event_name() {
    let (store, state) = test_state();

    let err = record_analytics_event(
        State(state),
        body_of(json!({ "event": "checkout_completed" })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Invalid event name"));
    assert!(store.recorded_events().is_empty());
}
