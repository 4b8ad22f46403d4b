use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AnalyticsEvent, NewLead};
use crate::store::LeadStore;
use crate::validation;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead persistence backend (Postgres in production, in-memory in tests).
    pub store: Arc<dyn LeadStore>,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "profile-leads-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/leads
///
/// Validates a lead submission and performs an idempotent upsert keyed by
/// the normalized email.
///
/// The body is parsed as untyped JSON so each field can be checked in order
/// with a distinct message — first failure wins:
/// 1. `email` present and a string
/// 2. `email` matches the email-shape predicate
/// 3. `willing_to_pay` boolean-typed
/// 4. `price_shown` numeric-typed
///
/// A malformed body or missing `main_problem` is an unexpected condition and
/// maps to the generic 500, matching the observed contract.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::InternalError(format!("Failed to parse lead payload: {}", e)))?;

    let email = payload
        .get("email")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    if !validation::is_valid_email(email) {
        return Err(AppError::BadRequest("Invalid email format".to_string()));
    }

    let willing_to_pay = payload
        .get("willing_to_pay")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| AppError::BadRequest("willing_to_pay must be a boolean".to_string()))?;

    let price_shown = payload
        .get("price_shown")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| AppError::BadRequest("price_shown must be a number".to_string()))?;

    let main_problem = payload
        .get("main_problem")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::InternalError("Lead payload missing main_problem".to_string()))?;

    let source = payload
        .get("source")
        .and_then(|v| v.as_str())
        .map(String::from);

    let lead = NewLead::normalized(email, willing_to_pay, price_shown, main_problem, source);

    tracing::info!("POST /api/leads - email: {}", lead.email);

    state
        .store
        .upsert_lead(&lead)
        .await
        .map_err(|e| AppError::StoreWrite(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

/// POST /api/analytics
///
/// Legacy self-hosted analytics capture: validates the event name against
/// the known funnel event set and appends a row to the events table. Later
/// site evolutions capture events client-side and bypass this endpoint, but
/// both variants stay supported.
pub async fn record_analytics_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        AppError::InternalError(format!("Failed to parse analytics payload: {}", e))
    })?;

    let event_name = payload
        .get("event")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Event is required".to_string()))?;

    let event: AnalyticsEvent = event_name
        .parse()
        .map_err(|()| AppError::BadRequest("Invalid event name".to_string()))?;

    let source = payload.get("source").and_then(|v| v.as_str());

    tracing::debug!("POST /api/analytics - event: {}", event);

    state.store.record_event(event, source).await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}
