use crate::consent::ConsentState;
use crate::models::AnalyticsEvent;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

/// Client for the PostHog capture endpoint.
pub struct PosthogClient {
    client: Client,
    host: String,
    api_key: String,
}

impl PosthogClient {
    pub fn new(host: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Send one event to the capture endpoint.
    pub async fn capture(&self, event: AnalyticsEvent, properties: Value) -> anyhow::Result<()> {
        let url = format!("{}/capture/", self.host);

        let body = json!({
            "api_key": self.api_key,
            "event": event.as_str(),
            "properties": properties,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("capture endpoint returned status {}", response.status());
        }

        Ok(())
    }
}

/// Consent-gated, fire-and-forget event tracker.
///
/// Gating happens at construction: the PostHog client only exists when
/// consent is accepted and an API key is configured, so [`track`] needs no
/// consent check of its own. Failures from the collaborator are logged and
/// swallowed — analytics must never block or break the user-facing flow.
///
/// [`track`]: EventTracker::track
pub struct EventTracker {
    client: Option<Arc<PosthogClient>>,
}

impl EventTracker {
    /// Initialize the tracker for a session.
    pub fn new(consent: ConsentState, api_key: Option<&str>, host: &str) -> Self {
        let client = match (consent, api_key) {
            (ConsentState::Accepted, Some(key)) => {
                tracing::info!("Analytics tracker initialized");
                Some(Arc::new(PosthogClient::new(host, key)))
            }
            _ => {
                tracing::debug!("Analytics tracker not initialized (consent: {:?})", consent);
                None
            }
        };

        Self { client }
    }

    /// A tracker that never forwards anything.
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    /// Forward a named event with optional properties.
    ///
    /// The attribution `utm_source` is read fresh from the page query string
    /// at call time and attached to the properties. The capture call runs in
    /// the background; this never blocks and never fails.
    pub fn track(&self, event: AnalyticsEvent, properties: Option<Value>, page_query: &str) {
        let Some(client) = &self.client else {
            return;
        };

        let mut props = properties.unwrap_or_else(|| json!({}));
        if let Value::Object(map) = &mut props {
            map.insert("source".to_string(), json!(source_from_query(page_query)));
        }

        let client = Arc::clone(client);
        tokio::spawn(async move {
            if let Err(e) = client.capture(event, props).await {
                // Silent fail: analytics must not surface to the user
                tracing::debug!("Analytics capture failed for {}: {}", event, e);
            }
        });
    }
}

/// Extract the `utm_source` attribution tag from a page query string.
///
/// Accepts the query with or without the leading `?`.
pub fn source_from_query(page_query: &str) -> Option<String> {
    let query = page_query.trim_start_matches('?');
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "utm_source")
        .map(|(_, value)| value.into_owned())
}
