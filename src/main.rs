// Server-side modules only; the client-core state machines (modal flow,
// consent, tracker) live in the library crate.
mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod store;
mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::store::PgLeadStore;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool and lead store
/// schema, then serves the lead-capture routes with rate limiting, body
/// size caps, request tracing, and permissive CORS.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_leads_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Bring up the lead store and make sure the schema exists
    let store = PgLeadStore::new(db.pool.clone());
    if let Err(e) = store.ensure_schema().await {
        anyhow::bail!("Failed to initialize lead store schema: {}", e);
    }

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        store: Arc::new(store),
        config: config.clone(),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20.
    // The lead form is a low-volume public endpoint; this is spam control,
    // not capacity management.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build public form routes with protection layers
    let protected_routes = Router::new()
        .route("/api/leads", post(handlers::create_lead))
        .route("/api/analytics", post(handlers::record_analytics_event))
        .layer(
            ServiceBuilder::new()
                // Lead payloads are tiny; 64KB is generous
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting for the
    // deploy platform's probes)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
