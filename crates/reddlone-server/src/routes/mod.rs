//! HTTP routes.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenAuthority;
use crate::config::Config;
use crate::handlers;
use crate::lifecycle::BackgroundTasks;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Session token issuer and verifier.
    pub tokens: Arc<TokenAuthority>,

    /// Work registered here is awaited before the process exits.
    ///
    /// This is how a handler starts work that outlives its request; the
    /// built-in handlers all finish inline and do not touch it.
    pub background: BackgroundTasks,
}

impl AppState {
    pub fn new(config: Config, background: BackgroundTasks) -> Self {
        let tokens = Arc::new(TokenAuthority::from_config(&config));
        Self {
            config,
            tokens,
            background,
        }
    }
}

/// Build the application routes.
///
/// - `/api/health` - liveness probe
/// - `/metrics` - Prometheus scrape endpoint
/// - `/api/v1/credentials/validate` - credential format check
/// - `/api/v1/tokens/verify` - session token check
/// - `/static/*` - files from the configured static directory
///
/// Read and write timeouts are layered on by the lifecycle manager.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    let api_routes = Router::new()
        .route("/api/health", get(handlers::health_check))
        .route(
            "/api/v1/credentials/validate",
            post(handlers::validate_credentials),
        )
        .route("/api/v1/tokens/verify", post(handlers::verify_token))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    api_routes
        .merge(metrics_routes)
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
}
