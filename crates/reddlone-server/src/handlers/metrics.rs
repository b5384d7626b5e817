//! Prometheus metrics endpoint handler.
//!
//! Unauthenticated so Prometheus can scrape it. Labels are bounded and
//! never carry subjects, tokens or submitted credentials.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
#[tracing::instrument(skip_all, name = "reddlone.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[tokio::test]
    async fn test_metrics_handler_renders_uninstalled_recorder() {
        // A recorder that is built but not installed still renders.
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let response = metrics_handler(State(handle)).await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
