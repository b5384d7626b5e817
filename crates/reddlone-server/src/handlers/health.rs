//! Health check handler.

use crate::models::HealthResponse;
use axum::Json;

/// Liveness probe. Always reports `{"ok": true}` while the process is serving.
#[tracing::instrument(skip_all, name = "reddlone.health.check")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_reports_ok() {
        let Json(response) = health_check().await;
        assert!(response.ok);
    }
}
