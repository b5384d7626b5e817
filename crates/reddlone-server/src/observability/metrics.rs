//! Metric recording functions.
//!
//! All metrics use the `reddlone_` prefix, `_total` for counters and
//! `_seconds` for duration histograms.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return the handle used by
/// `/metrics`.
///
/// # Errors
///
/// Returns an error if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Shutdown phases range from milliseconds to the full grace period
        .set_buckets_for_metric(
            Matcher::Prefix("reddlone_shutdown".to_string()),
            &[0.010, 0.050, 0.100, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000],
        )
        .map_err(|e| format!("Failed to set shutdown buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Credential Metrics
// ============================================================================

/// Record a credential validation outcome.
///
/// Metric: `reddlone_credential_validations_total`
/// Labels: `field`, `status`
pub fn record_credential_validation(field: &'static str, status: &'static str) {
    counter!("reddlone_credential_validations_total", "field" => field, "status" => status)
        .increment(1);
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Metric: `reddlone_tokens_issued_total`
pub fn record_token_issued(status: &'static str) {
    counter!("reddlone_tokens_issued_total", "status" => status).increment(1);
}

/// Metric: `reddlone_token_verifications_total`
pub fn record_token_verification(status: &'static str) {
    counter!("reddlone_token_verifications_total", "status" => status).increment(1);
}

// ============================================================================
// Lifecycle Metrics
// ============================================================================

/// Set the number of outstanding background tasks.
///
/// Metric: `reddlone_background_tasks_active`
pub fn set_background_tasks_active(count: usize) {
    // usize to f64 is exact for any realistic task count (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("reddlone_background_tasks_active").set(count as f64);
}

/// Record how long one shutdown phase took.
///
/// Metric: `reddlone_shutdown_phase_duration_seconds`
/// Labels: `phase` (grace, background, total)
pub fn record_shutdown_phase(phase: &'static str, duration: Duration) {
    histogram!("reddlone_shutdown_phase_duration_seconds", "phase" => phase)
        .record(duration.as_secs_f64());
}

/// Metric: `reddlone_shutdown_timeouts_total`
pub fn record_shutdown_timeout() {
    counter!("reddlone_shutdown_timeouts_total").increment(1);
}
