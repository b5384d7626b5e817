//! Observability for the server.
//!
//! Metric labels are bounded: `field` has four values, `status` two
//! (success, error), `phase` three (grace, background, total). Subjects,
//! tokens and submitted credentials never appear in labels or logs.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `reddlone_credential_validations_total` | Counter | `field`, `status` |
//! | `reddlone_tokens_issued_total` | Counter | `status` |
//! | `reddlone_token_verifications_total` | Counter | `status` |
//! | `reddlone_background_tasks_active` | Gauge | none |
//! | `reddlone_shutdown_phase_duration_seconds` | Histogram | `phase` |
//! | `reddlone_shutdown_timeouts_total` | Counter | none |

pub mod metrics;
