//! Server lifecycle management.
//!
//! ```text
//! Starting ──bind──▶ Serving ──shutdown token──▶ Draining ──tasks idle──▶ Stopped
//!
//! Draining:
//!     stop accepting → graceful close (bounded by grace period)
//!                    → wait for background tasks (unbounded)
//! ```
//!
//! - `manager.rs` - listener ownership, accept loop, shutdown state machine
//! - `connection.rs` - per-connection idle and stalled-write watchdog
//! - `background.rs` - counting barrier for work that outlives a request
//! - `signals.rs` - SIGINT/SIGTERM to cancellation token

pub mod background;
mod connection;
pub mod manager;
pub mod signals;

pub use background::{BackgroundTaskGuard, BackgroundTasks};
pub use manager::LifecycleManager;
pub use signals::install_signal_handler;

use std::fmt;
use std::time::Duration;

/// Lifecycle state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Listener bound, accept loop not yet running.
    Starting,
    /// Accepting and serving connections.
    Serving,
    /// Shutdown requested: closing connections, then draining background tasks.
    Draining,
    /// Every connection closed or abandoned and every background task finished.
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Serving => "serving",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener address and timeouts for a managed server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub bind_address: String,

    /// Upper bound on graceful connection close once shutdown starts.
    pub grace_period: Duration,

    /// Maximum time to receive request headers, and between request body frames.
    pub read_timeout: Duration,

    /// Maximum time for a handler to produce its response, between response
    /// body frames, and for a blocked socket write.
    pub write_timeout: Duration,

    /// Close a connection after this long with no socket activity.
    pub idle_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            bind_address: crate::config::DEFAULT_BIND_ADDRESS.to_string(),
            grace_period: Duration::from_secs(crate::config::DEFAULT_SHUTDOWN_GRACE_SECONDS),
            read_timeout: Duration::from_secs(crate::config::DEFAULT_READ_TIMEOUT_SECONDS),
            write_timeout: Duration::from_secs(crate::config::DEFAULT_WRITE_TIMEOUT_SECONDS),
            idle_timeout: Duration::from_secs(crate::config::DEFAULT_IDLE_TIMEOUT_SECONDS),
        }
    }
}
