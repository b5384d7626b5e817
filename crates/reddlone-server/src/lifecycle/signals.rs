//! Termination signals as cancellation.
//!
//! SIGINT (ctrl-c) and SIGTERM both cancel the shared [`CancellationToken`];
//! the lifecycle manager only ever observes the token.

use crate::errors::LifecycleError;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Spawn the process signal listener that cancels `token`.
///
/// # Errors
///
/// `SignalHandlerAlreadyInstalled` if called more than once in this process.
pub fn install_signal_handler(
    token: CancellationToken,
) -> Result<JoinHandle<()>, LifecycleError> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Err(LifecycleError::SignalHandlerAlreadyInstalled);
    }

    Ok(tokio::spawn(shutdown_signal(token)))
}

/// Wait for SIGINT or SIGTERM, then cancel `token`.
///
/// Returns early without logging if the token is cancelled by someone else.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!(target: "reddlone.lifecycle", "Received SIGINT, starting graceful shutdown..."),
            Err(e) => {
                error!(target: "reddlone.lifecycle", error = %e, "Failed to listen for SIGINT");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!(target: "reddlone.lifecycle", "Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!(target: "reddlone.lifecycle", error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = token.cancelled() => return,
    }

    token.cancel();
}
