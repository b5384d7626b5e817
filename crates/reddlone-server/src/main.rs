//! Reddlone server
//!
//! Serves the API and static files until SIGINT or SIGTERM, then drains.

use reddlone_server::config::Config;
use reddlone_server::lifecycle::{install_signal_handler, LifecycleManager};
use reddlone_server::observability::metrics::init_metrics_recorder;
use reddlone_server::routes::{self, AppState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reddlone=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Reddlone server");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        static_dir = %config.static_dir.display(),
        token_validity_seconds = config.token_validity_seconds,
        shutdown_grace_seconds = config.shutdown_grace_seconds,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to initialize metrics recorder");
        e
    })?;

    let manager = LifecycleManager::bind(config.lifecycle_settings(), |background| {
        let state = Arc::new(AppState::new(config, background));
        routes::build_routes(state, metrics_handle)
    })
    .await?;

    let shutdown = CancellationToken::new();
    let _signals = install_signal_handler(shutdown.clone())?;

    if let Ok(addr) = manager.local_addr() {
        info!("Reddlone server listening on {}", addr);
    }

    manager.run(shutdown).await.map_err(|e| {
        error!(error = %e, "Server exited with error");
        e
    })?;

    info!("Reddlone server shutdown complete");

    Ok(())
}
