//! Test server harness for E2E testing
//!
//! Provides `TestServer` for spawning real server instances in tests. The
//! server runs under a `LifecycleManager`, so tests can drive shutdown and
//! observe the lifecycle state.

use metrics_exporter_prometheus::PrometheusBuilder;
use reddlone_server::auth::TokenAuthority;
use reddlone_server::config::Config;
use reddlone_server::errors::LifecycleError;
use reddlone_server::lifecycle::{BackgroundTasks, LifecycleManager, LifecycleState};
use reddlone_server::routes::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Signing key every test server uses unless overridden.
pub const TEST_SECRET_KEY: &str = "reddlone-test-secret-key";

/// Test harness for spawning the server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let server = TestServer::spawn().await?;
/// let token = server.tokens().issue("alice@example.com")?;
/// ```
pub struct TestServer {
    addr: SocketAddr,
    config: Config,
    tokens: TokenAuthority,
    background: BackgroundTasks,
    states: watch::Receiver<LifecycleState>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<Result<(), LifecycleError>>>,
}

impl TestServer {
    /// Spawn a server with the default test configuration.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Sign tokens with [`TEST_SECRET_KEY`]
    /// - Start serving in the background
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    /// Spawn a server with extra environment-style overrides.
    pub async fn spawn_with_vars(
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("IP_ADDR".to_string(), "127.0.0.1:0".to_string()),
            ("SECRET_KEY".to_string(), TEST_SECRET_KEY.to_string()),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        // Built but not installed: each test binary may spawn many servers.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app_config = config.clone();
        let manager = LifecycleManager::bind(config.lifecycle_settings(), |background| {
            let state = Arc::new(AppState::new(app_config, background));
            routes::build_routes(state, metrics_handle)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = manager
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;
        let background = manager.background_tasks();
        let mut states = manager.subscribe();

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(manager.run(shutdown.clone()));

        states
            .wait_for(|s| *s == LifecycleState::Serving)
            .await
            .map_err(|e| anyhow::anyhow!("Server never started serving: {}", e))?;

        Ok(Self {
            addr,
            tokens: TokenAuthority::from_config(&config),
            config,
            background,
            states,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A token authority sharing the server's key.
    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    /// The server's background task counter.
    pub fn background_tasks(&self) -> BackgroundTasks {
        self.background.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.states.borrow()
    }

    /// A receiver for lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.states.clone()
    }

    /// The token that starts shutdown; hand it to a signal listener to
    /// drive the server from real signals.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Trigger shutdown as a termination signal would.
    pub fn begin_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Trigger shutdown and wait for the server to reach `Stopped`.
    pub async fn shutdown(mut self) -> Result<(), anyhow::Error> {
        self.shutdown.cancel();
        match self.handle.take() {
            Some(handle) => Ok(handle.await??),
            None => Ok(()),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Stop accepting; the run task finishes on its own.
        self.shutdown.cancel();
    }
}
