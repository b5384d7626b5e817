//! Listener ownership and the shutdown state machine.

use super::connection::{watchdog, Activity, TrackedIo};
use super::{BackgroundTasks, LifecycleSettings, LifecycleState};
use crate::errors::LifecycleError;
use crate::observability::metrics::{record_shutdown_phase, record_shutdown_timeout};
use axum::extract::Request;
use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tower::Service;
use tower_http::timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer, TimeoutLayer};
use tracing::{debug, error, info, warn};

/// Owns the bound listener, the router it serves, and the background task
/// counter handlers register work with.
///
/// Created in `Starting`; [`LifecycleManager::run`] drives it through
/// `Serving` and `Draining` to `Stopped`.
#[derive(Debug)]
pub struct LifecycleManager {
    listener: TcpListener,
    router: Router,
    settings: LifecycleSettings,
    background: BackgroundTasks,
    state_tx: watch::Sender<LifecycleState>,
}

impl LifecycleManager {
    /// Bind the listener and build the router.
    ///
    /// `make_router` receives the manager's [`BackgroundTasks`] handle so that
    /// handlers can register work the shutdown sequence will wait for. The
    /// handler and body timeouts are layered over the result; header, idle
    /// and stalled-write timeouts are enforced per connection by `run`.
    ///
    /// # Errors
    ///
    /// `Bind` if the address is invalid or already in use.
    pub async fn bind<F>(
        settings: LifecycleSettings,
        make_router: F,
    ) -> Result<Self, LifecycleError>
    where
        F: FnOnce(BackgroundTasks) -> Router,
    {
        let listener = TcpListener::bind(settings.bind_address.as_str())
            .await
            .map_err(|source| {
                error!(
                    target: "reddlone.lifecycle",
                    error = %source,
                    address = %settings.bind_address,
                    "Failed to bind listener"
                );
                LifecycleError::Bind {
                    address: settings.bind_address.clone(),
                    source,
                }
            })?;

        let background = BackgroundTasks::new();
        let router = make_router(background.clone())
            .layer(TimeoutLayer::new(settings.write_timeout))
            .layer(ResponseBodyTimeoutLayer::new(settings.write_timeout))
            .layer(RequestBodyTimeoutLayer::new(settings.read_timeout));

        let (state_tx, _) = watch::channel(LifecycleState::Starting);

        if let Ok(addr) = listener.local_addr() {
            info!(target: "reddlone.lifecycle", addr = %addr, "Listener bound");
        }

        Ok(Self {
            listener,
            router,
            settings,
            background,
            state_tx,
        })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the OS error from querying the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the background task counter drained during shutdown.
    pub fn background_tasks(&self) -> BackgroundTasks {
        self.background.clone()
    }

    /// Observe state transitions. The receiver stays valid after `run` returns.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    /// Serve until `shutdown` is cancelled, then drain.
    ///
    /// Connection close is bounded by the grace period; on expiry a
    /// `ShutdownTimeout` is logged and in-flight requests are left to finish
    /// on their own. Background tasks are then awaited with no bound.
    ///
    /// # Errors
    ///
    /// `Serve` if the accept loop task panicked. The drain still runs to
    /// completion first.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), LifecycleError> {
        let Self {
            listener,
            router,
            settings,
            background,
            state_tx,
        } = self;

        let mut server = tokio::spawn(serve(
            listener,
            router,
            settings.clone(),
            shutdown.clone(),
        ));
        set_state(&state_tx, LifecycleState::Serving);

        let early_exit = tokio::select! {
            () = shutdown.cancelled() => None,
            joined = &mut server => Some(joined),
        };

        let drain_started = Instant::now();
        set_state(&state_tx, LifecycleState::Draining);

        let serve_result = match early_exit {
            Some(joined) => {
                let result = flatten(joined);
                if let Err(e) = &result {
                    error!(target: "reddlone.lifecycle", error = %e, "Server stopped unexpectedly");
                }
                result
            }
            None => {
                info!(
                    target: "reddlone.lifecycle",
                    grace_period_secs = settings.grace_period.as_secs(),
                    "Closing connections"
                );
                match tokio::time::timeout(settings.grace_period, &mut server).await {
                    Ok(joined) => flatten(joined),
                    Err(_) => {
                        let timeout = LifecycleError::ShutdownTimeout(settings.grace_period);
                        warn!(
                            target: "reddlone.lifecycle",
                            error = %timeout,
                            "In-flight requests outlived the grace period; leaving them running"
                        );
                        record_shutdown_timeout();
                        Ok(())
                    }
                }
            }
        };
        record_shutdown_phase("grace", drain_started.elapsed());

        let background_started = Instant::now();
        let outstanding = background.active();
        if outstanding > 0 {
            info!(
                target: "reddlone.lifecycle",
                outstanding,
                "Waiting for background tasks to finish"
            );
        }
        background.wait_idle().await;
        record_shutdown_phase("background", background_started.elapsed());
        record_shutdown_phase("total", drain_started.elapsed());

        set_state(&state_tx, LifecycleState::Stopped);
        info!(target: "reddlone.lifecycle", "Shutdown complete");

        serve_result
    }
}

fn set_state(state_tx: &watch::Sender<LifecycleState>, next: LifecycleState) {
    let previous = state_tx.send_replace(next);
    tracing::debug!(
        target: "reddlone.lifecycle",
        from = %previous,
        to = %next,
        "Lifecycle state changed"
    );
}

/// Accept loop. Returns once `shutdown` fires and every accepted connection
/// has closed.
async fn serve(
    listener: TcpListener,
    router: Router,
    settings: LifecycleSettings,
    shutdown: CancellationToken,
) {
    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(settings.read_timeout);
    builder.http2().timer(TokioTimer::new());

    let graceful = GracefulShutdown::new();

    loop {
        let (stream, peer) = tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(target: "reddlone.lifecycle", error = %e, "Failed to accept connection");
                    if !is_connection_error(&e) {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                    continue;
                }
            },
        };

        let activity = Activity::new();
        let io = TokioIo::new(TrackedIo::new(stream, activity.clone()));
        let router = router.clone();
        let service = hyper::service::service_fn(move |request: Request<Incoming>| {
            router.clone().call(request)
        });
        let connection = graceful.watch(builder.serve_connection(io, service).into_owned());

        let idle_timeout = settings.idle_timeout;
        let write_timeout = settings.write_timeout;
        tokio::spawn(async move {
            tokio::select! {
                result = connection => {
                    if let Err(e) = result {
                        debug!(target: "reddlone.lifecycle", peer = %peer, error = %e, "Connection error");
                    }
                }
                reason = watchdog(activity, idle_timeout, write_timeout) => {
                    debug!(
                        target: "reddlone.lifecycle",
                        peer = %peer,
                        reason = reason.as_str(),
                        "Closing inactive connection"
                    );
                }
            }
        });
    }

    drop(listener);
    debug!(
        target: "reddlone.lifecycle",
        open_connections = graceful.count(),
        "Listener closed"
    );
    graceful.shutdown().await;
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

fn flatten(joined: Result<(), JoinError>) -> Result<(), LifecycleError> {
    joined.map_err(|e| LifecycleError::Serve(io::Error::other(e)))
}
