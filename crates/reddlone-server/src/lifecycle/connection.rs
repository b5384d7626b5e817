//! Per-connection socket activity tracking.
//!
//! hyper bounds the header phase itself; everything after that (an idle
//! keep-alive connection, or a peer that stops reading its response) is
//! caught here by watching the raw socket.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;

const NOT_STALLED: u64 = u64::MAX;

/// Why a connection was closed by its watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Inactivity {
    Idle,
    WriteStalled,
}

impl Inactivity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Inactivity::Idle => "idle",
            Inactivity::WriteStalled => "write_stalled",
        }
    }
}

/// Timestamps (millis since `origin`) shared between the socket and its watchdog.
#[derive(Debug)]
pub(crate) struct Activity {
    origin: Instant,
    last_io_ms: AtomicU64,
    write_blocked_since_ms: AtomicU64,
}

impl Activity {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            last_io_ms: AtomicU64::new(0),
            write_blocked_since_ms: AtomicU64::new(NOT_STALLED),
        })
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX - 1)
    }

    fn touch(&self) {
        self.last_io_ms.store(self.now_ms(), Ordering::Relaxed);
    }

    fn write_ready(&self) {
        self.touch();
        self.write_blocked_since_ms
            .store(NOT_STALLED, Ordering::Relaxed);
    }

    fn write_blocked(&self) {
        let now = self.now_ms();
        let _ = self.write_blocked_since_ms.compare_exchange(
            NOT_STALLED,
            now,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    /// Earliest instant the connection becomes inactive, and why.
    fn deadline(&self, idle: Duration, write: Duration) -> (u64, Inactivity) {
        let idle_at = self
            .last_io_ms
            .load(Ordering::Relaxed)
            .saturating_add(duration_ms(idle));
        match self.write_blocked_since_ms.load(Ordering::Relaxed) {
            NOT_STALLED => (idle_at, Inactivity::Idle),
            since => {
                let stalled_at = since.saturating_add(duration_ms(write));
                if stalled_at < idle_at {
                    (stalled_at, Inactivity::WriteStalled)
                } else {
                    (idle_at, Inactivity::Idle)
                }
            }
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Resolves once the connection has gone `idle` without any socket I/O, or
/// a write has been blocked for longer than `write`.
pub(crate) async fn watchdog(
    activity: Arc<Activity>,
    idle: Duration,
    write: Duration,
) -> Inactivity {
    loop {
        let (deadline, reason) = activity.deadline(idle, write);
        let now = activity.now_ms();
        if now >= deadline {
            return reason;
        }
        // A write can block after this sleep starts; cap the nap so it is noticed.
        let nap = Duration::from_millis(deadline - now).min(write);
        tokio::time::sleep(nap).await;
    }
}

/// Socket wrapper recording every completed read and write in [`Activity`].
#[derive(Debug)]
pub(crate) struct TrackedIo<T> {
    inner: T,
    activity: Arc<Activity>,
}

impl<T> TrackedIo<T> {
    pub(crate) fn new(inner: T, activity: Arc<Activity>) -> Self {
        Self { inner, activity }
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for TrackedIo<T> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if poll.is_ready() {
            self.activity.touch();
        }
        poll
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for TrackedIo<T> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        self.record_write(poll.is_ready());
        poll
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write_vectored(cx, bufs);
        self.record_write(poll.is_ready());
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let poll = Pin::new(&mut self.inner).poll_flush(cx);
        self.record_write(poll.is_ready());
        poll
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl<T> TrackedIo<T> {
    fn record_write(&self, ready: bool) {
        if ready {
            self.activity.write_ready();
        } else {
            self.activity.write_blocked();
        }
    }
}
