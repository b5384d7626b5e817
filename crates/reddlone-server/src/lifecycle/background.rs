//! Counting barrier for background work.
//!
//! Handlers that start work which may outlive the request register it here.
//! Shutdown waits for the count to return to zero before the process is
//! allowed to exit. Registration is a plain atomic increment and cannot fail.

use crate::observability::metrics::set_background_tasks_active;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct Inner {
    active: AtomicUsize,
    idle: Notify,
}

/// Cloneable handle to the background task counter.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a unit of background work.
    ///
    /// The work counts as finished when the returned guard is completed or dropped.
    pub fn register(&self) -> BackgroundTaskGuard {
        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        set_background_tasks_active(active);
        tracing::trace!(target: "reddlone.lifecycle.background", active, "Background task registered");

        BackgroundTaskGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Spawn `task` on the runtime as tracked background work.
    ///
    /// The registration ends when the task returns or panics.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let guard = self.register();
        tokio::spawn(async move {
            let _guard = guard;
            task.await
        })
    }

    /// Number of registered tasks not yet completed.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Wait until no background work is outstanding. There is no timeout.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register interest before reading the count so a completion
            // between the load and the await is not missed.
            notified.as_mut().enable();

            if self.inner.active.load(Ordering::SeqCst) == 0 {
                return;
            }

            notified.await;
        }
    }
}

/// Marks one unit of background work as outstanding until dropped.
#[derive(Debug)]
#[must_use = "dropping the guard immediately completes the background task"]
pub struct BackgroundTaskGuard {
    inner: Arc<Inner>,
}

impl BackgroundTaskGuard {
    /// Mark the work as finished.
    pub fn complete(self) {
        drop(self);
    }
}

impl Drop for BackgroundTaskGuard {
    fn drop(&mut self) {
        let previous = self.inner.active.fetch_sub(1, Ordering::SeqCst);
        let active = previous.saturating_sub(1);
        set_background_tasks_active(active);
        tracing::trace!(target: "reddlone.lifecycle.background", active, "Background task completed");

        if active == 0 {
            self.inner.idle.notify_waiters();
        }
    }
}
