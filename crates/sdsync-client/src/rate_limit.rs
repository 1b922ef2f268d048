//! Process-wide spacing of remote calls.
//!
//! The service throttles per account, so every fetch, across every
//! operation, must start at least `min_interval` after the previous one
//! started. A single task owns the timestamp of the last call and grants
//! permits in arrival order; callers hold a cheap cloneable handle.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::error::SyncError;

/// Handle to the rate-limiter task.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    requests: mpsc::UnboundedSender<oneshot::Sender<()>>,
}

impl RateLimiter {
    /// Starts the limiter task on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(min_interval: Duration) -> Self {
        let (requests, inbox) = mpsc::unbounded_channel();
        tokio::spawn(run(inbox, min_interval));
        Self { requests }
    }

    /// Waits until a remote call may start.
    ///
    /// Permits are granted in the order `throttle` was called. Dropping the
    /// future before it resolves gives up the place in the queue.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RateLimiterClosed`] if the limiter task has
    /// stopped, which only happens when its runtime shuts down.
    pub async fn throttle(&self) -> Result<(), SyncError> {
        let (grant, granted) = oneshot::channel();
        self.requests
            .send(grant)
            .map_err(|_| SyncError::RateLimiterClosed)?;
        granted.await.map_err(|_| SyncError::RateLimiterClosed)
    }
}

async fn run(mut inbox: mpsc::UnboundedReceiver<oneshot::Sender<()>>, min_interval: Duration) {
    let mut last_call: Option<Instant> = None;
    while let Some(grant) = inbox.recv().await {
        if grant.is_closed() {
            continue;
        }
        if let Some(last) = last_call {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                let wait = min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis(), "throttling remote call");
                tokio::time::sleep(wait).await;
            }
        }
        // Stamped at grant time, not when the call finishes.
        if grant.send(()).is_ok() {
            last_call = Some(Instant::now());
        }
    }
}
