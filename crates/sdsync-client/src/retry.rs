//! Whole-fetch retry for transient transport failures.
//!
//! A remote business error or a parse failure is the remote's answer to the
//! request and comes back unchanged on a second attempt, so only transport
//! failures are retried.

use std::future::Future;
use std::time::Duration;

use crate::error::SyncError;
use crate::types::FetchQuery;

const MAX_DELAY: Duration = Duration::from_secs(60);

/// How often a failed fetch is repeated and how long to wait in between.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) backoff_base: Duration,
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1-based).
    ///
    /// Doubles from `backoff_base` per retry, is capped at one minute and is
    /// then scaled by a random factor in `0.75..=1.25` so that callers failing
    /// together do not come back together.
    pub(crate) fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        let doubled = self.backoff_base.saturating_mul(factor).min(MAX_DELAY);
        doubled.mul_f64(rand::random_range(0.75..=1.25))
    }
}

/// Timeouts and connection failures; nothing the remote actually answered.
pub(crate) fn is_retriable(err: &SyncError) -> bool {
    match err {
        SyncError::Transport(e) => e.is_timeout() || e.is_connect(),
        SyncError::Configuration(_)
        | SyncError::RemoteBusiness { .. }
        | SyncError::Parse { .. }
        | SyncError::PaginationLimit { .. }
        | SyncError::RateLimiterClosed => false,
    }
}

/// Runs `attempt` for `query`, repeating it after a back-off while it fails
/// with a retriable error and `policy` allows another try.
///
/// Each call of `attempt` is a complete fetch from the first page; pages
/// gathered by a failed attempt are never reused.
pub(crate) async fn retry_fetch<T, F, Fut>(
    policy: RetryPolicy,
    query: &FetchQuery,
    mut attempt: F,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match attempt().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(
                        operation = %query.operation,
                        retries,
                        "fetch succeeded after retrying"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retriable(&err) {
            return Err(err);
        }
        if retries >= policy.max_retries {
            if retries > 0 {
                tracing::error!(
                    operation = %query.operation,
                    retries,
                    error = %err,
                    "fetch still failing, giving up"
                );
            }
            return Err(err);
        }

        retries += 1;
        let delay = policy.delay_for(retries);
        tracing::warn!(
            operation = %query.operation,
            start_page = query.start_page,
            page_size = query.page_size,
            retry = retries,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis(),
            error = %err,
            "fetch hit a transport error, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
