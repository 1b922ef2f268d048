//! Cached, rate-limited facade over the SellerDynamics SOAP service.

mod operations;

use std::sync::Arc;
use std::time::Duration;

use sdsync_core::{SyncConfig, MAX_PAGE_SIZE};

use crate::cache::RecordsCache;
use crate::error::SyncError;
use crate::pagination::Pager;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::transport::SoapTransport;

/// Client for the three read operations the sync needs.
///
/// Cloning is cheap and clones share the cache and the rate limiter. Build
/// one per process: two independent clients would each space their own
/// calls and together exceed the remote's per-account limit.
#[derive(Debug, Clone)]
pub struct SyncClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    pager: Pager,
    limiter: RateLimiter,
    cache: RecordsCache,
    page_size: u32,
    orders_page_size: u32,
    retry: RetryPolicy,
}

impl SyncClient {
    /// Builds a client and starts its rate limiter on the current Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if `config` fails validation, or
    /// [`SyncError::Transport`] if the HTTP client cannot be constructed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the rate limiter task
    /// is spawned here.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        config.validate()?;
        let transport = SoapTransport::new(config.request_timeout_secs)?;
        let pager = Pager::new(
            transport,
            config.credentials.clone(),
            config.max_pages,
            Duration::from_millis(config.inter_page_delay_ms),
        );
        Ok(Self {
            inner: Arc::new(Inner {
                pager,
                limiter: RateLimiter::spawn(Duration::from_millis(config.min_call_interval_ms)),
                cache: RecordsCache::new(Duration::from_millis(config.cache_ttl_ms)),
                page_size: config.page_size,
                orders_page_size: config.orders_page_size,
                retry: RetryPolicy {
                    max_retries: config.max_retries,
                    backoff_base: Duration::from_millis(config.retry_backoff_base_ms),
                },
            }),
        })
    }

    /// Drops every cached result set.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        tracing::info!("sync cache cleared");
    }
}

/// Caller-supplied page sizes are clamped into the range the remote accepts.
fn resolve_page_size(requested: Option<u32>, configured: u32) -> u32 {
    requested.unwrap_or(configured).clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_falls_back_to_configured() {
        assert_eq!(resolve_page_size(None, 5000), 5000);
        assert_eq!(resolve_page_size(Some(250), 5000), 250);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(resolve_page_size(Some(0), 100), 1);
        assert_eq!(resolve_page_size(Some(1_000_000), 100), MAX_PAGE_SIZE);
    }
}
