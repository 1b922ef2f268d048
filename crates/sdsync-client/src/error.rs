use thiserror::Error;

use crate::types::Operation;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(#[from] sdsync_core::ConfigError),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} page {page} rejected by remote: {message}")]
    RemoteBusiness {
        operation: Operation,
        page: u32,
        message: String,
    },

    #[error("{operation} page {page} could not be parsed: {reason}")]
    Parse {
        operation: Operation,
        page: u32,
        reason: String,
    },

    #[error("pagination limit reached for {operation}: exceeded {max_pages} pages")]
    PaginationLimit { operation: Operation, max_pages: u32 },

    #[error("rate limiter is no longer running")]
    RateLimiterClosed,
}

impl SyncError {
    /// Message suitable for surfacing to callers of the sync facade.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::RemoteBusiness { message, .. } => Some(message),
            _ => None,
        }
    }
}
