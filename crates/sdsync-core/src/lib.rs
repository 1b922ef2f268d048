pub mod config;
pub mod records;

use thiserror::Error;

pub use config::{
    load_sync_config, load_sync_config_from_env, Credentials, SyncConfig, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use records::{Order, OrderType, Product, StockLevel, UnknownOrderType};

/// Errors raised while loading or validating client configuration.
///
/// Any of these is fatal to the sync client: it is raised before a single
/// request is sent and is never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid configuration for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
