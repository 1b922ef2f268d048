use crate::ConfigError;

/// Page size used for stock-level and product fetches when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 5000;

/// Largest page size the remote system accepts.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Connection details for the remote SellerDynamics endpoint.
///
/// The login token arrives pre-encrypted from SellerDynamics and is embedded
/// in request envelopes verbatim. Construction only checks that each value is
/// present; the token's content is never inspected.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    endpoint: String,
    retailer_id: String,
    encrypted_login: String,
}

impl Credentials {
    /// Builds credentials, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if any value is empty or
    /// whitespace-only.
    pub fn new(
        endpoint: impl Into<String>,
        retailer_id: impl Into<String>,
        encrypted_login: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let endpoint = non_blank("endpoint", endpoint.into())?;
        let retailer_id = non_blank("retailer_id", retailer_id.into())?;
        let encrypted_login = non_blank("encrypted_login", encrypted_login.into())?;
        Ok(Self {
            endpoint,
            retailer_id,
            encrypted_login,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn retailer_id(&self) -> &str {
        &self.retailer_id
    }

    #[must_use]
    pub fn encrypted_login(&self) -> &str {
        &self.encrypted_login
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("retailer_id", &self.retailer_id)
            .field("encrypted_login", &"[redacted]")
            .finish()
    }
}

fn non_blank(field: &str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "must not be blank".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Runtime settings for the sync client.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub credentials: Credentials,
    /// Minimum gap between the start of any two remote calls, process-wide.
    pub min_call_interval_ms: u64,
    pub cache_ttl_ms: u64,
    /// Page size for `GetStockLevels` and `GetProducts`.
    pub page_size: u32,
    /// Page size for `GetCustomerOrders`; the remote rejects large order pages.
    pub orders_page_size: u32,
    pub request_timeout_secs: u64,
    /// Extra attempts for a fetch that failed on a transient transport error.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Hard ceiling on pages per fetch. The remote's `More` flag is the only
    /// termination signal and has been seen stuck on `true`.
    pub max_pages: u32,
    /// Pause between successive pages of a single fetch.
    pub inter_page_delay_ms: u64,
    pub log_level: String,
}

impl SyncConfig {
    /// Returns a configuration with every tunable at its default.
    #[must_use]
    pub fn with_defaults(credentials: Credentials) -> Self {
        Self {
            credentials,
            min_call_interval_ms: 60_000,
            cache_ttl_ms: 300_000,
            page_size: DEFAULT_PAGE_SIZE,
            orders_page_size: 100,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_backoff_base_ms: 1_000,
            max_pages: 5_000,
            inter_page_delay_ms: 100,
            log_level: "info".to_string(),
        }
    }

    /// Checks invariants that environment loading enforces, for configs
    /// built or modified in code.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, size) in [
            ("page_size", self.page_size),
            ("orders_page_size", self.orders_page_size),
        ] {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("must be between 1 and {MAX_PAGE_SIZE}, got {size}"),
                });
            }
        }
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_pages".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Load sync configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_sync_config() -> Result<SyncConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_sync_config_from_env()
}

/// Load sync configuration from environment variables already in the process.
///
/// Unlike [`load_sync_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_sync_config_from_env() -> Result<SyncConfig, ConfigError> {
    build_sync_config(|key| std::env::var(key))
}

/// Build sync configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_sync_config<F>(lookup: F) -> Result<SyncConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let bounded_page_size = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let size = parse_u32(var, default)?;
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}, got {size}"),
            });
        }
        Ok(size)
    };

    let credentials = Credentials::new(
        require("SELLERDYNAMICS_SOAP_ENDPOINT")?,
        require("SELLERDYNAMICS_RETAILER_ID")?,
        require("SELLERDYNAMICS_ENCRYPTED_LOGIN")?,
    )?;

    let min_call_interval_ms = parse_u64("SDSYNC_MIN_CALL_INTERVAL_MS", "60000")?;
    let cache_ttl_ms = parse_u64("SDSYNC_CACHE_TTL_MS", "300000")?;
    let page_size = bounded_page_size("SDSYNC_PAGE_SIZE", "5000")?;
    let orders_page_size = bounded_page_size("SDSYNC_ORDERS_PAGE_SIZE", "100")?;
    let request_timeout_secs = parse_u64("SDSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("SDSYNC_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("SDSYNC_RETRY_BACKOFF_BASE_MS", "1000")?;
    let max_pages = parse_u32("SDSYNC_MAX_PAGES", "5000")?;
    if max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SDSYNC_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let inter_page_delay_ms = parse_u64("SDSYNC_INTER_PAGE_DELAY_MS", "100")?;
    let log_level = or_default("SDSYNC_LOG_LEVEL", "info");

    Ok(SyncConfig {
        credentials,
        min_call_interval_ms,
        cache_ttl_ms,
        page_size,
        orders_page_size,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        max_pages,
        inter_page_delay_ms,
        log_level,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
