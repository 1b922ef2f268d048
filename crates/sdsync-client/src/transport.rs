//! HTTP transport for SOAP envelopes.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::error::SyncError;
use crate::types::RawResponse;

const USER_AGENT: &str = concat!("sdsync/", env!("CARGO_PKG_VERSION"));

/// Posts envelopes and hands back the raw response.
///
/// A non-2xx status is not an error here: the service reports SOAP faults
/// with HTTP 500 and a parseable body, so the body is always returned for the
/// parser to judge.
#[derive(Debug, Clone)]
pub struct SoapTransport {
    client: Client,
}

impl SoapTransport {
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] on connection failure, timeout, or an
    /// unreadable body.
    pub async fn send(
        &self,
        endpoint: &str,
        soap_action: &str,
        envelope: String,
    ) -> Result<RawResponse, SyncError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", soap_action)
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                soap_action,
                "remote returned non-success status; parsing body anyway"
            );
        }

        let body = response.text().await?;
        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}
