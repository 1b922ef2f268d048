//! Multi-page fetch loop.

use std::time::Duration;

use sdsync_core::Credentials;

use crate::envelope::build_envelope;
use crate::error::SyncError;
use crate::parse::{parse_envelope, EnvelopeError, ParsedEnvelope};
use crate::record::RemoteRecord;
use crate::transport::SoapTransport;
use crate::types::{FetchQuery, PageRequest};

/// Drives one remote operation across pages until the service reports no
/// more data.
#[derive(Debug, Clone)]
pub struct Pager {
    transport: SoapTransport,
    credentials: Credentials,
    max_pages: u32,
    inter_page_delay: Duration,
}

impl Pager {
    #[must_use]
    pub fn new(
        transport: SoapTransport,
        credentials: Credentials,
        max_pages: u32,
        inter_page_delay: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            max_pages,
            inter_page_delay,
        }
    }

    /// Sends one page request and parses the reply. Never inspects the
    /// envelope's error state.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the request could not be completed.
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<ParsedEnvelope, SyncError> {
        let envelope = build_envelope(request, &self.credentials);
        let response = self
            .transport
            .send(
                self.credentials.endpoint(),
                &request.operation.soap_action(),
                envelope,
            )
            .await?;
        Ok(parse_envelope(&response.body, request.operation))
    }

    /// Fetches every page of `query` and returns the normalized records in
    /// page order.
    ///
    /// **All-or-nothing semantics**: if any page fails, records from earlier
    /// pages are discarded and the error is returned. A partial inventory
    /// snapshot presented as complete would understate stock.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Transport`] if a request fails.
    /// - [`SyncError::RemoteBusiness`] if a page reports `IsError`.
    /// - [`SyncError::Parse`] if a page is not a valid response.
    /// - [`SyncError::PaginationLimit`] if more than `max_pages` pages would
    ///   be needed.
    pub async fn fetch_all<T: RemoteRecord>(&self, query: &FetchQuery) -> Result<Vec<T>, SyncError> {
        let operation = query.operation;
        let mut page_number = if query.start_page == 0 {
            tracing::warn!(%operation, "start page 0 requested; pages are 1-based, starting at 1");
            1
        } else {
            query.start_page
        };

        let mut records: Vec<T> = Vec::new();
        let mut page_count = 0u32;

        loop {
            page_count += 1;
            if page_count > self.max_pages {
                return Err(SyncError::PaginationLimit {
                    operation,
                    max_pages: self.max_pages,
                });
            }

            if page_count > 1 && !self.inter_page_delay.is_zero() {
                tokio::time::sleep(self.inter_page_delay).await;
            }

            let envelope = self.fetch_page(&query.page(page_number)).await?;
            match envelope.error() {
                Some(EnvelopeError::Remote(message)) => {
                    tracing::warn!(%operation, page = page_number, remote_message = %message, "remote reported an error");
                    return Err(SyncError::RemoteBusiness {
                        operation,
                        page: page_number,
                        message: message.clone(),
                    });
                }
                Some(EnvelopeError::Parse(reason)) => {
                    tracing::warn!(%operation, page = page_number, reason = %reason, "unparseable response");
                    return Err(SyncError::Parse {
                        operation,
                        page: page_number,
                        reason: reason.clone(),
                    });
                }
                None => {}
            }

            let has_more = envelope.has_more(page_number);
            let raw = envelope.into_records();
            let received = raw.len();
            let before = records.len();
            records.extend(raw.iter().filter_map(T::normalize));
            tracing::debug!(
                %operation,
                page = page_number,
                received,
                kept = records.len() - before,
                has_more,
                "fetched page"
            );

            if !has_more {
                break;
            }
            page_number = page_number
                .checked_add(1)
                .ok_or(SyncError::PaginationLimit {
                    operation,
                    max_pages: self.max_pages,
                })?;
        }

        tracing::info!(%operation, pages = page_count, records = records.len(), "fetch complete");
        Ok(records)
    }
}
