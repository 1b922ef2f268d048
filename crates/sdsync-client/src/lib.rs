//! Client for the SellerDynamics SOAP inventory and order service.
//!
//! [`SyncClient`] is the entry point. It wraps a [`Pager`] that walks the
//! service's page sequence, a process-wide [`RateLimiter`], and a TTL cache of
//! complete result sets.

pub mod cache;
pub mod client;
pub mod envelope;
pub mod error;
pub mod normalize;
pub mod pagination;
pub mod parse;
pub mod rate_limit;
pub mod record;
mod retry;
pub mod transport;
pub mod types;
pub mod xml;

pub use cache::{CachedRecords, RecordsCache};
pub use client::SyncClient;
pub use envelope::build_envelope;
pub use error::SyncError;
pub use normalize::{is_master_product, normalize_order, normalize_product, normalize_stock_level};
pub use pagination::Pager;
pub use parse::{parse_envelope, EnvelopeError, ParsedEnvelope, RawRecord};
pub use rate_limit::RateLimiter;
pub use record::RemoteRecord;
pub use transport::SoapTransport;
pub use types::{FetchQuery, Operation, OperationParams, OrderQuery, PageOptions, PageRequest};
