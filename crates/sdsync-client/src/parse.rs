//! Response envelope parsing.
//!
//! Turns a raw SOAP response into a [`ParsedEnvelope`]: an error indicator,
//! the continuation signal, and the operation's record list located by
//! trying each known wrapper shape in priority order. This never fails;
//! malformed input is reported as an error envelope so the pager can decide
//! what to do with it.

use crate::types::Operation;
use crate::xml::{parse_document, XmlValue};

/// Why an envelope carries no usable records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The service set `IsError`.
    Remote(String),
    /// The body was not a well-formed response for the operation.
    Parse(String),
}

/// Legacy paging block some order responses carry instead of `More`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_size: u64,
    pub records_affected: u64,
}

/// One record as found in the response, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub fields: XmlValue,
    /// Enclosing element for records nested under a parent, such as orders
    /// grouped by customer. The parent's own record list is stripped.
    pub parent: Option<XmlValue>,
}

impl RawRecord {
    #[must_use]
    pub fn new(fields: XmlValue) -> Self {
        Self {
            fields,
            parent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEnvelope {
    error: Option<EnvelopeError>,
    more: Option<bool>,
    pagination: Option<Pagination>,
    records: Vec<RawRecord>,
}

impl ParsedEnvelope {
    fn parse_failure(reason: impl Into<String>) -> Self {
        Self {
            error: Some(EnvelopeError::Parse(reason.into())),
            more: None,
            pagination: None,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn error(&self) -> Option<&EnvelopeError> {
        self.error.as_ref()
    }

    /// Human-readable error text; parse failures are prefixed so they can be
    /// told apart from messages the service sent.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            Some(EnvelopeError::Remote(message)) => Some(message.clone()),
            Some(EnvelopeError::Parse(reason)) => Some(format!("parse failure: {reason}")),
            None => None,
        }
    }

    /// Whether another page follows `page_number`.
    ///
    /// `More` wins when present. Otherwise the legacy `Pagination` block is
    /// consulted; with neither, the fetch stops.
    #[must_use]
    pub fn has_more(&self, page_number: u32) -> bool {
        if self.is_error() {
            return false;
        }
        if let Some(more) = self.more {
            return more;
        }
        self.pagination.is_some_and(|p| {
            u64::from(page_number).saturating_mul(p.page_size) < p.records_affected
        })
    }

    #[must_use]
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }
}

enum RecordPath {
    Flat(&'static [&'static str]),
    /// Records grouped under repeated parents, e.g. orders per customer.
    Nested {
        parents: &'static [&'static str],
        records: &'static [&'static str],
    },
}

fn record_paths(operation: Operation) -> &'static [RecordPath] {
    match operation {
        Operation::GetStockLevels => &[
            RecordPath::Flat(&["StockLevels", "StockLevelItem"]),
            RecordPath::Flat(&["StockLevels", "StockLevel"]),
        ],
        Operation::GetCustomerOrders => &[
            RecordPath::Nested {
                parents: &["Customers", "Customer"],
                records: &["Orders", "Order"],
            },
            RecordPath::Flat(&["Orders", "Order"]),
            RecordPath::Flat(&["Orders", "OrderItem"]),
        ],
        Operation::GetProducts => &[
            RecordPath::Flat(&["Products", "Product"]),
            RecordPath::Flat(&["Products", "ProductItem"]),
        ],
    }
}

fn extract_records(result: &XmlValue, operation: Operation) -> Vec<RawRecord> {
    for candidate in record_paths(operation) {
        match candidate {
            RecordPath::Flat(path) => {
                if let Some(found) = result.path(path) {
                    return found
                        .items()
                        .into_iter()
                        .map(|item| RawRecord::new(item.clone()))
                        .collect();
                }
            }
            RecordPath::Nested { parents, records } => {
                if let Some(found) = result.path(parents) {
                    let mut out = Vec::new();
                    for parent in found.items() {
                        let Some(children) = parent.path(records) else {
                            continue;
                        };
                        let context = parent.without(records[0]);
                        out.extend(children.items().into_iter().map(|item| RawRecord {
                            fields: item.clone(),
                            parent: Some(context.clone()),
                        }));
                    }
                    return out;
                }
            }
        }
    }
    Vec::new()
}

fn parse_pagination(result: &XmlValue) -> Option<Pagination> {
    let block = result.child("Pagination")?;
    let page_size = block.child_text("PageSize")?.trim().parse().ok()?;
    let records_affected = block.child_text("RecordsAffected")?.trim().parse().ok()?;
    Some(Pagination {
        page_size,
        records_affected,
    })
}

/// Parses the response body for `operation`.
#[must_use]
pub fn parse_envelope(raw: &str, operation: Operation) -> ParsedEnvelope {
    let doc = match parse_document(raw) {
        Ok(doc) => doc,
        Err(err) => return ParsedEnvelope::parse_failure(err.to_string()),
    };

    let Some(body) = doc.path(&["Envelope", "Body"]) else {
        return ParsedEnvelope::parse_failure("missing soap:Envelope/soap:Body");
    };

    let response_name = operation.response_element();
    let result_name = operation.result_element();
    let Some(result) = body
        .child(&response_name)
        .and_then(|response| response.child(&result_name))
    else {
        let fault = body
            .path(&["Fault", "faultstring"])
            .and_then(XmlValue::text)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        return ParsedEnvelope::parse_failure(match fault {
            Some(fault) => format!("missing {response_name}/{result_name} (SOAP fault: {fault})"),
            None => format!("missing {response_name}/{result_name}"),
        });
    };

    if result.child_text("IsError") == Some("true") {
        let message = result
            .child_text("ErrorMessage")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown error")
            .to_string();
        return ParsedEnvelope {
            error: Some(EnvelopeError::Remote(message)),
            more: None,
            pagination: None,
            records: Vec::new(),
        };
    }

    let more = result
        .child_text("More")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s == "true");

    ParsedEnvelope {
        error: None,
        more,
        pagination: parse_pagination(result),
        records: extract_records(result, operation),
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
