//! Request-side types shared by the envelope builder, pager and facade.

use std::fmt;

use chrono::NaiveDate;
use sdsync_core::OrderType;

/// XML namespace of the SellerDynamics service. Every `SOAPAction` header is
/// this namespace followed by the operation name.
pub const SERVICE_NAMESPACE: &str = "https://my.sellerdynamics.com/";

/// Remote operations the client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetStockLevels,
    GetCustomerOrders,
    GetProducts,
}

impl Operation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GetStockLevels => "GetStockLevels",
            Self::GetCustomerOrders => "GetCustomerOrders",
            Self::GetProducts => "GetProducts",
        }
    }

    /// Value of the `SOAPAction` header. Must agree with the body element
    /// emitted by [`crate::envelope::build_envelope`].
    #[must_use]
    pub fn soap_action(self) -> String {
        format!("{SERVICE_NAMESPACE}{}", self.name())
    }

    #[must_use]
    pub fn response_element(self) -> String {
        format!("{}Response", self.name())
    }

    #[must_use]
    pub fn result_element(self) -> String {
        format!("{}Result", self.name())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation-specific envelope parameters beyond credentials and paging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationParams {
    None,
    Orders {
        order_type: OrderType,
        from_date: NaiveDate,
        to_date: NaiveDate,
    },
}

/// One page of one remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub operation: Operation,
    pub page_number: u32,
    pub page_size: u32,
    pub params: OperationParams,
}

/// A whole-result-set fetch, driven page by page by the pager.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchQuery {
    pub operation: Operation,
    pub start_page: u32,
    pub page_size: u32,
    pub params: OperationParams,
}

impl FetchQuery {
    #[must_use]
    pub fn page(&self, page_number: u32) -> PageRequest {
        PageRequest {
            operation: self.operation,
            page_number,
            page_size: self.page_size,
            params: self.params.clone(),
        }
    }

    /// Cache key covering the operation and every parameter that changes
    /// the result set. Credentials are excluded; one client serves one
    /// retailer.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut key = format!(
            "{}|start={}|size={}",
            self.operation, self.start_page, self.page_size
        );
        if let OperationParams::Orders {
            order_type,
            from_date,
            to_date,
        } = &self.params
        {
            key.push_str(&format!(
                "|type={order_type}|from={}|to={}",
                from_date.format("%Y-%m-%d"),
                to_date.format("%Y-%m-%d")
            ));
        }
        key
    }
}

/// Caller options for stock-level and product fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Falls back to the configured page size.
    pub page_size: Option<u32>,
    /// Falls back to page 1.
    pub start_page: Option<u32>,
}

/// Caller options for an order fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub order_type: OrderType,
    /// Falls back to the configured orders page size.
    pub page_size: Option<u32>,
}

impl OrderQuery {
    /// Pending orders between two dates, inclusive.
    #[must_use]
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self {
            from_date,
            to_date,
            order_type: OrderType::default(),
            page_size: None,
        }
    }

    #[must_use]
    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }
}

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}
