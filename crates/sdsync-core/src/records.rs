//! Normalized records produced by the sync client.
//!
//! These shapes are independent of whichever SellerDynamics response variant
//! produced them. Every field is always populated: absent or malformed source
//! values are replaced by the defaults documented on each field.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stock position for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Never empty. Unique within a page but not across pages; callers that
    /// need a unique set must dedupe.
    pub sku: String,
    /// Falls back to `"Product {sku}"` when the remote sends no name.
    pub product_name: String,
    pub quantity: u64,
    pub quantity_allocated: u64,
    /// `quantity - quantity_allocated`; negative when over-allocated.
    pub available_quantity: i64,
    pub supplier_stock_level: u64,
    /// Falls back to `"Unknown Vendor"`.
    pub vendor: String,
    /// Remote category / product type. Falls back to `"General"`.
    pub product_type: String,
    pub price: Decimal,
    pub cost: Decimal,
    /// `false` for kit/bundle listings built from a master product.
    pub is_master_product: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    /// Falls back to `"#{order_id}"`.
    pub order_number: String,
    /// Falls back to `"Unknown"`.
    pub customer_name: String,
    /// Empty when the remote sends no address.
    pub customer_email: String,
    pub order_date: Option<DateTime<Utc>>,
    pub total_amount: Decimal,
    /// Falls back to `"Pending"`.
    pub status: String,
    /// Falls back to `"Unknown"`.
    pub marketplace: String,
}

/// A catalogue product.
///
/// Only `product_id` is guaranteed; every other scalar field the remote sent
/// is carried through untouched in `fields`, keyed by its element name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub fields: BTreeMap<String, String>,
}

/// Order status filter accepted by `GetCustomerOrders`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderType {
    /// Wire literal sent in the `orderType` element.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown order type \"{0}\" (expected pending, completed or cancelled)")]
pub struct UnknownOrderType(pub String);

impl FromStr for OrderType {
    type Err = UnknownOrderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            _ => Err(UnknownOrderType(s.to_string())),
        }
    }
}
