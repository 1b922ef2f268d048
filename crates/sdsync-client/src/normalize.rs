//! Normalization from raw response records to [`sdsync_core`] record types.
//!
//! Each output field is read through an ordered list of aliases because the
//! service names the same value differently across response variants
//! (`ProductName` / `ProductTitle` / `Title`, `Price` / `UnitPrice`, ...).
//! The first alias holding a usable value wins; when none does, the field's
//! documented default is used. Records without any identity alias cannot be
//! keyed downstream and are skipped.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use sdsync_core::{Order, Product, StockLevel};

use crate::parse::RawRecord;
use crate::xml::XmlValue;

/// Where to look for a field value.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// Direct child of the record.
    Field(&'static str),
    /// Nested path under the record.
    Path(&'static [&'static str]),
    /// Direct child of the enclosing parent, for nested records.
    Parent(&'static str),
}

use Source::{Field, Parent, Path};

impl Source {
    fn resolve(self, record: &RawRecord) -> Option<&str> {
        match self {
            Field(name) => record.fields.child_text(name),
            Path(names) => record.fields.path(names).and_then(XmlValue::text),
            Parent(name) => record.parent.as_ref()?.child_text(name),
        }
    }
}

fn first_text(record: &RawRecord, chain: &[Source]) -> Option<String> {
    chain
        .iter()
        .filter_map(|source| source.resolve(record))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// First alias holding a non-zero finite number, clamped to zero from below.
fn first_count(record: &RawRecord, chain: &[Source]) -> u64 {
    chain
        .iter()
        .filter_map(|source| source.resolve(record))
        .filter_map(|value| value.trim().parse::<f64>().ok())
        .find(|n| n.is_finite() && *n != 0.0)
        .map_or(0, |n| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = n.max(0.0).trunc() as u64;
            count
        })
}

/// First alias holding a non-zero decimal; zero otherwise.
fn first_decimal(record: &RawRecord, chain: &[Source]) -> Decimal {
    chain
        .iter()
        .filter_map(|source| source.resolve(record))
        .filter_map(|value| {
            let value = value.trim();
            Decimal::from_str(value)
                .or_else(|_| Decimal::from_scientific(value))
                .ok()
        })
        .find(|d| !d.is_zero())
        .unwrap_or(Decimal::ZERO)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// First alias holding a parseable timestamp. Offset-less values are UTC.
fn first_timestamp(record: &RawRecord, chain: &[Source]) -> Option<DateTime<Utc>> {
    chain
        .iter()
        .filter_map(|source| source.resolve(record))
        .find_map(parse_timestamp)
}

const SKU: &[Source] = &[Field("SKU"), Field("Sku"), Field("ProductCode")];
const PRODUCT_NAME: &[Source] = &[Field("ProductName"), Field("ProductTitle"), Field("Title")];
const QUANTITY: &[Source] = &[Field("Quantity"), Field("QuantityInStock")];
const QUANTITY_ALLOCATED: &[Source] = &[Field("QuantityAllocated"), Field("AllocatedQuantity")];
const SUPPLIER_STOCK: &[Source] = &[Field("SupplierStockLevel"), Field("SupplierStock")];
const VENDOR: &[Source] = &[Field("Vendor"), Field("Supplier"), Field("Brand")];
const PRODUCT_TYPE: &[Source] = &[Field("ProductType"), Field("Category"), Field("Type")];
const PRICE: &[Source] = &[Field("Price"), Field("UnitPrice")];
const COST: &[Source] = &[Field("Cost"), Field("UnitCost")];
const CREATED_AT: &[Source] = &[Field("CreatedAt"), Field("DateCreated")];
const UPDATED_AT: &[Source] = &[Field("UpdatedAt"), Field("DateUpdated"), Field("LastUpdated")];

const ORDER_ID: &[Source] = &[Field("OrderId"), Field("OrderID"), Field("Id")];
const ORDER_NUMBER: &[Source] = &[Field("OrderNumber"), Field("Reference")];
const CUSTOMER_NAME: &[Source] = &[
    Field("CustomerName"),
    Path(&["Customer", "Name"]),
    Parent("CustomerName"),
    Parent("Name"),
];
const CUSTOMER_FIRST_NAME: &[Source] = &[Field("CustomerFirstName"), Path(&["Customer", "FirstName"])];
const CUSTOMER_LAST_NAME: &[Source] = &[Field("CustomerLastName"), Path(&["Customer", "LastName"])];
const CUSTOMER_EMAIL: &[Source] = &[
    Field("CustomerEmail"),
    Path(&["Customer", "Email"]),
    Parent("CustomerEmail"),
    Parent("Email"),
];
const ORDER_DATE: &[Source] = &[Field("OrderDate"), Field("CreatedAt"), Field("DateCreated")];
const TOTAL_AMOUNT: &[Source] = &[Field("TotalAmount"), Field("TotalPrice"), Field("Total")];
const STATUS: &[Source] = &[Field("Status"), Field("OrderStatus")];
const MARKETPLACE: &[Source] = &[Field("Marketplace"), Field("Channel"), Field("SalesChannel")];

const PRODUCT_ID: &[Source] = &[
    Field("ProductId"),
    Field("ProductID"),
    Field("GoodId"),
    Field("Id"),
];
const PRODUCT_TITLE: &[Source] = &[Field("ProductName"), Field("Title"), Field("ProductTitle")];

static KIT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*x|\bkits?\b|\bbundles?\b|\bpacks?\b").expect("valid regex")
});
static NUMERIC_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+$").expect("valid regex"));

const IS_KIT: &[Source] = &[Field("IsKit")];

/// `false` for kit and bundle listings assembled from a master product.
///
/// A listing is a kit when its name or SKU carries a multiplier (`2x`,
/// `3 x`, `10X25`), the words kit / bundle / pack, or ends in a numeric suffix
/// (`ABC-12`). Wago connector codes use numeric suffixes for distinct parts
/// and are exempt from the suffix rule.
#[must_use]
pub fn is_master_product(product_name: &str, sku: &str) -> bool {
    let is_kit = [product_name, sku].iter().any(|value| {
        KIT_MARKER.is_match(value)
            || (NUMERIC_SUFFIX.is_match(value.trim()) && !value.to_lowercase().contains("wago"))
    });
    !is_kit
}

fn classify(record: &RawRecord, product_name: &str, sku: &str) -> bool {
    match first_text(record, IS_KIT).as_deref() {
        Some("true") => false,
        Some("false") => true,
        _ => is_master_product(product_name, sku),
    }
}

fn to_signed(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Normalizes one stock record. Returns `None` when the record has no SKU.
#[must_use]
pub fn normalize_stock_level(record: &RawRecord) -> Option<StockLevel> {
    let Some(sku) = first_text(record, SKU) else {
        tracing::warn!("skipping stock record without SKU");
        return None;
    };

    let product_name = first_text(record, PRODUCT_NAME).unwrap_or_else(|| format!("Product {sku}"));
    let quantity = first_count(record, QUANTITY);
    let quantity_allocated = first_count(record, QUANTITY_ALLOCATED);

    Some(StockLevel {
        is_master_product: classify(record, &product_name, &sku),
        available_quantity: to_signed(quantity) - to_signed(quantity_allocated),
        product_name,
        quantity,
        quantity_allocated,
        supplier_stock_level: first_count(record, SUPPLIER_STOCK),
        vendor: first_text(record, VENDOR).unwrap_or_else(|| "Unknown Vendor".to_string()),
        product_type: first_text(record, PRODUCT_TYPE).unwrap_or_else(|| "General".to_string()),
        price: first_decimal(record, PRICE),
        cost: first_decimal(record, COST),
        created_at: first_timestamp(record, CREATED_AT),
        updated_at: first_timestamp(record, UPDATED_AT),
        sku,
    })
}

fn customer_name(record: &RawRecord) -> String {
    if let Some(name) = first_text(record, CUSTOMER_NAME) {
        return name;
    }
    let parts: Vec<String> = [
        first_text(record, CUSTOMER_FIRST_NAME),
        first_text(record, CUSTOMER_LAST_NAME),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(" ")
    }
}

/// Normalizes one order record. Returns `None` when the record has no id.
#[must_use]
pub fn normalize_order(record: &RawRecord) -> Option<Order> {
    let Some(order_id) = first_text(record, ORDER_ID) else {
        tracing::warn!("skipping order record without id");
        return None;
    };

    Some(Order {
        order_number: first_text(record, ORDER_NUMBER).unwrap_or_else(|| format!("#{order_id}")),
        customer_name: customer_name(record),
        customer_email: first_text(record, CUSTOMER_EMAIL).unwrap_or_default(),
        order_date: first_timestamp(record, ORDER_DATE),
        total_amount: first_decimal(record, TOTAL_AMOUNT),
        status: first_text(record, STATUS).unwrap_or_else(|| "Pending".to_string()),
        marketplace: first_text(record, MARKETPLACE).unwrap_or_else(|| "Unknown".to_string()),
        order_id,
    })
}

/// Normalizes one catalogue record. Scalar children are carried through in
/// [`Product::fields`]; nested elements are dropped.
#[must_use]
pub fn normalize_product(record: &RawRecord) -> Option<Product> {
    let Some(product_id) = first_text(record, PRODUCT_ID) else {
        tracing::warn!("skipping product record without id");
        return None;
    };

    let fields = record
        .fields
        .children()
        .filter_map(|(name, value)| match value {
            XmlValue::Text(text) if !text.trim().is_empty() => {
                Some((name.to_string(), text.trim().to_string()))
            }
            _ => None,
        })
        .collect();

    Some(Product {
        sku: first_text(record, SKU),
        title: first_text(record, PRODUCT_TITLE),
        product_id,
        fields,
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
