use std::sync::Arc;

use sdsync_core::{Order, Product, StockLevel};

use crate::cache::CachedRecords;
use crate::normalize::{normalize_order, normalize_product, normalize_stock_level};
use crate::parse::RawRecord;
use crate::types::Operation;

/// A normalized record type fetched by one remote operation.
pub trait RemoteRecord: Sized + Send + Sync + 'static {
    const OPERATION: Operation;

    fn normalize(raw: &RawRecord) -> Option<Self>;

    fn into_cached(records: Arc<Vec<Self>>) -> CachedRecords;

    /// `None` when the cached entry holds a different record type.
    fn from_cached(cached: CachedRecords) -> Option<Arc<Vec<Self>>>;
}

impl RemoteRecord for StockLevel {
    const OPERATION: Operation = Operation::GetStockLevels;

    fn normalize(raw: &RawRecord) -> Option<Self> {
        normalize_stock_level(raw)
    }

    fn into_cached(records: Arc<Vec<Self>>) -> CachedRecords {
        CachedRecords::StockLevels(records)
    }

    fn from_cached(cached: CachedRecords) -> Option<Arc<Vec<Self>>> {
        match cached {
            CachedRecords::StockLevels(records) => Some(records),
            _ => None,
        }
    }
}

impl RemoteRecord for Order {
    const OPERATION: Operation = Operation::GetCustomerOrders;

    fn normalize(raw: &RawRecord) -> Option<Self> {
        normalize_order(raw)
    }

    fn into_cached(records: Arc<Vec<Self>>) -> CachedRecords {
        CachedRecords::Orders(records)
    }

    fn from_cached(cached: CachedRecords) -> Option<Arc<Vec<Self>>> {
        match cached {
            CachedRecords::Orders(records) => Some(records),
            _ => None,
        }
    }
}

impl RemoteRecord for Product {
    const OPERATION: Operation = Operation::GetProducts;

    fn normalize(raw: &RawRecord) -> Option<Self> {
        normalize_product(raw)
    }

    fn into_cached(records: Arc<Vec<Self>>) -> CachedRecords {
        CachedRecords::Products(records)
    }

    fn from_cached(cached: CachedRecords) -> Option<Arc<Vec<Self>>> {
        match cached {
            CachedRecords::Products(records) => Some(records),
            _ => None,
        }
    }
}
