//! In-memory cache of complete fetch results.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sdsync_core::{Order, Product, StockLevel};

/// A complete, successful result set for one fetch.
#[derive(Debug, Clone)]
pub enum CachedRecords {
    StockLevels(Arc<Vec<StockLevel>>),
    Orders(Arc<Vec<Order>>),
    Products(Arc<Vec<Product>>),
}

/// TTL cache keyed by operation and parameters.
///
/// Only full successful fetches are stored, so a hit never returns a partial
/// snapshot. Entries expire `ttl` after insertion.
#[derive(Clone)]
pub struct RecordsCache {
    entries: Cache<String, CachedRecords>,
}

impl RecordsCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(256)
            .time_to_live(ttl)
            .build();
        Self { entries }
    }

    pub async fn get(&self, key: &str) -> Option<CachedRecords> {
        self.entries.get(key).await
    }

    pub async fn set(&self, key: String, records: CachedRecords) {
        self.entries.insert(key, records).await;
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl std::fmt::Debug for RecordsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordsCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
