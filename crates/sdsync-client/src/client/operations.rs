//! Public fetch operations for `SyncClient`.

use std::sync::Arc;

use sdsync_core::{Order, Product, StockLevel};

use crate::error::SyncError;
use crate::record::RemoteRecord;
use crate::retry::retry_fetch;
use crate::types::{FetchQuery, OperationParams, OrderQuery, PageOptions};

use super::{resolve_page_size, SyncClient};

impl SyncClient {
    /// Fetches every stock level, following pages until the remote reports
    /// no more.
    ///
    /// # Errors
    ///
    /// Propagates any [`SyncError`] from the fetch; nothing is cached on
    /// failure.
    pub async fn get_all_stock_levels(
        &self,
        options: PageOptions,
    ) -> Result<Vec<StockLevel>, SyncError> {
        let query = Self::page_query::<StockLevel>(options, self.inner.page_size);
        self.cached_fetch(query).await
    }

    /// Fetches every order matching `query`.
    ///
    /// # Errors
    ///
    /// Propagates any [`SyncError`] from the fetch; nothing is cached on
    /// failure.
    pub async fn get_customer_orders(&self, query: OrderQuery) -> Result<Vec<Order>, SyncError> {
        if query.from_date > query.to_date {
            tracing::warn!(
                from = %query.from_date,
                to = %query.to_date,
                "order date range is inverted; the remote will likely return nothing"
            );
        }
        let fetch = FetchQuery {
            operation: Order::OPERATION,
            start_page: 1,
            page_size: resolve_page_size(query.page_size, self.inner.orders_page_size),
            params: OperationParams::Orders {
                order_type: query.order_type,
                from_date: query.from_date,
                to_date: query.to_date,
            },
        };
        self.cached_fetch(fetch).await
    }

    /// Fetches the full product catalogue.
    ///
    /// # Errors
    ///
    /// Propagates any [`SyncError`] from the fetch; nothing is cached on
    /// failure.
    pub async fn get_all_products(&self, options: PageOptions) -> Result<Vec<Product>, SyncError> {
        let query = Self::page_query::<Product>(options, self.inner.page_size);
        self.cached_fetch(query).await
    }

    fn page_query<T: RemoteRecord>(options: PageOptions, configured: u32) -> FetchQuery {
        FetchQuery {
            operation: T::OPERATION,
            start_page: options.start_page.unwrap_or(1),
            page_size: resolve_page_size(options.page_size, configured),
            params: OperationParams::None,
        }
    }

    /// Cache lookup, then a throttled, retried multi-page fetch on a miss.
    ///
    /// Every attempt, including retries, waits for the rate limiter before
    /// its first page. The cache is consulted again once the permit is
    /// granted, since a concurrent call for the same key may have filled it
    /// during the wait. Only a complete result is cached.
    async fn cached_fetch<T: RemoteRecord + Clone>(
        &self,
        query: FetchQuery,
    ) -> Result<Vec<T>, SyncError> {
        let key = query.cache_key();
        if let Some(cached) = self.inner.cache.get(&key).await.and_then(T::from_cached) {
            tracing::debug!(key = %key, records = cached.len(), "cache hit");
            return Ok(cached.as_ref().clone());
        }

        let inner = &self.inner;
        let (records, fresh) = retry_fetch(inner.retry, &query, || {
            let (query, key) = (&query, &key);
            async move {
                inner.limiter.throttle().await?;
                if let Some(cached) = inner.cache.get(key).await.and_then(T::from_cached) {
                    tracing::debug!(key = %key, "filled by a concurrent fetch while throttled");
                    return Ok::<_, SyncError>((cached, false));
                }
                let records = inner.pager.fetch_all::<T>(query).await?;
                Ok::<_, SyncError>((Arc::new(records), true))
            }
        })
        .await?;

        if fresh {
            inner
                .cache
                .set(key, T::into_cached(Arc::clone(&records)))
                .await;
        }
        Ok(Arc::unwrap_or_clone(records))
    }
}
