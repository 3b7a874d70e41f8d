//! Catalogue listing.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use super::{CheckoutError, retry_read};
use crate::db::ProductStore;
use crate::models::{Page, Pagination, Product, ProductFilter};

/// Default page size for product listings.
pub const DEFAULT_PRODUCT_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    timeout: Duration,
}

impl ProductService {
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// List products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// `Store` if the read fails (after one retry for transient failures).
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, Pagination), CheckoutError> {
        let paged = retry_read(self.timeout, || self.store.list_products(filter, page)).await?;
        Ok((paged.rows, Pagination::new(page, paged.total)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn test_list_products_filters_and_paginates() {
        let store = Arc::new(MemoryStore::default());
        store.add_product("p1", "Shirt", Some("Apparel"), Some("Acme"));
        store.add_product("p2", "Cap", Some("apparel"), Some("Other"));
        store.add_product("p3", "Mug", Some("Home"), Some("Acme"));

        let svc = ProductService::new(store.clone(), Duration::from_secs(1));

        let (rows, pagination) = svc
            .list_products(
                &ProductFilter::new(Some("APPAREL"), None),
                Page { page: 1, limit: 1 },
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(pagination.total, 2);
        assert_eq!(pagination.pages, 2);

        let (rows, _) = svc
            .list_products(
                &ProductFilter::new(None, Some("acme")),
                Page::from_query(None, None, DEFAULT_PRODUCT_LIMIT),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_list_products_retries_transient_failure() {
        let store = Arc::new(MemoryStore::default());
        store.add_product("p1", "Shirt", None, None);
        store.fail_next_read_transiently();

        let svc = ProductService::new(store.clone(), Duration::from_secs(1));
        let (rows, _) = svc
            .list_products(&ProductFilter::default(), Page { page: 1, limit: 20 })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
