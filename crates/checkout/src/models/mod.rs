//! Domain models for the checkout service.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`] and from the loosely-typed request payloads in
//! [`crate::services`].

pub mod order;
pub mod product;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderSummary, ShippingAddress};
pub use product::{Product, ProductFilter};

use serde::Serialize;

/// Default country for shipping addresses that omit one.
pub const DEFAULT_COUNTRY: &str = "India";

/// Page selection for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
}

impl Page {
    /// Largest page size a client may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Build a page from raw query values, falling back to defaults for
    /// anything missing or unparseable and clamping the limit.
    #[must_use]
    pub fn from_query(page: Option<&str>, limit: Option<&str>, default_limit: u32) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(default_limit)
            .min(Self::MAX_LIMIT);
        Self { page, limit }
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Row count for SQL `LIMIT`.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.limit)
    }
}

/// Pagination block returned alongside list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(page: Page, total: i64) -> Self {
        let limit = i64::from(page.limit.max(1));
        Self {
            page: page.page,
            limit: page.limit,
            total,
            pages: (total.max(0) + limit - 1) / limit,
        }
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let page = Page::from_query(None, None, 10);
        assert_eq!(page, Page { page: 1, limit: 10 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_page_ignores_garbage_and_clamps() {
        let page = Page::from_query(Some("0"), Some("5000"), 20);
        assert_eq!(page, Page { page: 1, limit: 100 });

        let page = Page::from_query(Some("abc"), Some("-3"), 20);
        assert_eq!(page, Page { page: 1, limit: 20 });
    }

    #[test]
    fn test_page_offset() {
        let page = Page::from_query(Some("3"), Some("25"), 10);
        assert_eq!(page.offset(), 50);
        assert_eq!(page.limit(), 25);
    }

    #[test]
    fn test_pagination_page_count() {
        let page = Page { page: 1, limit: 10 };
        assert_eq!(Pagination::new(page, 0).pages, 0);
        assert_eq!(Pagination::new(page, 10).pages, 1);
        assert_eq!(Pagination::new(page, 11).pages, 2);
    }
}
