//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::CheckoutConfig;
use crate::db::{OrderStore, ProductStore};
use crate::razorpay::PaymentGateway;
use crate::services::{OrderService, PaymentService, ProductService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Collaborators are passed in
/// as trait objects so tests can substitute in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    orders: OrderService,
    payments: PaymentService,
    products: ProductService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Checkout configuration
    /// * `order_store` - Order persistence
    /// * `product_store` - Catalogue reads
    /// * `gateway` - Payment gateway client
    #[must_use]
    pub fn new(
        config: CheckoutConfig,
        order_store: Arc<dyn OrderStore>,
        product_store: Arc<dyn ProductStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let timeout = config.upstream_timeout;

        let orders = OrderService::new(
            order_store.clone(),
            config.razorpay.key_secret.clone(),
            timeout,
        );
        let payments = PaymentService::new(
            gateway,
            order_store,
            config.amounts,
            config.razorpay.key_secret.clone(),
            config.razorpay.webhook_secret.clone(),
            timeout,
        );
        let products = ProductService::new(product_store, timeout);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                orders,
                payments,
                products,
            }),
        }
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }
}
