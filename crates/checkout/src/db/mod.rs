//! Database operations for the checkout `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `products` - Catalogue, read by the product listing endpoint
//! - `orders` - One row per checkout, numbered by `order_number_seq`
//! - `order_items` - Line items, cascade-deleted with their order
//!
//! # Store traits
//!
//! Services depend on [`OrderStore`] and [`ProductStore`] rather than on a
//! pool, so tests can substitute an in-memory store. [`PgStore`] is the
//! production implementation.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/checkout/migrations/` and run via:
//! ```bash
//! cargo run -p checkout-cli -- migrate
//! ```

mod orders;
mod products;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use checkout_core::{OrderId, OrderStatus, UserId};

use crate::models::{
    NewOrder, NewOrderItem, Order, OrderSummary, Page, Paged, Product, ProductFilter,
};

pub use products::NewProduct;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The call did not finish within the configured deadline.
    #[error("database call timed out")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

impl RepositoryError {
    /// Whether retrying the same idempotent read might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_)
                | Self::Database(
                    sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Protocol(_)
                )
        )
    }
}

/// Persistence for orders and their line items.
///
/// There is no multi-statement transaction across these calls; callers that
/// need all-or-nothing semantics must compensate with [`Self::delete_order`].
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order row and return the store-assigned fields.
    async fn insert_order(&self, order: &NewOrder) -> Result<OrderSummary, RepositoryError>;

    /// Insert all line items in a single batch.
    async fn insert_items(&self, items: &[NewOrderItem]) -> Result<(), RepositoryError>;

    /// Delete an order (and, through the foreign key, its items).
    async fn delete_order(&self, id: OrderId) -> Result<(), RepositoryError>;

    /// Fetch one order with its items.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// List a user's orders, newest first, with their items.
    async fn list_orders(&self, user_id: &UserId, page: Page)
    -> Result<Paged<Order>, RepositoryError>;

    /// Set the status of every order carrying `razorpay_order_id`, recording
    /// the gateway payment id when one is given. Returns the number of rows
    /// updated.
    async fn update_payment_status(
        &self,
        razorpay_order_id: &str,
        status: OrderStatus,
        payment_id: Option<&str>,
    ) -> Result<u64, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Read access to the product catalogue.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// List products matching `filter`, newest first.
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Paged<Product>, RepositoryError>;
}

/// `PostgreSQL`-backed implementation of the store traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url.expose_secret())
        .await
}
