//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! checkout-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/checkout/migrations/` and are embedded at
//! compile time:
//! ```text
//! migrations/
//! ├── 20260301000001_create_products.sql
//! ├── 20260301000002_create_orders.sql
//! └── 20260301000003_create_order_items.sql
//! ```

use checkout_server::db;
use tracing::info;

/// Apply all pending checkout migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    info!("Connecting to checkout database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running checkout migrations...");
    sqlx::migrate!("../checkout/migrations").run(&pool).await?;

    info!("Checkout migrations complete");
    Ok(())
}
