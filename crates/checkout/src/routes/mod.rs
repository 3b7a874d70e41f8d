//! HTTP route handlers for the checkout service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Service banner and endpoint list
//! GET  /health            - Liveness
//! GET  /health/ready      - Readiness (database ping)
//!
//! # Payments
//! POST /create-order      - Create a Razorpay order for an amount in rupees
//! POST /verify-payment    - Verify a checkout signature and confirm the order
//! POST /webhook/razorpay  - Gateway-initiated payment events
//!
//! # Orders
//! POST /save-order        - Persist an order and its line items
//! GET  /orders            - A user's orders (?user_id=&page=&limit=)
//! GET  /orders/{id}       - One order with its items
//!
//! # Catalogue
//! GET  /products          - Products (?category=&brand=&page=&limit=)
//! ```

pub mod health;
pub mod index;
pub mod orders;
pub mod payments;
pub mod products;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Endpoints advertised by `GET /`.
pub const ENDPOINTS: &[&str] = &[
    "POST /create-order",
    "POST /verify-payment",
    "POST /save-order",
    "GET /orders",
    "GET /orders/{id}",
    "GET /products",
    "POST /webhook/razorpay",
];

/// Create the full route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/create-order", post(payments::create_order))
        .route("/verify-payment", post(payments::verify_payment))
        .route("/webhook/razorpay", post(webhook::razorpay_webhook))
        .route("/save-order", post(orders::save_order))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/products", get(products::list_products))
        .fallback(not_found)
}

/// JSON 404 for unmatched routes.
async fn not_found() -> AppError {
    AppError::NotFound("Route".to_string())
}
