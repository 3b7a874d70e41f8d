//! Razorpay payment gateway integration.
//!
//! - [`client`] - Orders API client behind the [`PaymentGateway`] trait
//! - [`signature`] - HMAC-SHA256 verification for checkout callbacks and webhooks
//! - [`receipt`] - Unique receipt tokens attached to gateway orders
//! - [`types`] - Wire types for orders and webhook events

pub mod client;
pub mod error;
pub mod receipt;
pub mod signature;
pub mod types;

use async_trait::async_trait;

pub use client::RazorpayClient;
pub use error::RazorpayError;
pub use signature::SignatureError;
pub use types::{CreateOrderRequest, GatewayOrder, WebhookEvent};

/// Operations the checkout service needs from a payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a gateway order that the browser checkout widget can pay.
    ///
    /// Never retried by callers: a duplicate call may create a duplicate order.
    async fn create_order(&self, request: &CreateOrderRequest)
    -> Result<GatewayOrder, RazorpayError>;
}
