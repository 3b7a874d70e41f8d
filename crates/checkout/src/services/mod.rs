//! Checkout business logic.
//!
//! # Services
//!
//! - [`orders`] - Checkout validation and the order + line item write with
//!   its compensating delete
//! - [`payments`] - Gateway order creation, payment verification, webhooks
//! - [`products`] - Catalogue listing
//!
//! Services own their collaborators as trait objects and never touch axum
//! types; handlers in [`crate::routes`] translate between the two.

pub mod orders;
pub mod payments;
pub mod products;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::error::Elapsed;
use tracing::warn;

use checkout_core::AmountError;

use crate::db::RepositoryError;
use crate::razorpay::RazorpayError;

pub use orders::{OrderService, SaveOrderRequest};
pub use payments::{PaymentService, VerifyPaymentRequest, WebhookOutcome};
pub use products::ProductService;

/// One or more request fields failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Summary suitable for showing to the client.
    pub message: String,
    /// Every offending field, in request order.
    pub fields: Vec<String>,
}

impl ValidationError {
    #[must_use]
    pub fn new(message: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            message: message.into(),
            fields,
        }
    }

    /// A single-field violation.
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::new(message, vec![field.to_owned()])
    }
}

/// Errors returned by the checkout services.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request is malformed or incomplete.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payment amount was rejected before reaching the gateway.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// The payment gateway call failed.
    #[error("payment gateway error: {0}")]
    Gateway(#[from] RazorpayError),

    /// Writing the order row failed; nothing was persisted.
    #[error("failed to create order: {0}")]
    OrderCreate(#[source] RepositoryError),

    /// Writing line items failed; the order row was rolled back.
    #[error("failed to create order items: {0}")]
    ItemCreate(#[source] RepositoryError),

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    /// The requested record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A payment confirmation lacked one of its three fields.
    #[error("missing required payment fields")]
    MissingPaymentFields,

    /// A payment or webhook signature was missing or did not match.
    #[error("Invalid signature")]
    InvalidSignature,
}

impl CheckoutError {
    /// Whether the failure was an upstream deadline expiring.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Gateway(RazorpayError::Timeout(_))
                | Self::OrderCreate(RepositoryError::Timeout(_))
                | Self::ItemCreate(RepositoryError::Timeout(_))
                | Self::Store(RepositoryError::Timeout(_))
        )
    }
}

/// Run `fut` with a deadline, folding expiry into the call's own error type.
pub(crate) async fn bounded<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<Elapsed>,
{
    tokio::time::timeout(limit, fut).await?
}

/// Run an idempotent read, retrying once if the first attempt fails with a
/// transient error. Each attempt gets its own deadline.
pub(crate) async fn retry_read<T, F, Fut>(limit: Duration, mut read: F) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    match bounded(limit, read()).await {
        Err(err) if err.is_transient() => {
            warn!(error = %err, "Transient store error, retrying read once");
            bounded(limit, read()).await
        }
        result => result,
    }
}
