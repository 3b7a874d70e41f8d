//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"success": false, "error": "...", "fields": [...]}`; server errors are
//! captured to Sentry first and never expose internal details in the body.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use checkout_core::AmountError;

use crate::services::CheckoutError;

/// Application-level error type for the checkout service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service operation failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The request body could not be read.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No route or resource matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Internal error description attached to 5xx responses as an extension.
///
/// Only surfaced to clients in development, by
/// [`crate::middleware::error_detail_middleware`].
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            fields: None,
        }
    }
}

fn amount_message(err: &AmountError) -> String {
    match err {
        AmountError::Missing => "Amount is required".to_string(),
        AmountError::NotANumber(_) => "Invalid amount".to_string(),
        AmountError::NotPositive => "Amount must be greater than zero".to_string(),
        AmountError::BelowMinimum { min } => format!("Amount must be at least {min}"),
        AmountError::ExceedsMaximum { .. } => "Amount exceeds maximum allowed".to_string(),
    }
}

impl AppError {
    /// Status code, client-facing message and offending fields.
    fn parts(&self) -> (StatusCode, String, Option<Vec<String>>) {
        match self {
            Self::Checkout(err) if err.is_timeout() => (
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream service timed out".to_string(),
                None,
            ),
            Self::Checkout(err) => match err {
                CheckoutError::Validation(v) => {
                    (StatusCode::BAD_REQUEST, v.message.clone(), Some(v.fields.clone()))
                }
                CheckoutError::Amount(a) => (
                    StatusCode::BAD_REQUEST,
                    amount_message(a),
                    Some(vec!["amount".to_string()]),
                ),
                CheckoutError::Gateway(g) if g.is_bad_request() => (
                    StatusCode::BAD_REQUEST,
                    g.description().unwrap_or("Payment gateway rejected the request").to_string(),
                    None,
                ),
                CheckoutError::Gateway(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create payment order".to_string(),
                    None,
                ),
                CheckoutError::OrderCreate(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create order".to_string(),
                    None,
                ),
                CheckoutError::ItemCreate(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create order items".to_string(),
                    None,
                ),
                CheckoutError::Store(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                ),
                CheckoutError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, format!("{what} not found"), None)
                }
                CheckoutError::MissingPaymentFields => (
                    StatusCode::BAD_REQUEST,
                    "Missing required payment fields".to_string(),
                    None,
                ),
                CheckoutError::InvalidSignature => {
                    (StatusCode::BAD_REQUEST, "Invalid signature".to_string(), None)
                }
            },
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, fields) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success: false,
            error: message,
            fields,
        };
        let mut response = (status, Json(body)).into_response();

        if status.is_server_error() {
            response.extensions_mut().insert(ErrorDetail(self.to_string()));
        }

        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// `Json` extractor whose rejection renders as an [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
