//! Razorpay-related errors.

use thiserror::Error;

/// Error code Razorpay uses for requests it rejects as malformed.
pub const BAD_REQUEST_ERROR: &str = "BAD_REQUEST_ERROR";

/// Errors that can occur when interacting with Razorpay.
#[derive(Debug, Error)]
pub enum RazorpayError {
    /// Credentials are missing or unusable; raised before any network call.
    #[error("Razorpay configuration error: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("Razorpay request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Razorpay answered with an error body.
    #[error("Razorpay API error ({status}) {code}: {description}")]
    Api {
        status: u16,
        code: String,
        description: String,
    },

    /// Failed to parse a response.
    #[error("Razorpay response error: {0}")]
    Response(String),

    /// The call did not finish within the configured deadline.
    #[error("Razorpay request timed out")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

impl RazorpayError {
    /// Whether the gateway classified the request itself as invalid, which
    /// makes it the client's fault rather than ours.
    ///
    /// Razorpay also tags authentication failures with `BAD_REQUEST_ERROR`;
    /// those are our misconfiguration, so 401/403 never count.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => {
                *status == 400
                    || (code == BAD_REQUEST_ERROR && *status < 500 && !matches!(*status, 401 | 403))
            }
            _ => false,
        }
    }

    /// Description safe to forward to the client for bad requests.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Api { description, .. } => Some(description),
            _ => None,
        }
    }
}
