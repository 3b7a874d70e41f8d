//! Integration test helpers for the checkout service.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p checkout-cli -- migrate
//!
//! # Start the server with test credentials
//! cargo run -p checkout-server
//!
//! # Run the ignored tests against it
//! cargo test -p checkout-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `CHECKOUT_BASE_URL` - Server under test (default: <http://localhost:5000>)
//! - `RAZORPAY_KEY_SECRET` - Must match the server's key secret
//! - `RAZORPAY_WEBHOOK_SECRET` - Must match the server's webhook secret

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;

/// Base URL for the checkout API.
#[must_use]
pub fn base_url() -> String {
    std::env::var("CHECKOUT_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// HTTP client for tests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// Read a secret shared with the server under test.
///
/// # Panics
///
/// Panics if the variable is not set.
#[must_use]
pub fn shared_secret(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} must match the server under test"))
}

/// Lowercase hex HMAC-SHA256, as Razorpay signs callbacks and webhooks.
///
/// # Panics
///
/// Panics if HMAC rejects the key (it accepts any length).
#[must_use]
pub fn sign(secret: &str, message: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}
