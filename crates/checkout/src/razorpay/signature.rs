//! HMAC-SHA256 signature checks.
//!
//! Razorpay signs checkout callbacks over `"{order_id}|{payment_id}"` with the
//! API key secret, and webhook deliveries over the raw request body with the
//! webhook secret. Both signatures are lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Reasons a signature check can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No signature was supplied.
    #[error("signature missing")]
    Missing,

    /// The signature does not match the expected value.
    #[error("signature mismatch")]
    Mismatch,

    /// The secret could not be used as an HMAC key.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Lowercase hex HMAC-SHA256 of `message` under `secret`.
///
/// # Errors
///
/// Returns `SignatureError::InvalidKey` if the secret is rejected as a key.
pub fn sign(secret: &str, message: &[u8]) -> Result<String, SignatureError> {
    Ok(hex::encode(mac(secret, message)?.finalize().into_bytes()))
}

fn mac(secret: &str, message: &[u8]) -> Result<Hmac<Sha256>, SignatureError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(message);
    Ok(mac)
}

fn verify(secret: &str, message: &[u8], signature: &str) -> Result<(), SignatureError> {
    if signature.is_empty() {
        return Err(SignatureError::Missing);
    }

    // Only lowercase hex is accepted; `hex::decode` alone would also take uppercase.
    if !signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(SignatureError::Mismatch);
    }
    let expected = hex::decode(signature).map_err(|_| SignatureError::Mismatch)?;

    mac(secret, message)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Verify the signature returned to the browser after a successful payment.
///
/// # Errors
///
/// Returns `SignatureError` if the signature is empty or does not match.
pub fn verify_payment_signature(
    key_secret: &str,
    razorpay_order_id: &str,
    razorpay_payment_id: &str,
    signature: &str,
) -> Result<(), SignatureError> {
    let message = format!("{razorpay_order_id}|{razorpay_payment_id}");
    verify(key_secret, message.as_bytes(), signature)
}

/// Verify the `X-Razorpay-Signature` header of a webhook delivery.
///
/// `body` must be the exact bytes received; re-serialized JSON will not match.
///
/// # Errors
///
/// Returns `SignatureError` if the signature is empty or does not match.
pub fn verify_webhook_signature(
    webhook_secret: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    verify(webhook_secret, body, signature)
}
