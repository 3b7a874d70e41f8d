//! Receipt tokens for gateway orders.

use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

const SUFFIX_LEN: usize = 8;

/// Razorpay rejects receipts longer than this.
pub const MAX_RECEIPT_LEN: usize = 40;

/// Generate a receipt of the form `rcpt_{unix_millis}_{random}`.
///
/// The random suffix keeps tokens unique when two checkouts start in the
/// same millisecond.
#[must_use]
pub fn receipt_token() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("rcpt_{}_{suffix}", Utc::now().timestamp_millis())
}
