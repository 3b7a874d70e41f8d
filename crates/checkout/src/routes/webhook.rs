//! Razorpay webhook receiver.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

/// Header carrying the webhook HMAC.
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// Receive a gateway event. The body is taken as raw bytes because the
/// signature covers the exact payload.
///
/// POST /webhook/razorpay
pub async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state.payments().handle_webhook(&body, signature).await?;
    Ok(Json(WebhookResponse { received: true }))
}
