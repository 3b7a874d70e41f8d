//! Payment endpoints.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::Value;

use crate::error::{JsonBody, Result};
use crate::razorpay::GatewayOrder;
use crate::services::VerifyPaymentRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: &'static str,
    pub payment_id: String,
}

/// Create a gateway order for `{ "amount": <rupees> }`.
///
/// POST /create-order
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<GatewayOrder>> {
    let amount = body.get("amount").unwrap_or(&Value::Null);
    let order = state.payments().create_payment_order(amount).await?;
    Ok(Json(order))
}

/// Verify the signature the checkout widget returned and confirm the order.
///
/// POST /verify-payment
pub async fn verify_payment(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let payment_id = state.payments().verify_payment(&request).await?;
    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified successfully",
        payment_id,
    }))
}
