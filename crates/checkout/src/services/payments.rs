//! Gateway order creation, payment verification and webhook handling.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use checkout_core::{AmountPolicy, OrderStatus};

use super::{CheckoutError, ValidationError, bounded};
use crate::db::OrderStore;
use crate::razorpay::receipt::receipt_token;
use crate::razorpay::signature::{verify_payment_signature, verify_webhook_signature};
use crate::razorpay::types::WebhookAction;
use crate::razorpay::{CreateOrderRequest, GatewayOrder, PaymentGateway, WebhookEvent};

/// `POST /verify-payment` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
}

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Orders matching the gateway order id were moved to `status`.
    Updated {
        event: String,
        status: OrderStatus,
        rows: u64,
    },
    /// The event was acknowledged without touching any order.
    Ignored { event: String },
}

/// Payment flows over a [`PaymentGateway`] and an [`OrderStore`].
#[derive(Clone)]
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn OrderStore>,
    amounts: AmountPolicy,
    key_secret: SecretString,
    webhook_secret: SecretString,
    timeout: Duration,
}

impl PaymentService {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn OrderStore>,
        amounts: AmountPolicy,
        key_secret: SecretString,
        webhook_secret: SecretString,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            store,
            amounts,
            key_secret,
            webhook_secret,
            timeout,
        }
    }

    /// Normalize `amount` (rupees) and create a gateway order for it.
    ///
    /// The gateway call is never retried.
    ///
    /// # Errors
    ///
    /// `Amount` if the amount is rejected (the gateway is not called),
    /// `Gateway` if the gateway fails or times out.
    #[instrument(skip(self, amount))]
    pub async fn create_payment_order(&self, amount: &Value) -> Result<GatewayOrder, CheckoutError> {
        let minor = self.amounts.normalize_value(amount)?;
        let request =
            CreateOrderRequest::auto_capture(minor, self.amounts.currency, receipt_token());

        let order = bounded(self.timeout, self.gateway.create_order(&request)).await?;

        info!(
            razorpay_order_id = %order.id,
            amount = order.amount,
            receipt = %request.receipt,
            "Gateway order created"
        );
        Ok(order)
    }

    /// Check a browser-reported payment and confirm the matching order.
    ///
    /// Returns the verified payment id. The order update is best-effort:
    /// a failure is logged and the payment is still reported as verified.
    ///
    /// # Errors
    ///
    /// `MissingPaymentFields` if any field is blank, `InvalidSignature` if the
    /// signature does not match.
    #[instrument(skip(self, request), fields(razorpay_order_id = ?request.razorpay_order_id))]
    pub async fn verify_payment(&self, request: &VerifyPaymentRequest) -> Result<String, CheckoutError> {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        let (Some(order_id), Some(payment_id), Some(signature)) = (
            field(&request.razorpay_order_id),
            field(&request.razorpay_payment_id),
            field(&request.razorpay_signature),
        ) else {
            return Err(CheckoutError::MissingPaymentFields);
        };

        verify_payment_signature(
            self.key_secret.expose_secret(),
            &order_id,
            &payment_id,
            &signature,
        )
        .map_err(|err| {
            warn!(error = %err, "Payment signature rejected");
            CheckoutError::InvalidSignature
        })?;

        let update = self.store.update_payment_status(
            &order_id,
            OrderStatus::Confirmed,
            Some(payment_id.as_str()),
        );
        match bounded(self.timeout, update).await {
            Ok(0) => warn!("Verified payment matched no order"),
            Ok(rows) => info!(rows, "Order confirmed after payment verification"),
            Err(err) => warn!(error = %err, "Failed to confirm order after payment verification"),
        }

        Ok(payment_id)
    }

    /// Verify and apply a gateway webhook delivery.
    ///
    /// `body` must be the raw request bytes.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` if the signature header is missing or wrong,
    /// `Validation` if the verified body is not a webhook envelope, `Store`
    /// if the status update fails (so the gateway redelivers).
    #[instrument(skip(self, body, signature))]
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, CheckoutError> {
        let signature = signature.map(str::trim).unwrap_or_default();
        verify_webhook_signature(self.webhook_secret.expose_secret(), body, signature).map_err(
            |err| {
                warn!(error = %err, "Webhook signature rejected");
                CheckoutError::InvalidSignature
            },
        )?;

        let event: WebhookEvent = serde_json::from_slice(body)
            .map_err(|_| ValidationError::field("event", "Invalid webhook payload"))?;

        let (razorpay_order_id, payment_id, status) = match event.action() {
            WebhookAction::Confirm {
                razorpay_order_id,
                payment_id,
            } => (razorpay_order_id, payment_id, OrderStatus::Confirmed),
            WebhookAction::Fail {
                razorpay_order_id,
                payment_id,
            } => (razorpay_order_id, payment_id, OrderStatus::Failed),
            WebhookAction::Ignore { event } => {
                debug!(event = %event, "Ignoring webhook event");
                return Ok(WebhookOutcome::Ignored { event });
            }
        };

        let rows = bounded(
            self.timeout,
            self.store
                .update_payment_status(&razorpay_order_id, status, payment_id.as_deref()),
        )
        .await?;

        info!(
            event = %event.event,
            razorpay_order_id = %razorpay_order_id,
            status = %status,
            rows,
            "Webhook applied"
        );
        Ok(WebhookOutcome::Updated {
            event: event.event,
            status,
            rows,
        })
    }
}
