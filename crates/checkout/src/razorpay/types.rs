//! Razorpay wire types.

use serde::{Deserialize, Serialize};

use checkout_core::{Currency, MinorUnits};

/// Body for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest {
    /// Amount in minor units (paise).
    pub amount: MinorUnits,
    pub currency: Currency,
    /// Caller-chosen reconciliation label, unique per request.
    pub receipt: String,
    /// `1` captures the payment automatically once authorized.
    pub payment_capture: u8,
}

impl CreateOrderRequest {
    /// Build an auto-capturing order request.
    #[must_use]
    pub const fn auto_capture(amount: MinorUnits, currency: Currency, receipt: String) -> Self {
        Self {
            amount,
            currency,
            receipt,
            payment_capture: 1,
        }
    }
}

/// Order object returned by the gateway, trimmed to the fields the browser
/// checkout needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
}

/// Error envelope: `{"error": {"code": "...", "description": "..."}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Gateway-initiated webhook envelope.
///
/// Only the fields used to route the event are modelled; everything else in
/// the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
    #[serde(default)]
    pub order: Option<EntityWrapper<OrderEntity>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderEntity {
    pub id: String,
}

/// Webhook events the service acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    /// Payment captured or order paid: confirm the matching order.
    Confirm {
        razorpay_order_id: String,
        payment_id: Option<String>,
    },
    /// Payment failed: mark the matching order failed.
    Fail {
        razorpay_order_id: String,
        payment_id: Option<String>,
    },
    /// Anything else, or an event missing the order reference.
    Ignore { event: String },
}

impl WebhookEvent {
    /// Decide what to do with this event.
    #[must_use]
    pub fn action(&self) -> WebhookAction {
        let payment = self.payload.payment.as_ref().map(|p| &p.entity);
        let payment_order = payment.and_then(|p| p.order_id.clone());
        let payment_id = payment.map(|p| p.id.clone());

        let routed = match self.event.as_str() {
            "payment.captured" => payment_order.map(|razorpay_order_id| WebhookAction::Confirm {
                razorpay_order_id,
                payment_id,
            }),
            "order.paid" => self
                .payload
                .order
                .as_ref()
                .map(|o| o.entity.id.clone())
                .or(payment_order)
                .map(|razorpay_order_id| WebhookAction::Confirm {
                    razorpay_order_id,
                    payment_id,
                }),
            "payment.failed" => payment_order.map(|razorpay_order_id| WebhookAction::Fail {
                razorpay_order_id,
                payment_id,
            }),
            _ => None,
        };

        routed.unwrap_or_else(|| WebhookAction::Ignore {
            event: self.event.clone(),
        })
    }
}
