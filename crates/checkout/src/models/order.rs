//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use checkout_core::{OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

/// Structured shipping address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// An order ready to be written, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub tax: Decimal,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Gateway payment id; always `None` for cash on delivery.
    pub payment_id: Option<String>,
    /// Gateway order id; always `None` for cash on delivery.
    pub razorpay_order_id: Option<String>,
    pub status: OrderStatus,
    pub shipping: ShippingAddress,
}

/// Line item ready to be written, bound to an existing order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    /// Product name at the time of ordering.
    pub product_name: String,
    pub quantity: i32,
    /// Unit price at the time of ordering.
    pub price_at_time: Decimal,
    pub image_url: Option<String>,
}

/// The subset of an inserted order row that callers are given back.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A persisted order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: Option<UserId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            order_number: self.order_number.clone(),
            total_amount: self.total_amount,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// A persisted line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_at_time: Decimal,
    pub image_url: Option<String>,
}
