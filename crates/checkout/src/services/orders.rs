//! Order checkout and order history.
//!
//! Saving an order is a two-step write with no surrounding transaction:
//!
//! 1. Insert the order row and read back its id and order number.
//! 2. Insert every line item in one batch, bound to that id.
//!
//! If step 2 fails the order row is deleted before the item error is
//! returned. Readers may briefly see an order with no items between the two
//! steps.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use checkout_core::{
    AmountError, OrderId, OrderStatus, PaymentMethod, ProductId, UserId, parse_major_amount,
};

use super::{CheckoutError, ValidationError, bounded, retry_read};
use crate::db::OrderStore;
use crate::models::{
    DEFAULT_COUNTRY, NewOrder, NewOrderItem, Order, OrderSummary, Page, Pagination,
    ShippingAddress,
};
use crate::razorpay::signature::verify_payment_signature;

/// Product name stored when an item arrives without one.
pub const UNKNOWN_PRODUCT: &str = "Unknown product";

/// Default page size for order history.
pub const DEFAULT_ORDER_LIMIT: u32 = 10;

/// Largest amount the `NUMERIC(12, 2)` money columns can hold.
#[must_use]
pub fn max_stored_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

// =============================================================================
// Request payload
// =============================================================================

/// `POST /save-order` body.
///
/// Numeric fields are kept as raw JSON so that numbers and numeric strings
/// are both accepted and every violation can be reported at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveOrderRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub items: Option<Value>,
    #[serde(default)]
    pub total_amount: Option<Value>,
    #[serde(default)]
    pub subtotal: Option<Value>,
    #[serde(default)]
    pub shipping_fee: Option<Value>,
    #[serde(default)]
    pub tax: Option<Value>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    #[serde(default)]
    pub shipping_info: Option<ShippingInfo>,
}

/// Identifiers the browser checkout widget hands back after payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
}

/// Shipping address as sent by the storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, alias = "zip_code")]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

// =============================================================================
// Validation
// =============================================================================

/// A line item with defaults applied, waiting for its order id.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDraft {
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub price_at_time: Decimal,
    pub image_url: Option<String>,
}

impl LineItemDraft {
    fn bind(self, order_id: OrderId) -> NewOrderItem {
        NewOrderItem {
            order_id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            price_at_time: self.price_at_time,
            image_url: self.image_url,
        }
    }
}

/// Gateway callback fields to check before saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSignature {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub signature: String,
}

/// A checkout that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub order: NewOrder,
    pub items: Vec<LineItemDraft>,
    pub signature: Option<InlineSignature>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn storable(value: Decimal) -> bool {
    value <= max_stored_amount()
}

/// Sum of `price * quantity` over all items, or `None` if it cannot be
/// stored.
fn item_total(items: &[LineItemDraft]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| {
            item.price_at_time
                .checked_mul(Decimal::from(item.quantity))
                .and_then(|line| sum.checked_add(line))
        })
        .map(money)
        .filter(|total| storable(*total))
}

fn string_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(key) {
        Some(Value::String(s)) => non_blank(Some(s)),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Quantity must be a whole number of at least 1; anything else means 1.
fn quantity(value: Option<&Value>) -> i32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .filter(|q| *q >= 1)
        .and_then(|q| i32::try_from(q).ok())
        .unwrap_or(1)
}

/// Unit price; missing, unparseable or negative prices become zero.
fn unit_price(value: Option<&Value>) -> Decimal {
    value
        .and_then(|v| parse_major_amount(v).ok())
        .filter(|p| *p >= Decimal::ZERO)
        .map_or(Decimal::ZERO, money)
}

fn line_item(item: &Value) -> Option<LineItemDraft> {
    if !item.is_object() {
        return None;
    }

    Some(LineItemDraft {
        product_id: string_field(item, &["id", "product_id"])
            .as_deref()
            .and_then(ProductId::parse),
        product_name: string_field(item, &["name", "product_name"])
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_owned()),
        quantity: quantity(item.get("quantity")),
        price_at_time: unit_price(item.get("price")),
        image_url: string_field(item, &["image", "image_url"]),
    })
}

/// Optional non-negative amount; absent means `None`.
fn optional_amount(
    value: Option<&Value>,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<Decimal> {
    match value.map(parse_major_amount) {
        None | Some(Err(AmountError::Missing)) => None,
        Some(Ok(amount)) if amount >= Decimal::ZERO && storable(money(amount)) => {
            Some(money(amount))
        }
        Some(_) => {
            violations.push(field.to_owned());
            None
        }
    }
}

/// Validate a checkout request, collecting every violation before failing.
///
/// # Errors
///
/// Returns a [`ValidationError`] listing every offending field.
pub fn validate(request: &SaveOrderRequest) -> Result<ValidatedCheckout, ValidationError> {
    let mut violations: Vec<String> = Vec::new();

    let items: Vec<LineItemDraft> = match request.items.as_ref() {
        Some(Value::Array(raw)) if !raw.is_empty() => {
            let mut items = Vec::with_capacity(raw.len());
            for (index, item) in raw.iter().enumerate() {
                match line_item(item) {
                    Some(item) if !storable(item.price_at_time) => {
                        violations.push(format!("items[{index}].price"));
                    }
                    Some(item) => items.push(item),
                    None => violations.push(format!("items[{index}]")),
                }
            }
            items
        }
        _ => {
            violations.push("items".to_owned());
            Vec::new()
        }
    };

    let total_amount = match request.total_amount.as_ref().map(parse_major_amount) {
        Some(Ok(total)) if total > Decimal::ZERO && storable(money(total)) => {
            Some(money(total))
        }
        _ => {
            violations.push("total_amount".to_owned());
            None
        }
    };

    let subtotal = optional_amount(request.subtotal.as_ref(), "subtotal", &mut violations);
    let shipping_fee =
        optional_amount(request.shipping_fee.as_ref(), "shipping_fee", &mut violations);
    let tax = optional_amount(request.tax.as_ref(), "tax", &mut violations);

    let subtotal = subtotal.or_else(|| {
        let derived = item_total(&items);
        if derived.is_none() && !violations.iter().any(|f| f.starts_with("items")) {
            violations.push("items".to_owned());
        }
        derived
    });

    let payment_method = match request.payment_method.as_deref().map(str::parse::<PaymentMethod>) {
        Some(Ok(method)) => Some(method),
        _ => {
            violations.push("payment_method".to_owned());
            None
        }
    };

    let info = request.shipping_info.clone().unwrap_or_default();
    let mut shipping_missing = 0_usize;
    let mut required = |value: Option<&str>, field: &str| {
        non_blank(value).unwrap_or_else(|| {
            violations.push(format!("shipping_info.{field}"));
            shipping_missing += 1;
            String::new()
        })
    };
    let shipping = ShippingAddress {
        first_name: required(info.first_name.as_deref(), "firstName"),
        last_name: required(info.last_name.as_deref(), "lastName"),
        email: required(info.email.as_deref(), "email"),
        phone: required(info.phone.as_deref(), "phone"),
        address: required(info.address.as_deref(), "address"),
        city: required(info.city.as_deref(), "city"),
        state: required(info.state.as_deref(), "state"),
        zip_code: required(info.zip_code.as_deref(), "zipCode"),
        country: non_blank(info.country.as_deref()).unwrap_or_else(|| DEFAULT_COUNTRY.to_owned()),
    };

    if !violations.is_empty() {
        let message = if shipping_missing == violations.len() {
            "Incomplete shipping information"
        } else {
            "Invalid checkout request"
        };
        return Err(ValidationError::new(message, violations));
    }

    let (Some(total_amount), Some(subtotal), Some(payment_method)) =
        (total_amount, subtotal, payment_method)
    else {
        return Err(ValidationError::new("Invalid checkout request", violations));
    };

    let details = request.payment_details.clone().unwrap_or_default();
    let (payment_id, razorpay_order_id, signature) = if payment_method.uses_gateway() {
        let payment_id = non_blank(request.payment_id.as_deref())
            .or_else(|| non_blank(details.razorpay_payment_id.as_deref()));
        let razorpay_order_id = non_blank(request.razorpay_order_id.as_deref())
            .or_else(|| non_blank(details.razorpay_order_id.as_deref()));
        let signature = match non_blank(details.razorpay_signature.as_deref()) {
            None => None,
            Some(signature) => match (&razorpay_order_id, &payment_id) {
                (Some(order_id), Some(payment_id)) => Some(InlineSignature {
                    razorpay_order_id: order_id.clone(),
                    razorpay_payment_id: payment_id.clone(),
                    signature,
                }),
                _ => {
                    return Err(ValidationError::field(
                        "payment_details",
                        "Signature supplied without payment and order ids",
                    ));
                }
            },
        };
        (payment_id, razorpay_order_id, signature)
    } else {
        (None, None, None)
    };

    // Only a verified callback signature confirms at creation; otherwise
    // verify-payment or the webhook does.
    let status = if signature.is_some() {
        OrderStatus::Confirmed
    } else {
        OrderStatus::Pending
    };

    Ok(ValidatedCheckout {
        order: NewOrder {
            user_id: request.user_id.as_deref().and_then(UserId::parse),
            subtotal,
            shipping_fee: shipping_fee.unwrap_or(Decimal::ZERO),
            tax: tax.unwrap_or(Decimal::ZERO),
            total_amount,
            payment_method,
            payment_id,
            razorpay_order_id,
            status,
            shipping,
        },
        items,
        signature,
    })
}

// =============================================================================
// Service
// =============================================================================

/// Order checkout and history over an [`OrderStore`].
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    key_secret: SecretString,
    timeout: Duration,
}

impl OrderService {
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, key_secret: SecretString, timeout: Duration) -> Self {
        Self {
            store,
            key_secret,
            timeout,
        }
    }

    /// Validate and persist a checkout.
    ///
    /// # Errors
    ///
    /// - `Validation` / `InvalidSignature` before any write
    /// - `OrderCreate` if the order row could not be inserted
    /// - `ItemCreate` if the items could not be inserted; the order row has
    ///   been deleted (or the delete failed and was logged)
    #[instrument(skip(self, request))]
    pub async fn save_order(&self, request: &SaveOrderRequest) -> Result<OrderSummary, CheckoutError> {
        let checkout = validate(request)?;

        if let Some(inline) = &checkout.signature {
            verify_payment_signature(
                self.key_secret.expose_secret(),
                &inline.razorpay_order_id,
                &inline.razorpay_payment_id,
                &inline.signature,
            )
            .map_err(|_| CheckoutError::InvalidSignature)?;
        }

        let summary = bounded(self.timeout, self.store.insert_order(&checkout.order))
            .await
            .map_err(CheckoutError::OrderCreate)?;

        let items: Vec<NewOrderItem> = checkout
            .items
            .into_iter()
            .map(|item| item.bind(summary.id))
            .collect();

        if let Err(item_error) = bounded(self.timeout, self.store.insert_items(&items)).await {
            match bounded(self.timeout, self.store.delete_order(summary.id)).await {
                Ok(()) => warn!(
                    order_id = %summary.id,
                    error = %item_error,
                    "Item insert failed, order rolled back"
                ),
                Err(delete_error) => error!(
                    order_id = %summary.id,
                    error = %item_error,
                    delete_error = %delete_error,
                    "Item insert failed and order rollback failed"
                ),
            }
            return Err(CheckoutError::ItemCreate(item_error));
        }

        info!(
            order_id = %summary.id,
            order_number = %summary.order_number,
            status = %summary.status,
            items = items.len(),
            "Order saved"
        );
        Ok(summary)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// `Validation` if `user_id` is absent, `Store` if the read fails twice.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        user_id: Option<&str>,
        page: Page,
    ) -> Result<(Vec<Order>, Pagination), CheckoutError> {
        let user_id = user_id
            .and_then(UserId::parse)
            .ok_or_else(|| ValidationError::field("user_id", "user_id is required"))?;

        let paged = retry_read(self.timeout, || self.store.list_orders(&user_id, page)).await?;
        Ok((paged.rows, Pagination::new(page, paged.total)))
    }

    /// Fetch one order with its items.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown or malformed ids, `Store` on read failure.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> Result<Order, CheckoutError> {
        let not_found = || CheckoutError::NotFound("Order".to_owned());
        let id = OrderId::parse(id.trim()).map_err(|_| not_found())?;

        retry_read(self.timeout, || self.store.get_order(id))
            .await?
            .ok_or_else(not_found)
    }

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// `Store` if the ping fails or times out.
    pub async fn ping(&self) -> Result<(), CheckoutError> {
        bounded(self.timeout, self.store.ping()).await?;
        Ok(())
    }
}
