//! In-memory collaborators for unit and router tests.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;

use checkout_core::{AmountPolicy, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

use crate::config::{CheckoutConfig, Environment, RazorpayConfig};
use crate::db::{OrderStore, ProductStore, RepositoryError};
use crate::models::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderSummary, Page, Paged, Product, ProductFilter,
    ShippingAddress,
};
use crate::razorpay::{CreateOrderRequest, GatewayOrder, PaymentGateway, RazorpayError};
use crate::state::AppState;

pub const SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";

fn injected(what: &str) -> RepositoryError {
    RepositoryError::Database(sqlx::Error::ColumnNotFound(format!("injected {what} failure")))
}

fn transient() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
struct Inner {
    orders: Vec<Order>,
    products: Vec<Product>,
    next_number: u64,
    last_inserted: Option<OrderId>,
    fail_items: bool,
    fail_deletes: bool,
    fail_updates: bool,
    transient_reads: u32,
    unreachable: bool,
}

impl Inner {
    fn take_transient(&mut self) -> Result<(), RepositoryError> {
        if self.transient_reads > 0 {
            self.transient_reads -= 1;
            return Err(transient());
        }
        Ok(())
    }
}

/// Order and product store backed by vectors, with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn fail_item_inserts(&self) {
        self.inner.lock().unwrap().fail_items = true;
    }

    pub fn fail_deletes(&self) {
        self.inner.lock().unwrap().fail_deletes = true;
    }

    pub fn fail_updates(&self) {
        self.inner.lock().unwrap().fail_updates = true;
    }

    /// The next list read fails with a retryable error.
    pub fn fail_next_read_transiently(&self) {
        self.inner.lock().unwrap().transient_reads = 1;
    }

    pub fn set_unreachable(&self) {
        self.inner.lock().unwrap().unreachable = true;
    }

    /// Id of the most recent order insert, even if it was rolled back.
    pub fn last_inserted_order(&self) -> Option<OrderId> {
        self.inner.lock().unwrap().last_inserted
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().orders.len()
    }

    pub fn add_product(&self, id: &str, name: &str, category: Option<&str>, brand: Option<&str>) {
        self.inner.lock().unwrap().products.push(Product {
            id: ProductId::parse(id).unwrap(),
            name: name.to_owned(),
            description: None,
            price: Decimal::new(499, 0),
            image_url: None,
            category: category.map(str::to_owned),
            brand: brand.map(str::to_owned),
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<OrderSummary, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_number += 1;

        let stored = Order {
            id: OrderId::random(),
            order_number: format!("ORD-{:08}", inner.next_number),
            user_id: order.user_id.clone(),
            subtotal: order.subtotal,
            shipping_fee: order.shipping_fee,
            tax: order.tax,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            payment_id: order.payment_id.clone(),
            razorpay_order_id: order.razorpay_order_id.clone(),
            status: order.status,
            shipping_address: order.shipping.clone(),
            created_at: Utc::now(),
            items: Vec::new(),
        };
        let summary = stored.summary();
        inner.last_inserted = Some(stored.id);
        inner.orders.push(stored);
        Ok(summary)
    }

    async fn insert_items(&self, items: &[NewOrderItem]) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_items {
            return Err(injected("item insert"));
        }

        for item in items {
            let order = inner
                .orders
                .iter_mut()
                .find(|o| o.id == item.order_id)
                .ok_or(RepositoryError::Database(sqlx::Error::RowNotFound))?;
            order.items.push(OrderItem {
                id: OrderItemId::random(),
                order_id: item.order_id,
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price_at_time: item.price_at_time,
                image_url: item.image_url.clone(),
            });
        }
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_deletes {
            return Err(injected("delete"));
        }
        inner.orders.retain(|o| o.id != id);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_transient()?;
        Ok(inner.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Paged<Order>, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_transient()?;

        let matching: Vec<&Order> = inner
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id.as_ref() == Some(user_id))
            .collect();
        let total = i64::try_from(matching.len()).unwrap();
        let rows = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(usize::try_from(page.limit()).unwrap())
            .cloned()
            .collect();
        Ok(Paged { rows, total })
    }

    async fn update_payment_status(
        &self,
        razorpay_order_id: &str,
        status: OrderStatus,
        payment_id: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_updates {
            return Err(injected("update"));
        }

        let mut rows = 0;
        for order in inner
            .orders
            .iter_mut()
            .filter(|o| o.razorpay_order_id.as_deref() == Some(razorpay_order_id))
        {
            order.status = status;
            if let Some(payment_id) = payment_id {
                order.payment_id = Some(payment_id.to_owned());
            }
            rows += 1;
        }
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.inner.lock().unwrap().unreachable {
            return Err(transient());
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Paged<Product>, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_transient()?;

        let matching: Vec<&Product> = inner
            .products
            .iter()
            .rev()
            .filter(|p| filter.matches(p))
            .collect();
        let total = i64::try_from(matching.len()).unwrap();
        let rows = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(usize::try_from(page.limit()).unwrap())
            .cloned()
            .collect();
        Ok(Paged { rows, total })
    }
}

/// Gateway double that records every request.
#[derive(Default)]
pub struct FakeGateway {
    calls: Mutex<Vec<CreateOrderRequest>>,
    failure: Mutex<Option<RazorpayError>>,
}

impl FakeGateway {
    pub fn calls(&self) -> Vec<CreateOrderRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Fail the next call with `error`.
    pub fn fail_with(&self, error: RazorpayError) {
        *self.failure.lock().unwrap() = Some(error);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<GatewayOrder, RazorpayError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(request.clone());

        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }

        Ok(GatewayOrder {
            id: format!("order_test{}", calls.len()),
            amount: request.amount.as_i64(),
            currency: request.currency.code().to_owned(),
            receipt: Some(request.receipt.clone()),
            status: "created".to_owned(),
        })
    }
}

/// Insert a pending gateway order carrying `razorpay_order_id`.
pub async fn seed_gateway_order(store: &MemoryStore, razorpay_order_id: &str) -> OrderId {
    let order = NewOrder {
        user_id: UserId::parse("user-1"),
        subtotal: Decimal::new(998, 0),
        shipping_fee: Decimal::ZERO,
        tax: Decimal::ZERO,
        total_amount: Decimal::new(998, 0),
        payment_method: PaymentMethod::Razorpay,
        payment_id: None,
        razorpay_order_id: Some(razorpay_order_id.to_owned()),
        status: OrderStatus::Pending,
        shipping: ShippingAddress {
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.com".into(),
            phone: "9999999999".into(),
            address: "X".into(),
            city: "Y".into(),
            state: "Z".into(),
            zip_code: "123456".into(),
            country: "India".into(),
        },
    };
    store.insert_order(&order).await.unwrap().id
}

pub fn test_config(environment: Environment) -> CheckoutConfig {
    CheckoutConfig {
        database_url: SecretString::from("postgres://localhost/checkout_test".to_owned()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 5000,
        environment,
        cors_origins: vec!["http://localhost:3000".to_owned()],
        razorpay: RazorpayConfig {
            api_base: "https://api.razorpay.com/v1".to_owned(),
            key_id: "rzp_test_key".to_owned(),
            key_secret: SecretString::from(SECRET.to_owned()),
            webhook_secret: SecretString::from(WEBHOOK_SECRET.to_owned()),
        },
        amounts: AmountPolicy::default(),
        upstream_timeout: Duration::from_secs(1),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

pub fn test_state(
    store: &Arc<MemoryStore>,
    gateway: &Arc<FakeGateway>,
    environment: Environment,
) -> AppState {
    AppState::new(
        test_config(environment),
        store.clone(),
        store.clone(),
        gateway.clone(),
    )
}
