//! Order persistence on `PostgreSQL`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use checkout_core::{OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::{OrderStore, PgStore, RepositoryError};
use crate::models::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderSummary, Page, Paged, ShippingAddress,
};

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, subtotal, shipping_fee, tax, total_amount,
    payment_method, payment_id, razorpay_order_id, status,
    shipping_first_name, shipping_last_name, shipping_email, shipping_phone,
    shipping_address, shipping_city, shipping_state, shipping_zip_code,
    shipping_country, created_at
";

#[derive(Debug, sqlx::FromRow)]
struct InsertedOrderRow {
    id: Uuid,
    order_number: String,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Option<String>,
    subtotal: Decimal,
    shipping_fee: Decimal,
    tax: Decimal,
    total_amount: Decimal,
    payment_method: String,
    payment_id: Option<String>,
    razorpay_order_id: Option<String>,
    status: String,
    shipping_first_name: String,
    shipping_last_name: String,
    shipping_email: String,
    shipping_phone: String,
    shipping_address: String,
    shipping_city: String,
    shipping_state: String,
    shipping_zip_code: String,
    shipping_country: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Option<String>,
    product_name: String,
    quantity: i32,
    price_at_time: Decimal,
    image_url: Option<String>,
}

fn parse_status(raw: &str) -> Result<OrderStatus, RepositoryError> {
    raw.parse().map_err(RepositoryError::DataCorruption)
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let payment_method: PaymentMethod = self
            .payment_method
            .parse()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            user_id: self.user_id.as_deref().and_then(UserId::parse),
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            tax: self.tax,
            total_amount: self.total_amount,
            payment_method,
            payment_id: self.payment_id,
            razorpay_order_id: self.razorpay_order_id,
            status: parse_status(&self.status)?,
            shipping_address: ShippingAddress {
                first_name: self.shipping_first_name,
                last_name: self.shipping_last_name,
                email: self.shipping_email,
                phone: self.shipping_phone,
                address: self.shipping_address,
                city: self.shipping_city,
                state: self.shipping_state,
                zip_code: self.shipping_zip_code,
                country: self.shipping_country,
            },
            created_at: self.created_at,
            items,
        })
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: row.product_id.as_deref().and_then(ProductId::parse),
            product_name: row.product_name,
            quantity: row.quantity,
            price_at_time: row.price_at_time,
            image_url: row.image_url,
        }
    }
}

impl PgStore {
    /// Load items for a set of orders, grouped by order id.
    async fn items_for(
        &self,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, quantity, price_at_time, image_url
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY created_at, id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool())
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<OrderSummary, RepositoryError> {
        let row = sqlx::query_as::<_, InsertedOrderRow>(
            r"
            INSERT INTO orders (
                user_id, subtotal, shipping_fee, tax, total_amount,
                payment_method, payment_id, razorpay_order_id, status,
                shipping_first_name, shipping_last_name, shipping_email, shipping_phone,
                shipping_address, shipping_city, shipping_state, shipping_zip_code,
                shipping_country
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id, order_number, total_amount, status, created_at
            ",
        )
        .bind(order.user_id.as_ref().map(UserId::as_str))
        .bind(order.subtotal)
        .bind(order.shipping_fee)
        .bind(order.tax)
        .bind(order.total_amount)
        .bind(order.payment_method.as_str())
        .bind(order.payment_id.as_deref())
        .bind(order.razorpay_order_id.as_deref())
        .bind(order.status.as_str())
        .bind(&order.shipping.first_name)
        .bind(&order.shipping.last_name)
        .bind(&order.shipping.email)
        .bind(&order.shipping.phone)
        .bind(&order.shipping.address)
        .bind(&order.shipping.city)
        .bind(&order.shipping.state)
        .bind(&order.shipping.zip_code)
        .bind(&order.shipping.country)
        .fetch_one(self.pool())
        .await?;

        Ok(OrderSummary {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            total_amount: row.total_amount,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
        })
    }

    async fn insert_items(&self, items: &[NewOrderItem]) -> Result<(), RepositoryError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO order_items \
             (order_id, product_id, product_name, quantity, price_at_time, image_url) ",
        );
        builder.push_values(items, |mut row, item| {
            row.push_bind(item.order_id.as_uuid())
                .push_bind(item.product_id.as_ref().map(|p| p.as_str().to_owned()))
                .push_bind(item.product_name.clone())
                .push_bind(item.quantity)
                .push_bind(item.price_at_time)
                .push_bind(item.image_url.clone());
        });

        builder.build().execute(self.pool()).await?;
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn list_orders(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> Result<Paged<Order>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_one(self.pool())
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_str())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        Ok(Paged {
            rows: self.attach_items(rows).await?,
            total,
        })
    }

    async fn update_payment_status(
        &self,
        razorpay_order_id: &str,
        status: OrderStatus,
        payment_id: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2,
                payment_id = COALESCE($3, payment_id),
                updated_at = now()
            WHERE razorpay_order_id = $1
            ",
        )
        .bind(razorpay_order_id)
        .bind(status.as_str())
        .bind(payment_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }
}
