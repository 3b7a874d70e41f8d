//! Product catalogue queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use checkout_core::ProductId;

use super::{PgStore, ProductStore, RepositoryError};
use crate::models::{Page, Paged, Product, ProductFilter};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    price: Decimal,
    image_url: Option<String>,
    category: Option<String>,
    brand: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let id = ProductId::parse(&row.id)
            .ok_or_else(|| RepositoryError::DataCorruption("blank product id".to_owned()))?;

        Ok(Self {
            id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            category: row.category,
            brand: row.brand,
            created_at: row.created_at,
        })
    }
}

/// A catalogue entry to upsert, as read from a seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

/// Append `WHERE` clauses for the filter. Matching is case-insensitive.
fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a ProductFilter) {
    let mut first = true;
    let mut clause = |builder: &mut QueryBuilder<'a, Postgres>, column: &str, value: &'a str| {
        builder.push(if first { " WHERE " } else { " AND " });
        first = false;
        builder.push(format!("lower({column}) = lower("));
        builder.push_bind(value);
        builder.push(")");
    };

    if let Some(category) = filter.category.as_deref() {
        clause(builder, "category", category);
    }
    if let Some(brand) = filter.brand.as_deref() {
        clause(builder, "brand", brand);
    }
}

impl PgStore {
    /// Insert a product, or overwrite the existing row with the same id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn upsert_product(&self, product: &NewProduct) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, description, price, image_url, category, brand)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                image_url = EXCLUDED.image_url,
                category = EXCLUDED.category,
                brand = EXCLUDED.brand
            ",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.image_url.as_deref())
        .bind(product.category.as_deref())
        .bind(product.brand.as_deref())
        .execute(self.pool())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<Paged<Product>, RepositoryError> {
        let mut count: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_filter(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await?;

        let mut select: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, name, description, price, image_url, category, brand, created_at \
             FROM products",
        );
        push_filter(&mut select, filter);
        select.push(" ORDER BY created_at DESC, id LIMIT ");
        select.push_bind(page.limit());
        select.push(" OFFSET ");
        select.push_bind(page.offset());

        let rows = select
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await?;

        Ok(Paged {
            rows: rows
                .into_iter()
                .map(Product::try_from)
                .collect::<Result<_, _>>()?,
            total,
        })
    }
}
