//! Catalogue endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Page, Pagination, Product, ProductFilter};
use crate::services::products::DEFAULT_PRODUCT_LIMIT;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub success: bool,
    pub data: Vec<Product>,
    pub pagination: Pagination,
}

/// GET /products?category=&brand=&page=&limit=
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<ProductListResponse>> {
    let filter = ProductFilter::new(query.category.as_deref(), query.brand.as_deref());
    let page = Page::from_query(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_PRODUCT_LIMIT,
    );
    let (data, pagination) = state.products().list_products(&filter, page).await?;

    Ok(Json(ProductListResponse {
        success: true,
        data,
        pagination,
    }))
}
