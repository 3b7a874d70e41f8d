//! Order endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::error::{JsonBody, Result};
use crate::models::{Order, OrderSummary, Page, Pagination};
use crate::services::SaveOrderRequest;
use crate::services::orders::DEFAULT_ORDER_LIMIT;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SaveOrderResponse {
    pub success: bool,
    pub order: OrderSummary,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub data: Vec<Order>,
    pub pagination: Pagination,
}

/// Query parameters for order history. Values stay raw so junk falls back
/// to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub user_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Persist a checkout.
///
/// POST /save-order
pub async fn save_order(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SaveOrderRequest>,
) -> Result<(StatusCode, Json<SaveOrderResponse>)> {
    let order = state.orders().save_order(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SaveOrderResponse {
            success: true,
            order,
        }),
    ))
}

/// List a user's orders with their items.
///
/// GET /orders?user_id=&page=&limit=
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrderListResponse>> {
    let page = Page::from_query(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_ORDER_LIMIT,
    );
    let (data, pagination) = state
        .orders()
        .list_orders(query.user_id.as_deref(), page)
        .await?;

    Ok(Json(OrderListResponse {
        success: true,
        data,
        pagination,
    }))
}

/// Fetch one order with its items.
///
/// GET /orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    Ok(Json(state.orders().get_order(&id).await?))
}
