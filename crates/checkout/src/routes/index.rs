//! Service banner.

use axum::Json;
use serde::Serialize;

use super::ENDPOINTS;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub ok: bool,
    pub message: &'static str,
    pub endpoints: &'static [&'static str],
}

/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        ok: true,
        message: "Checkout service is running",
        endpoints: ENDPOINTS,
    })
}
