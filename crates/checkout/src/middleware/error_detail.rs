//! Development-only error detail.
//!
//! [`crate::error::AppError`] attaches an [`ErrorDetail`] extension to every
//! 5xx response. In development this middleware merges it into the JSON body
//! as `detail`; in production the extension is dropped unseen.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::error::ErrorDetail;
use crate::state::AppState;

/// Error bodies are small; anything larger is passed through untouched.
const MAX_ERROR_BODY: usize = 64 * 1024;

pub async fn error_detail_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !state.config().environment.is_development() {
        return response;
    }

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_ERROR_BODY).await else {
        return Response::from_parts(parts, Body::empty());
    };

    let Ok(Value::Object(mut json)) = serde_json::from_slice::<Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    json.insert("detail".to_string(), Value::String(detail));
    parts.headers.remove(header::CONTENT_LENGTH);

    let body = serde_json::to_vec(&json).map_or_else(|_| Body::from(bytes), Body::from);
    Response::from_parts(parts, body)
}
