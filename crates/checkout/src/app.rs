//! Router assembly.

use std::any::Any;

use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::CheckoutConfig;
use crate::error::ErrorBody;
use crate::middleware::{REQUEST_ID_HEADER, error_detail_middleware, request_id_middleware};
use crate::routes;
use crate::state::AppState;

/// Build the application router with its full middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.config());

    routes::routes()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            error_detail_middleware,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS policy: any origin in development, the configured list otherwise.
fn cors_layer(config: &CheckoutConfig) -> CorsLayer {
    if config.environment.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Convert a handler panic into a JSON 500.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Internal server error")),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use checkout_core::{OrderStatus, PaymentMethod};

    use super::*;
    use crate::config::Environment;
    use crate::db::OrderStore;
    use crate::razorpay::signature::sign;
    use crate::testing::{
        FakeGateway, MemoryStore, SECRET, WEBHOOK_SECRET, seed_gateway_order, test_state,
    };

    struct Harness {
        store: Arc<MemoryStore>,
        gateway: Arc<FakeGateway>,
        app: Router,
    }

    fn harness(environment: Environment) -> Harness {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(FakeGateway::default());
        let app = build_router(test_state(&store, &gateway, environment));
        Harness {
            store,
            gateway,
            app,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn checkout_body() -> Value {
        json!({
            "items": [{"id": "p1", "name": "Shirt", "price": 499, "quantity": 2}],
            "total_amount": 998,
            "payment_method": "cod",
            "shipping_info": {
                "firstName": "A", "lastName": "B", "email": "a@b.com",
                "phone": "9999999999", "address": "X", "city": "Y",
                "state": "Z", "zipCode": "123456"
            }
        })
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let h = harness(Environment::Production);
        let (status, body) = send(&h.app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(body["endpoints"].as_array().unwrap().len() >= 7);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let h = harness(Environment::Production);
        let (status, body) = send(&h.app, get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_create_order_end_to_end() {
        let h = harness(Environment::Production);
        let (status, body) = send(&h.app, post_json("/create-order", &json!({"amount": 499.99}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"], 49_999);
        assert_eq!(body["currency"], "INR");
        assert!(body["id"].as_str().unwrap().starts_with("order_"));

        let calls = h.gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].amount.as_i64(), 49_999);
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_amounts() {
        let h = harness(Environment::Production);
        for amount in [json!("abc"), json!(0), json!(-10), json!(100_001)] {
            let (status, body) =
                send(&h.app, post_json("/create-order", &json!({"amount": amount}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{amount}");
            assert_eq!(body["success"], false);
        }
        let (status, _) = send(&h.app, post_json("/create-order", &json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(h.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_400() {
        let h = harness(Environment::Production);
        let request = Request::post("/save-order")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_save_order_cod_end_to_end() {
        let h = harness(Environment::Production);
        let (status, body) = send(&h.app, post_json("/save-order", &checkout_body())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["order"]["status"], "pending");
        assert_eq!(body["order"]["order_number"], "ORD-00000001");

        let id = body["order"]["id"].as_str().unwrap().to_owned();
        let (status, order) = send(&h.app, get(&format!("/orders/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["payment_id"], Value::Null);
        assert_eq!(order["payment_method"], "cod");
        assert_eq!(order["items"][0]["quantity"], 2);
        assert_eq!(order["items"][0]["price_at_time"], 499.0);
    }

    #[tokio::test]
    async fn test_save_order_lists_every_missing_field() {
        let h = harness(Environment::Production);
        let mut body = checkout_body();
        body["shipping_info"] = json!({"firstName": "A"});

        let (status, body) = send(&h.app, post_json("/save-order", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Incomplete shipping information");
        assert_eq!(body["fields"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_save_order_rejects_out_of_range_money() {
        let h = harness(Environment::Production);
        let mut body = checkout_body();
        body["total_amount"] = json!("1e20");
        body["items"][0]["price"] = json!("79228162514264337593543950335");

        let (status, body) = send(&h.app, post_json("/save-order", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid checkout request");
        assert_eq!(body["fields"], json!(["items[0].price", "total_amount"]));
        assert!(h.store.last_inserted_order().is_none());
    }

    #[tokio::test]
    async fn test_save_order_item_failure_rolls_back() {
        let h = harness(Environment::Production);
        h.store.fail_item_inserts();

        let (status, body) = send(&h.app, post_json("/save-order", &checkout_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to create order items");
        assert!(body.get("detail").is_none());

        let id = h.store.last_inserted_order().unwrap();
        let (status, _) = send(&h.app, get(&format!("/orders/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_development_adds_error_detail() {
        let h = harness(Environment::Development);
        h.store.fail_item_inserts();

        let (status, body) = send(&h.app, post_json("/save-order", &checkout_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("order items"));
    }

    #[tokio::test]
    async fn test_list_orders() {
        let h = harness(Environment::Production);
        let mut body = checkout_body();
        body["user_id"] = json!("user-1");
        for _ in 0..3 {
            send(&h.app, post_json("/save-order", &body)).await;
        }

        let (status, body) = send(&h.app, get("/orders?user_id=user-1&limit=2&page=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["pagination"],
            json!({"page": 2, "limit": 2, "total": 3, "pages": 2})
        );

        let (status, _) = send(&h.app, get("/orders")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_products() {
        let h = harness(Environment::Production);
        h.store.add_product("p1", "Shirt", Some("Apparel"), Some("Acme"));
        h.store.add_product("p2", "Mug", Some("Home"), Some("Acme"));

        let (status, body) = send(&h.app, get("/products?category=apparel")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["name"], "Shirt");
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["pagination"]["limit"], 20);
    }

    #[tokio::test]
    async fn test_verify_payment_end_to_end() {
        let h = harness(Environment::Production);
        let id = seed_gateway_order(&h.store, "order_42").await;

        let bad = json!({
            "razorpay_order_id": "order_42",
            "razorpay_payment_id": "pay_42",
            "razorpay_signature": "not-a-signature"
        });
        let (status, body) = send(&h.app, post_json("/verify-payment", &bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Invalid signature"}));
        let order = h.store.get_order(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let good = json!({
            "razorpay_order_id": "order_42",
            "razorpay_payment_id": "pay_42",
            "razorpay_signature": sign(SECRET, b"order_42|pay_42").unwrap()
        });
        let (status, body) = send(&h.app, post_json("/verify-payment", &good)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["payment_id"], "pay_42");

        let order = h.store.get_order(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_method, PaymentMethod::Razorpay);
    }

    #[tokio::test]
    async fn test_verify_payment_missing_fields() {
        let h = harness(Environment::Production);
        let (status, body) = send(
            &h.app,
            post_json("/verify-payment", &json!({"razorpay_order_id": "order_1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required payment fields");
    }

    #[tokio::test]
    async fn test_webhook() {
        let h = harness(Environment::Production);
        let id = seed_gateway_order(&h.store, "order_77").await;
        let payload = json!({
            "event": "payment.captured",
            "payload": {"payment": {"entity": {"id": "pay_77", "order_id": "order_77"}}}
        })
        .to_string();

        let unsigned = Request::post("/webhook/razorpay")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.clone()))
            .unwrap();
        let (status, _) = send(&h.app, unsigned).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let signed = Request::post("/webhook/razorpay")
            .header(header::CONTENT_TYPE, "application/json")
            .header(
                "x-razorpay-signature",
                sign(WEBHOOK_SECRET, payload.as_bytes()).unwrap(),
            )
            .body(Body::from(payload))
            .unwrap();
        let (status, body) = send(&h.app, signed).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"received": true}));

        let order = h.store.get_order(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_readiness_reflects_store() {
        let h = harness(Environment::Production);
        let (status, _) = send(&h.app, get("/health/ready")).await;
        assert_eq!(status, StatusCode::OK);

        h.store.set_unreachable();
        let (status, _) = send(&h.app, get("/health/ready")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = send(&h.app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let h = harness(Environment::Production);
        let response = h
            .app
            .clone()
            .oneshot(
                Request::get("/health")
                    .header(REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");
    }
}
