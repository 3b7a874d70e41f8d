//! HTTP middleware stack for the checkout service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `CatchPanicLayer` (panics become a JSON 500)
//! 3. `TraceLayer` (request span with method, uri, status, latency)
//! 4. Request ID (record on span and Sentry scope, echo in response)
//! 5. CORS
//! 6. Error detail (development only: merge internal detail into 5xx bodies)

pub mod error_detail;
pub mod request_id;

pub use error_detail::error_detail_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
