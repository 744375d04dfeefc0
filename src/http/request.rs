//! Request identification and tracking.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the caller sent none
//! - Echo the request ID on the response
//! - Count in-flight requests for the drain
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The envelope reuses the request ID when it is a UUID

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use uuid::Uuid;

use crate::net::InFlightTracker;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns `x-request-id` to requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request ID as sent or assigned, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Envelope identifier: the request ID if it parses as a UUID, else fresh.
pub fn envelope_id(request_id: &str) -> Uuid {
    Uuid::parse_str(request_id).unwrap_or_else(|_| Uuid::new_v4())
}

/// Middleware holding an in-flight guard for the duration of the request.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let guard = tracker.track();
    tracing::trace!(seq = %guard.seq(), "Request started");
    let response = next.run(request).await;
    drop(guard);
    response
}
