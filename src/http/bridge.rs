//! The request-to-message bridge handler.
//!
//! ```text
//! request → RouteTable::resolve ─ no match → 404
//!         → EnvelopeBuilder::build ─ malformed → 400
//!         → publish_with_deadline
//!         → DeliveryReport to the drain
//!         → 200 / 500
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::broker::{publish_with_deadline, DeliveryReport, Destination, Publisher, ReportSender};
use crate::config::CompatConfig;
use crate::envelope::{EnvelopeBuilder, InboundRequest};
use crate::http::request::{envelope_id, request_id};
use crate::http::response::delivery_response;
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub envelopes: EnvelopeBuilder,
    pub publisher: Arc<dyn Publisher>,
    pub destination: Arc<Destination>,
    pub publish_deadline: Duration,
    pub reports: ReportSender,
    pub compat: CompatConfig,
}

/// Catch-all handler: every path goes through the route table.
pub async fn bridge_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers).to_string();
    let path = uri.path().to_string();

    let Some(route) = state.routes.resolve(&method, &path) else {
        tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start_time);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        action = %route.action,
        pattern = %route.pattern,
        "Bridging request"
    );

    let inbound = InboundRequest {
        id: envelope_id(&request_id),
        method: method.clone(),
        uri,
        headers,
        body,
    };

    let payload = match state
        .envelopes
        .build(&inbound, &route)
        .and_then(|envelope| envelope.to_bytes())
    {
        Ok(bytes) => Bytes::from(bytes),
        Err(e) => {
            tracing::warn!(request_id = %request_id, action = %route.action, error = %e, "Envelope rejected");
            let response = e.into_response();
            metrics::record_request(
                method.as_str(),
                response.status().as_u16(),
                route.action.as_str(),
                start_time,
            );
            return response;
        }
    };

    let publish_start = Instant::now();
    let outcome = publish_with_deadline(
        state.publisher.as_ref(),
        &state.destination,
        payload,
        state.publish_deadline,
    )
    .await;

    state.reports.send(DeliveryReport {
        request_id: inbound.id,
        action: route.action,
        destination: state.destination.to_string(),
        outcome: outcome.clone(),
        elapsed: publish_start.elapsed(),
    });

    let response = delivery_response(&outcome, state.compat.legacy_success_on_failure);
    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        route.action.as_str(),
        start_time,
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{report_channel, Destination, MemoryBroker};
    use crate::envelope::Envelope;
    use crate::routing::Action;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use tower::ServiceExt;

    fn router(broker: MemoryBroker) -> (Router, Destination) {
        let destination = Destination::Partition {
            topic: "data".into(),
            partition: 0,
        };
        let (reports, _drain) = report_channel();
        let state = AppState {
            routes: Arc::new(RouteTable::legacy()),
            envelopes: EnvelopeBuilder::new("api"),
            publisher: Arc::new(broker),
            destination: Arc::new(destination.clone()),
            publish_deadline: Duration::from_secs(1),
            reports,
            compat: CompatConfig::default(),
        };
        (Router::new().fallback(bridge_handler).with_state(state), destination)
    }

    #[tokio::test]
    async fn test_publishes_device_data() {
        let broker = MemoryBroker::new();
        let (app, destination) = router(broker.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/data/123")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"a":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());

        let messages = broker.messages(&destination);
        assert_eq!(messages.len(), 1);
        let envelope = Envelope::from_slice(&messages[0]).unwrap();
        assert_eq!(envelope.action, Action::IngestDeviceData);
        assert_eq!(envelope.body_bytes().unwrap(), br#"{"a":1}"#.to_vec());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_published() {
        let broker = MemoryBroker::new();
        let (app, destination) = router(broker.clone());

        let response = app
            .oneshot(Request::builder().method("POST").uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(broker.messages(&destination).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_not_published() {
        let broker = MemoryBroker::new();
        let (app, destination) = router(broker.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/data/1")
                    .header("content-type", "application/json")
                    .body(Body::from("{oops"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(broker.messages(&destination).is_empty());
    }
}
