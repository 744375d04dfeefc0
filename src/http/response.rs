//! Response mapping.
//!
//! # Responsibilities
//! - Map delivery outcomes to HTTP status codes
//! - Map envelope errors to client or server errors
//!
//! # Design Decisions
//! - Success has an empty body
//! - Broker failures are 500 unless legacy masking is switched on

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::broker::DeliveryOutcome;
use crate::envelope::EnvelopeError;

/// Response for a finished publish.
pub fn delivery_response(outcome: &DeliveryOutcome, legacy_success_on_failure: bool) -> Response {
    match outcome {
        DeliveryOutcome::Delivered => StatusCode::OK.into_response(),
        failed if legacy_success_on_failure => (StatusCode::OK, failed.to_string()).into_response(),
        failed => (StatusCode::INTERNAL_SERVER_ERROR, failed.to_string()).into_response(),
    }
}

impl IntoResponse for EnvelopeError {
    fn into_response(self) -> Response {
        match self {
            EnvelopeError::MalformedRequest(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            other => {
                tracing::error!(error = %other, "Envelope encoding failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode request").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivered_is_ok() {
        let response = delivery_response(&DeliveryOutcome::Delivered, false);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_failures_are_server_errors() {
        for outcome in [
            DeliveryOutcome::Rejected("leader changed".into()),
            DeliveryOutcome::Unreachable("connection refused".into()),
        ] {
            let response = delivery_response(&outcome, false);
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_legacy_masking() {
        let response = delivery_response(&DeliveryOutcome::Unreachable("dial".into()), true);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_malformed_is_bad_request() {
        let response = EnvelopeError::MalformedRequest("bad json".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
