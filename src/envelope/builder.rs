//! Request → envelope transformation.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, Uri};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::value::RawValue;
use uuid::Uuid;

use crate::envelope::types::{BodyEncoding, Envelope, EnvelopeError};
use crate::routing::RouteMatch;

/// Snapshot of an inbound request, fully buffered.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub id: Uuid,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Builds envelopes stamped with this gateway's source name.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    source: String,
}

impl EnvelopeBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Turn a request snapshot into an envelope.
    ///
    /// Fails with [`EnvelopeError::MalformedRequest`] when a body declared as
    /// JSON does not parse.
    pub fn build(
        &self,
        request: &InboundRequest,
        route: &RouteMatch,
    ) -> Result<Envelope, EnvelopeError> {
        let (body_encoding, body) = encode_body(&request.headers, &request.body)?;

        Ok(Envelope {
            id: request.id,
            source: self.source.clone(),
            action: route.action,
            method: request.method.as_str().to_string(),
            path: request.uri.path().to_string(),
            query: request.uri.query().map(str::to_string),
            host: request_host(request),
            params: route.params.clone(),
            headers: collect_headers(&request.headers),
            body_encoding,
            body,
        })
    }
}

fn request_host(request: &InboundRequest) -> String {
    request
        .headers
        .get(header::HOST)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .or_else(|| request.uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut collected = BTreeMap::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        collected.insert(name.as_str().to_string(), values);
    }
    collected
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE) else {
        return false;
    };
    let Ok(content_type) = content_type.to_str() else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

fn encode_body(
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<(BodyEncoding, Option<Box<RawValue>>), EnvelopeError> {
    if body.is_empty() {
        return Ok((BodyEncoding::None, None));
    }

    if is_json(headers) {
        let text = std::str::from_utf8(body)
            .map_err(|e| EnvelopeError::MalformedRequest(format!("body is not UTF-8: {e}")))?;
        let raw: Box<RawValue> = serde_json::from_str(text)
            .map_err(|e| EnvelopeError::MalformedRequest(format!("invalid JSON body: {e}")))?;

        // RawValue drops surrounding whitespace; keep those bodies byte-exact.
        if raw.get().len() == body.len() {
            return Ok((BodyEncoding::Json, Some(raw)));
        }
    }

    let encoded = serde_json::to_string(&STANDARD.encode(body))?;
    Ok((BodyEncoding::Base64, Some(RawValue::from_string(encoded)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Action, RouteTable};

    fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: &[u8]) -> InboundRequest {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(
                header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                header::HeaderValue::from_str(value).unwrap(),
            );
        }
        InboundRequest {
            id: Uuid::new_v4(),
            method,
            uri: uri.parse().unwrap(),
            headers: map,
            body: Bytes::copy_from_slice(body),
        }
    }

    fn build(req: &InboundRequest) -> Result<Envelope, EnvelopeError> {
        let route = RouteTable::legacy()
            .resolve(&req.method, req.uri.path())
            .unwrap();
        EnvelopeBuilder::new("api").build(req, &route)
    }

    #[test]
    fn test_device_data_scenario() {
        let req = request(
            Method::POST,
            "/data/123",
            &[("content-type", "application/json"), ("host", "gw.local")],
            br#"{"a":1}"#,
        );

        let envelope = build(&req).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();

        assert_eq!(json["source"], "api");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["path"], "/data/123");
        assert_eq!(json["host"], "gw.local");
        assert_eq!(json["action"], "ingest-device-data");
        assert_eq!(json["params"]["groupId"], "123");
        assert_eq!(json["body_encoding"], "json");
        assert_eq!(json["body"], serde_json::json!({"a": 1}));
        assert_eq!(json["headers"]["content-type"][0], "application/json");
    }

    #[test]
    fn test_json_body_bytes_survive() {
        let body = br#"{ "b" : [1, 2.50, "x"],  "a":{} }"#;
        let req = request(
            Method::POST,
            "/v1/datasets/ds1/data",
            &[("content-type", "application/vnd.api+json; charset=utf-8")],
            body,
        );

        let envelope = build(&req).unwrap();
        assert_eq!(envelope.body_encoding, BodyEncoding::Json);

        let decoded = Envelope::from_slice(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.body_bytes().unwrap(), body.to_vec());
    }

    #[test]
    fn test_padded_json_kept_exact() {
        let body = b"  {\"a\":1}\n";
        let req = request(Method::POST, "/data/1", &[("content-type", "application/json")], body);

        let envelope = build(&req).unwrap();
        assert_eq!(envelope.body_encoding, BodyEncoding::Base64);

        let decoded = Envelope::from_slice(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.body_bytes().unwrap(), body.to_vec());
    }

    #[test]
    fn test_binary_body_is_base64() {
        let body = [0u8, 159, 146, 150, 255, b'\n'];
        let req = request(
            Method::POST,
            "/v1/device/upload/cl",
            &[("content-type", "application/octet-stream")],
            &body,
        );

        let envelope = build(&req).unwrap();
        assert_eq!(envelope.action, Action::IngestCarelinkUpload);
        assert_eq!(envelope.body_encoding, BodyEncoding::Base64);

        let decoded = Envelope::from_slice(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.body_bytes().unwrap(), body.to_vec());
    }

    #[test]
    fn test_empty_body() {
        let req = request(Method::DELETE, "/v1/datasets/abc", &[], b"");

        let envelope = build(&req).unwrap();
        assert_eq!(envelope.body_encoding, BodyEncoding::None);
        assert!(envelope.body.is_none());
        assert!(envelope.body_bytes().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let req = request(
            Method::POST,
            "/data/123",
            &[("content-type", "application/json")],
            b"{\"a\":",
        );

        let err = build(&req).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedRequest(_)));
    }

    #[test]
    fn test_multi_valued_headers_preserved() {
        let req = request(
            Method::POST,
            "/data/123?debug=1",
            &[
                ("x-device", "pump"),
                ("x-device", "cgm"),
                ("X-Device", "meter"),
                ("content-type", "text/plain"),
            ],
            b"hello",
        );

        let envelope = build(&req).unwrap();
        assert_eq!(envelope.header_values("X-Device"), ["pump", "cgm", "meter"]);
        assert_eq!(envelope.query.as_deref(), Some("debug=1"));
        assert_eq!(envelope.path, "/data/123");
    }

    #[test]
    fn test_host_falls_back_to_authority() {
        let req = request(Method::POST, "http://upload.example:8080/data/9", &[], b"");
        let envelope = build(&req).unwrap();
        assert_eq!(envelope.host, "upload.example:8080");
    }

    #[test]
    fn test_build_is_deterministic() {
        let req = request(
            Method::PUT,
            "/v1/data_sets/x",
            &[("content-type", "application/json"), ("a", "1"), ("b", "2")],
            br#"{"k":"v"}"#,
        );

        let first = build(&req).unwrap().to_bytes().unwrap();
        let second = build(&req).unwrap().to_bytes().unwrap();
        assert_eq!(first, second);
    }
}
