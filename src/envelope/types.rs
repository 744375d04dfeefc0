//! Envelope wire type.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;
use uuid::Uuid;

use crate::routing::Action;

/// Errors raised while building or decoding envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The request body does not match its declared content type.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Serialization failure.
    #[error("envelope encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// A base64 body that does not decode.
    #[error("envelope body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// How the `body` field of an envelope is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// No body; `body` is null.
    None,
    /// Body is the request's JSON document, embedded verbatim.
    Json,
    /// Body is a base64 string of the request bytes.
    Base64,
}

/// Canonical representation of one inbound HTTP request.
///
/// This is the unit published to the broker. Field order is the
/// serialization order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-request identifier; consumers may dedupe on it.
    pub id: Uuid,
    /// Which gateway ingested the request.
    pub source: String,
    pub action: Action,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub host: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Header name → every value, in arrival order.
    pub headers: BTreeMap<String, Vec<String>>,
    pub body_encoding: BodyEncoding,
    pub body: Option<Box<RawValue>>,
}

impl Envelope {
    /// Serialize for publishing.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a published envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The original request body bytes.
    pub fn body_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let Some(raw) = self.body.as_ref() else {
            return Ok(Vec::new());
        };

        match self.body_encoding {
            BodyEncoding::None => Ok(Vec::new()),
            BodyEncoding::Json => Ok(raw.get().as_bytes().to_vec()),
            BodyEncoding::Base64 => {
                let encoded: String = serde_json::from_str(raw.get())?;
                Ok(STANDARD.decode(encoded)?)
            }
        }
    }

    /// All values of a header, matched case-insensitively.
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
