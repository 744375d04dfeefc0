//! HTTP ingestion gateway.
//!
//! Accepts requests on legacy URL shapes and republishes each one as a single
//! envelope onto a Kafka partition or a JetStream subject.

pub mod broker;
pub mod config;
pub mod envelope;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::{Gateway, GatewayError, Shutdown, ShutdownOutcome};
