//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the ingestion gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Broker connection and destination settings.
    pub broker: BrokerConfig,

    /// Envelope settings.
    pub envelope: EnvelopeConfig,

    /// Compatibility switches for legacy clients.
    pub compat: CompatConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind.
    pub host: String,

    /// TCP port to bind. `0` picks an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` form used for binding and logging.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

/// Timeout configuration for the bridge and the lifecycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound on one broker publish (connect + write), in milliseconds.
    pub publish_ms: u64,

    /// Upper bound on the shutdown drain, in seconds.
    pub drain_secs: u64,

    /// Total time for one HTTP request/response, in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn publish(&self) -> Duration {
        Duration::from_millis(self.publish_ms)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            publish_ms: 10_000,
            drain_secs: 20,
            request_secs: 30,
        }
    }
}

/// Which broker client backs the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// Kafka topic partition, dialed per request.
    Kafka,
    /// NATS JetStream stream, one client for the process.
    Jetstream,
    /// In-process log, for local runs.
    Memory,
}

/// Broker connection and destination settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker client to use.
    pub kind: BrokerKind,

    /// Bootstrap addresses (`host:port` for Kafka, server URLs for JetStream).
    pub brokers: Vec<String>,

    /// Kafka topic.
    pub topic: String,

    /// Kafka partition.
    pub partition: i32,

    /// JetStream stream name.
    pub stream: String,

    /// JetStream subject the stream captures.
    pub subject: String,

    /// Create the destination at startup if it is missing.
    pub create_destination: bool,

    /// Partition count used when creating a Kafka topic.
    pub num_partitions: i32,

    /// Replication factor used when creating a Kafka topic.
    pub replication_factor: i16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            kind: BrokerKind::Kafka,
            brokers: vec!["kafka-kafka-bootstrap.kafka.svc.cluster.local:9092".to_string()],
            topic: "data".to_string(),
            partition: 0,
            stream: "foo-stream".to_string(),
            subject: "foo".to_string(),
            create_destination: true,
            num_partitions: 1,
            replication_factor: 1,
        }
    }
}

/// Envelope settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Value written to every envelope's `source` field.
    pub source: String,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            source: "api".to_string(),
        }
    }
}

/// Compatibility switches.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CompatConfig {
    /// Answer 200 with the error text when the broker is unreachable or
    /// rejects the write, as the first gateway deployment did.
    pub legacy_success_on_failure: bool,
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
