//! Publisher capability and delivery outcomes.
//!
//! # Responsibilities
//! - Name a broker destination (topic partition or stream subject)
//! - Define the capability every broker client offers
//! - Bound every publish by a deadline
//!
//! # Design Decisions
//! - One message per publish, never retried here
//! - Deadline expiry is reported as `Unreachable`
//! - Dropping the publish future releases whatever connection it held

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

use crate::config::{BrokerConfig, BrokerKind};

/// Errors from broker setup (not from individual publishes).
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Could not reach the broker.
    #[error("broker connect failed: {0}")]
    Connect(String),

    /// Destination could not be created or looked up.
    #[error("destination setup failed for {destination}: {message}")]
    Setup { destination: String, message: String },

    /// Publisher used with a destination shape it does not support.
    #[error("{publisher} publisher cannot address {destination}")]
    UnsupportedDestination {
        publisher: &'static str,
        destination: String,
    },
}

/// A broker-addressable target for a publish.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Kafka-style topic partition.
    Partition { topic: String, partition: i32 },
    /// Stream-style destination: a stream capturing one subject.
    Subject { stream: String, subject: String },
}

impl Destination {
    /// Resolve the process-wide destination from configuration.
    pub fn from_config(config: &BrokerConfig) -> Self {
        match config.kind {
            BrokerKind::Kafka | BrokerKind::Memory => Destination::Partition {
                topic: config.topic.clone(),
                partition: config.partition,
            },
            BrokerKind::Jetstream => Destination::Subject {
                stream: config.stream.clone(),
                subject: config.subject.clone(),
            },
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Partition { topic, partition } => write!(f, "{}/{}", topic, partition),
            Destination::Subject { stream, subject } => write!(f, "{}:{}", stream, subject),
        }
    }
}

/// Result of one publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The broker acknowledged the write.
    Delivered,
    /// The broker was reached but refused the write.
    Rejected(String),
    /// The broker could not be reached in time.
    Unreachable(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Rejected(_) => "rejected",
            DeliveryOutcome::Unreachable(_) => "unreachable",
        }
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Delivered => f.write_str("delivered"),
            DeliveryOutcome::Rejected(reason) => write!(f, "broker rejected message: {}", reason),
            DeliveryOutcome::Unreachable(reason) => write!(f, "broker unreachable: {}", reason),
        }
    }
}

/// Capability shared by every broker client.
///
/// Implementations must be safe to call from many request tasks at once
/// without external locking.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Client name for logs.
    fn name(&self) -> &'static str;

    /// Make sure the destination exists. Called once at startup; an
    /// existing destination is success.
    async fn ensure_destination(&self, destination: &Destination) -> Result<(), BrokerError>;

    /// Write exactly one message.
    ///
    /// `deadline` is the budget for the whole call; implementations may use
    /// it to size their own timeouts but callers go through
    /// [`publish_with_deadline`] for the hard bound.
    async fn publish(
        &self,
        destination: &Destination,
        payload: Bytes,
        deadline: Duration,
    ) -> DeliveryOutcome;

    /// Release long-lived connections. Called once at shutdown.
    async fn close(&self);
}

/// Publish with a hard upper bound on blocking time.
pub async fn publish_with_deadline(
    publisher: &dyn Publisher,
    destination: &Destination,
    payload: Bytes,
    deadline: Duration,
) -> DeliveryOutcome {
    match tokio::time::timeout(deadline, publisher.publish(destination, payload, deadline)).await {
        Ok(outcome) => outcome,
        Err(_) => DeliveryOutcome::Unreachable(format!(
            "publish deadline of {}ms exceeded",
            deadline.as_millis()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct Stalled;

    #[async_trait]
    impl Publisher for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn ensure_destination(&self, _: &Destination) -> Result<(), BrokerError> {
            Ok(())
        }

        async fn publish(&self, _: &Destination, _: Bytes, _: Duration) -> DeliveryOutcome {
            std::future::pending().await
        }

        async fn close(&self) {}
    }

    #[test]
    fn test_destination_from_config() {
        let mut config = BrokerConfig::default();
        assert_eq!(Destination::from_config(&config).to_string(), "data/0");

        config.kind = BrokerKind::Jetstream;
        assert_eq!(
            Destination::from_config(&config),
            Destination::Subject {
                stream: "foo-stream".into(),
                subject: "foo".into()
            }
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert!(DeliveryOutcome::Delivered.is_delivered());
        assert_eq!(DeliveryOutcome::Rejected("x".into()).label(), "rejected");
        assert_eq!(
            DeliveryOutcome::Unreachable("refused".into()).to_string(),
            "broker unreachable: refused"
        );
    }

    #[tokio::test]
    async fn test_deadline_bounds_stalled_publish() {
        let destination = Destination::Partition {
            topic: "data".into(),
            partition: 0,
        };

        let start = Instant::now();
        let outcome = publish_with_deadline(
            &Stalled,
            &destination,
            Bytes::from_static(b"{}"),
            Duration::from_millis(200),
        )
        .await;

        assert!(matches!(outcome, DeliveryOutcome::Unreachable(_)));
        assert!(start.elapsed() < Duration::from_millis(400));
    }
}
