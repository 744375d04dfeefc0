//! Kafka publisher, one connection per publish.
//!
//! Every publish bootstraps a client, looks up the partition leader, writes
//! one record and drops the client. Nothing is held between requests, so a
//! leader change or broker restart only affects the requests in flight.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use rskafka::client::error::{Error as KafkaError, ProtocolError};
use rskafka::client::partition::{Compression, UnknownTopicHandling};
use rskafka::client::{Client, ClientBuilder};
use rskafka::record::Record;
use rskafka::BackoffConfig;

use crate::broker::publisher::{BrokerError, DeliveryOutcome, Destination, Publisher};
use crate::config::BrokerConfig;

/// Publishes envelopes to a Kafka topic partition.
#[derive(Debug, Clone)]
pub struct KafkaPublisher {
    brokers: Vec<String>,
    num_partitions: i32,
    replication_factor: i16,
    setup_timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(config: &BrokerConfig, setup_timeout: Duration) -> Self {
        Self {
            brokers: config.brokers.clone(),
            num_partitions: config.num_partitions,
            replication_factor: config.replication_factor,
            setup_timeout,
        }
    }

    /// Dial the bootstrap brokers once. A refused or failed dial is returned
    /// immediately instead of being retried with backoff.
    async fn connect(&self) -> Result<Client, KafkaError> {
        ClientBuilder::new(self.brokers.clone())
            .backoff_config(no_retry())
            .build()
            .await
    }
}

fn no_retry() -> BackoffConfig {
    BackoffConfig {
        deadline: Some(Duration::ZERO),
        ..Default::default()
    }
}

fn protocol_error(err: &KafkaError) -> Option<&ProtocolError> {
    match err {
        KafkaError::ServerError { protocol_error, .. } => Some(protocol_error),
        _ => None,
    }
}

/// Broker-side errors are rejections; anything else means we never got a
/// usable answer from the broker.
fn outcome_for(protocol_error: Option<&ProtocolError>, reason: String) -> DeliveryOutcome {
    match protocol_error {
        Some(_) => DeliveryOutcome::Rejected(reason),
        None => DeliveryOutcome::Unreachable(reason),
    }
}

fn classify(err: KafkaError) -> DeliveryOutcome {
    outcome_for(protocol_error(&err), err.to_string())
}

/// A failed topic creation is still success when the topic already exists.
fn creation_failure(
    destination: &Destination,
    protocol_error: Option<&ProtocolError>,
    message: String,
) -> Result<(), BrokerError> {
    match protocol_error {
        Some(ProtocolError::TopicAlreadyExists) => {
            tracing::info!(destination = %destination, "Kafka topic already exists");
            Ok(())
        }
        _ => Err(BrokerError::Setup {
            destination: destination.to_string(),
            message,
        }),
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn ensure_destination(&self, destination: &Destination) -> Result<(), BrokerError> {
        let Destination::Partition { topic, .. } = destination else {
            return Err(BrokerError::UnsupportedDestination {
                publisher: self.name(),
                destination: destination.to_string(),
            });
        };

        let setup = async {
            let client = self.connect().await.map_err(|e| BrokerError::Connect(e.to_string()))?;
            let controller = client.controller_client().map_err(|e| BrokerError::Setup {
                destination: destination.to_string(),
                message: e.to_string(),
            })?;

            let timeout_ms = i32::try_from(self.setup_timeout.as_millis()).unwrap_or(i32::MAX);
            match controller
                .create_topic(topic.clone(), self.num_partitions, self.replication_factor, timeout_ms)
                .await
            {
                Ok(()) => {
                    tracing::info!(topic = %topic, partitions = self.num_partitions, "Kafka topic created");
                    Ok(())
                }
                Err(e) => creation_failure(destination, protocol_error(&e), e.to_string()),
            }
        };

        match tokio::time::timeout(self.setup_timeout, setup).await {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Connect(format!(
                "no answer from {:?} within {}ms",
                self.brokers,
                self.setup_timeout.as_millis()
            ))),
        }
    }

    async fn publish(
        &self,
        destination: &Destination,
        payload: Bytes,
        _deadline: Duration,
    ) -> DeliveryOutcome {
        let Destination::Partition { topic, partition } = destination else {
            return DeliveryOutcome::Rejected(format!(
                "kafka publisher cannot address {}",
                destination
            ));
        };

        let client = match self.connect().await {
            Ok(client) => client,
            Err(e) => return DeliveryOutcome::Unreachable(e.to_string()),
        };

        let partition_client = match client
            .partition_client(topic.clone(), *partition, UnknownTopicHandling::Error)
            .await
        {
            Ok(partition_client) => partition_client,
            Err(e) => return classify(e),
        };

        let record = Record {
            key: None,
            value: Some(payload.to_vec()),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };

        match partition_client
            .produce(vec![record], Compression::NoCompression)
            .await
        {
            Ok(offsets) => {
                tracing::trace!(destination = %destination, offsets = ?offsets, "Kafka record written");
                DeliveryOutcome::Delivered
            }
            Err(e) => classify(e),
        }
    }

    async fn close(&self) {
        // Connections never outlive a publish.
    }
}
