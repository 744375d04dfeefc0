//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, partition >= 0)
//! - Check that the selected broker has the destination fields it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs once at startup, before any subsystem is built

use thiserror::Error;

use crate::config::schema::{BrokerKind, GatewayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("broker.brokers must list at least one address for {0:?}")]
    NoBrokers(BrokerKind),

    #[error("broker.{0} must not be empty")]
    EmptyDestination(&'static str),

    #[error("broker.partition must be >= 0, got {0}")]
    NegativePartition(i32),

    #[error("broker.num_partitions must be > 0, got {0}")]
    InvalidPartitionCount(i32),

    #[error("broker.replication_factor must be > 0, got {0}")]
    InvalidReplicationFactor(i16),

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("envelope.source must not be empty")]
    EmptySource,
}

/// Check the configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if config.timeouts.publish_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("publish_ms"));
    }
    if config.timeouts.drain_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("drain_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    let broker = &config.broker;
    match broker.kind {
        BrokerKind::Kafka => {
            if broker.brokers.is_empty() {
                errors.push(ValidationError::NoBrokers(broker.kind));
            }
            if broker.topic.is_empty() {
                errors.push(ValidationError::EmptyDestination("topic"));
            }
            if broker.partition < 0 {
                errors.push(ValidationError::NegativePartition(broker.partition));
            }
            if broker.num_partitions <= 0 {
                errors.push(ValidationError::InvalidPartitionCount(broker.num_partitions));
            }
            if broker.replication_factor <= 0 {
                errors.push(ValidationError::InvalidReplicationFactor(
                    broker.replication_factor,
                ));
            }
        }
        BrokerKind::Jetstream => {
            if broker.brokers.is_empty() {
                errors.push(ValidationError::NoBrokers(broker.kind));
            }
            if broker.stream.is_empty() {
                errors.push(ValidationError::EmptyDestination("stream"));
            }
            if broker.subject.is_empty() {
                errors.push(ValidationError::EmptyDestination("subject"));
            }
        }
        BrokerKind::Memory => {
            if broker.topic.is_empty() {
                errors.push(ValidationError::EmptyDestination("topic"));
            }
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.envelope.source.is_empty() {
        errors.push(ValidationError::EmptySource);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
