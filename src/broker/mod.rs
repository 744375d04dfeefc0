//! Broker publishing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     BrokerConfig
//!     → connect()            (pick Kafka / JetStream / memory client)
//!     → ensure_destination() (create once, "already exists" is fine)
//!     → Arc<dyn Publisher> injected into the HTTP state
//!
//! Per request:
//!     envelope bytes
//!     → publish_with_deadline() (hard bound on connect + write)
//!     → DeliveryOutcome
//!     → reports.rs (background drain logs and counts outcomes)
//! ```
//!
//! # Design Decisions
//! - One capability trait; the client is picked at configuration time
//! - Kafka dials per publish, JetStream shares one client
//! - No retries: each request gets at most one delivery attempt

pub mod jetstream;
pub mod kafka;
pub mod memory;
pub mod publisher;
pub mod reports;

use std::sync::Arc;
use std::time::Duration;

pub use jetstream::JetStreamPublisher;
pub use kafka::KafkaPublisher;
pub use memory::MemoryBroker;
pub use publisher::{publish_with_deadline, BrokerError, DeliveryOutcome, Destination, Publisher};
pub use reports::{report_channel, DeliveryReport, DeliveryTally, ReportDrain, ReportSender};

use crate::config::{BrokerConfig, BrokerKind};

/// Build the publisher selected by configuration.
///
/// `timeout` bounds any connection made here.
pub async fn connect(
    config: &BrokerConfig,
    timeout: Duration,
) -> Result<Arc<dyn Publisher>, BrokerError> {
    let publisher: Arc<dyn Publisher> = match config.kind {
        BrokerKind::Kafka => Arc::new(KafkaPublisher::new(config, timeout)),
        BrokerKind::Jetstream => Arc::new(JetStreamPublisher::connect(config, timeout).await?),
        BrokerKind::Memory => Arc::new(MemoryBroker::new()),
    };

    tracing::info!(
        publisher = publisher.name(),
        brokers = ?config.brokers,
        "Broker publisher ready"
    );
    Ok(publisher)
}

/// Create the destination if configured to. Failures are logged and
/// startup continues; requests will report the problem individually.
pub async fn prepare_destination(
    publisher: &dyn Publisher,
    destination: &Destination,
    create: bool,
) {
    if !create {
        return;
    }

    match publisher.ensure_destination(destination).await {
        Ok(()) => tracing::info!(destination = %destination, "Destination ready"),
        Err(e) => tracing::warn!(
            destination = %destination,
            error = %e,
            "Could not prepare destination; continuing"
        ),
    }
}
