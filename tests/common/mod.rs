//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;

use ingest_gateway::broker::{BrokerError, DeliveryOutcome, Destination, MemoryBroker, Publisher};
use ingest_gateway::config::{BrokerKind, GatewayConfig};
use ingest_gateway::Gateway;

/// Config bound to an ephemeral loopback port with the memory broker.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.broker.kind = BrokerKind::Memory;
    config.timeouts.publish_ms = 1_000;
    config.timeouts.drain_secs = 5;
    config
}

/// Destination the default config publishes to.
pub fn data_destination() -> Destination {
    Destination::Partition {
        topic: "data".into(),
        partition: 0,
    }
}

pub async fn start(config: GatewayConfig, publisher: Arc<dyn Publisher>) -> Gateway {
    Gateway::start_with_publisher(config, publisher)
        .await
        .expect("gateway failed to start")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn url(gateway: &Gateway, path: &str) -> String {
    format!("http://{}{}", gateway.local_addr(), path)
}

/// Poll until `gateway` reports `count` requests in flight.
pub async fn wait_for_in_flight(gateway: &Gateway, count: u64) {
    let tracker = gateway.in_flight();
    tokio::time::timeout(Duration::from_secs(5), async {
        while tracker.active_count() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("requests never became in-flight");
}

/// Never answers; only the deadline ends a publish.
pub struct StalledPublisher;

#[async_trait]
impl Publisher for StalledPublisher {
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

/// Refuses every write the way a broker with a missing partition would.
pub struct RejectingPublisher;

#[async_trait]
impl Publisher for RejectingPublisher {
    fn name(&self) -> &'static str {
        "rejecting"
    }

    async fn ensure_destination(&self, _: &Destination) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn publish(&self, _: &Destination, _: Bytes, _: Duration) -> DeliveryOutcome {
        DeliveryOutcome::Rejected("unknown topic or partition".into())
    }

    async fn close(&self) {}
}

/// Takes `delay` per publish, then stores into a memory broker.
pub struct SlowPublisher {
    pub delay: Duration,
    pub inner: MemoryBroker,
}

#[async_trait]
impl Publisher for SlowPublisher {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn ensure_destination(&self, destination: &Destination) -> Result<(), BrokerError> {
        self.inner.ensure_destination(destination).await
    }

    async fn publish(
        &self,
        destination: &Destination,
        payload: Bytes,
        deadline: Duration,
    ) -> DeliveryOutcome {
        tokio::time::sleep(self.delay).await;
        self.inner.publish(destination, payload, deadline).await
    }

    async fn close(&self) {}
}

/// Delivers normally but never finishes closing, like a client stuck
/// flushing to a server that went away.
pub struct StuckClosePublisher {
    pub inner: MemoryBroker,
}

#[async_trait]
impl Publisher for StuckClosePublisher {
    fn name(&self) -> &'static str {
        "stuck-close"
    }

    async fn ensure_destination(&self, destination: &Destination) -> Result<(), BrokerError> {
        self.inner.ensure_destination(destination).await
    }

    async fn publish(
        &self,
        destination: &Destination,
        payload: Bytes,
        deadline: Duration,
    ) -> DeliveryOutcome {
        self.inner.publish(destination, payload, deadline).await
    }

    async fn close(&self) {
        std::future::pending().await
    }
}
