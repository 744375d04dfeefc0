//! In-process broker for local runs and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::broker::publisher::{BrokerError, DeliveryOutcome, Destination, Publisher};

/// Append-only log per destination, kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    logs: Arc<Mutex<HashMap<Destination, Vec<Bytes>>>>,
    created: Arc<Mutex<HashSet<Destination>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages written to a destination, in append order.
    pub fn messages(&self, destination: &Destination) -> Vec<Bytes> {
        self.logs
            .lock()
            .expect("memory broker mutex poisoned")
            .get(destination)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `ensure_destination` has been called for this destination.
    pub fn has_destination(&self, destination: &Destination) -> bool {
        self.created
            .lock()
            .expect("memory broker mutex poisoned")
            .contains(destination)
    }
}

#[async_trait]
impl Publisher for MemoryBroker {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_destination(&self, destination: &Destination) -> Result<(), BrokerError> {
        let inserted = self
            .created
            .lock()
            .expect("memory broker mutex poisoned")
            .insert(destination.clone());
        if !inserted {
            tracing::debug!(destination = %destination, "Destination already exists");
        }
        Ok(())
    }

    async fn publish(
        &self,
        destination: &Destination,
        payload: Bytes,
        _deadline: Duration,
    ) -> DeliveryOutcome {
        self.logs
            .lock()
            .expect("memory broker mutex poisoned")
            .entry(destination.clone())
            .or_default()
            .push(payload);
        DeliveryOutcome::Delivered
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination() -> Destination {
        Destination::Partition {
            topic: "data".into(),
            partition: 0,
        }
    }

    #[tokio::test]
    async fn test_publish_appends_in_order() {
        let broker = MemoryBroker::new();
        for i in 0..3 {
            let outcome = broker
                .publish(&destination(), Bytes::from(format!("m{}", i)), Duration::from_secs(1))
                .await;
            assert!(outcome.is_delivered());
        }

        let messages = broker.messages(&destination());
        assert_eq!(messages, vec![Bytes::from("m0"), Bytes::from("m1"), Bytes::from("m2")]);
    }

    #[tokio::test]
    async fn test_ensure_destination_is_idempotent() {
        let broker = MemoryBroker::new();
        broker.ensure_destination(&destination()).await.unwrap();
        broker.ensure_destination(&destination()).await.unwrap();
        assert!(broker.has_destination(&destination()));
    }
}
