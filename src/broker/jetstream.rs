//! JetStream publisher, one client for the process.
//!
//! A replicated stream captures one subject; publishes go to the subject and
//! wait for the stream's acknowledgement. The client is shared by every
//! request task and relies on its own internal synchronization.

use std::time::Duration;

use async_nats::connection::State;
use async_nats::jetstream::context::{PublishError, PublishErrorKind};
use async_nats::jetstream::{self, stream};
use async_trait::async_trait;
use axum::body::Bytes;

use crate::broker::publisher::{BrokerError, DeliveryOutcome, Destination, Publisher};
use crate::config::BrokerConfig;

/// Publishes envelopes to a JetStream subject.
#[derive(Clone)]
pub struct JetStreamPublisher {
    client: async_nats::Client,
    context: jetstream::Context,
    timeout: Duration,
}

impl JetStreamPublisher {
    /// Connect to the configured servers.
    ///
    /// `timeout` bounds each connection attempt and each publish ack. An
    /// unreachable server does not fail startup; the client keeps retrying.
    pub async fn connect(config: &BrokerConfig, timeout: Duration) -> Result<Self, BrokerError> {
        let servers = config.brokers.join(",");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .retry_on_initial_connect()
            .event_callback(|event| async move {
                tracing::info!(event = %event, "NATS connection event");
            })
            .connect(servers.as_str())
            .await
            .map_err(|e| BrokerError::Connect(e.to_string()))?;

        let mut context = jetstream::new(client.clone());
        context.set_timeout(timeout);

        tracing::info!(servers = %servers, "JetStream client created");
        Ok(Self {
            client,
            context,
            timeout,
        })
    }
}

/// Lost or silent connections are unreachable; anything the server
/// answered with is a rejection.
fn outcome_for(kind: PublishErrorKind, reason: String) -> DeliveryOutcome {
    match kind {
        PublishErrorKind::TimedOut | PublishErrorKind::BrokenPipe => {
            DeliveryOutcome::Unreachable(reason)
        }
        _ => DeliveryOutcome::Rejected(reason),
    }
}

fn classify(err: PublishError) -> DeliveryOutcome {
    outcome_for(err.kind(), err.to_string())
}

#[async_trait]
impl Publisher for JetStreamPublisher {
    fn name(&self) -> &'static str {
        "jetstream"
    }

    async fn ensure_destination(&self, destination: &Destination) -> Result<(), BrokerError> {
        let Destination::Subject { stream, subject } = destination else {
            return Err(BrokerError::UnsupportedDestination {
                publisher: self.name(),
                destination: destination.to_string(),
            });
        };

        // get-or-create makes a second startup identical to the first
        self.context
            .get_or_create_stream(stream::Config {
                name: stream.clone(),
                subjects: vec![subject.clone()],
                ..Default::default()
            })
            .await
            .map_err(|e| BrokerError::Setup {
                destination: destination.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(stream = %stream, subject = %subject, "JetStream stream ready");
        Ok(())
    }

    async fn publish(
        &self,
        destination: &Destination,
        payload: Bytes,
        _deadline: Duration,
    ) -> DeliveryOutcome {
        let Destination::Subject { subject, .. } = destination else {
            return DeliveryOutcome::Rejected(format!(
                "jetstream publisher cannot address {}",
                destination
            ));
        };

        let ack = match self.context.publish(subject.clone(), payload).await {
            Ok(ack) => ack,
            Err(e) => return classify(e),
        };

        match ack.await {
            Ok(ack) => {
                tracing::trace!(stream = %ack.stream, sequence = ack.sequence, "JetStream ack");
                DeliveryOutcome::Delivered
            }
            Err(e) => classify(e),
        }
    }

    async fn close(&self) {
        // Nothing can be flushed to a server we never reached.
        let state = self.client.connection_state();
        if !matches!(state, State::Connected) {
            tracing::info!(state = ?state, "JetStream client closed without flush");
            return;
        }

        match tokio::time::timeout(self.timeout, self.client.flush()).await {
            Ok(Ok(())) => tracing::info!("JetStream client closed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "JetStream flush on close failed"),
            Err(_) => tracing::warn!(
                timeout_ms = self.timeout.as_millis() as u64,
                "JetStream flush on close timed out"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::publisher::publish_with_deadline;
    use crate::config::BrokerKind;
    use std::time::Instant;

    async fn dead_server_config() -> BrokerConfig {
        // Free port with nobody listening.
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let mut config = BrokerConfig::default();
        config.kind = BrokerKind::Jetstream;
        config.brokers = vec![format!("nats://{}", addr)];
        config
    }

    #[test]
    fn test_publish_error_kinds() {
        for kind in [PublishErrorKind::TimedOut, PublishErrorKind::BrokenPipe] {
            assert!(matches!(
                outcome_for(kind, "lost".into()),
                DeliveryOutcome::Unreachable(_)
            ));
        }
        for kind in [
            PublishErrorKind::StreamNotFound,
            PublishErrorKind::WrongLastSequence,
        ] {
            assert!(matches!(
                outcome_for(kind, "refused".into()),
                DeliveryOutcome::Rejected(_)
            ));
        }
    }

    #[tokio::test]
    async fn test_dead_server_does_not_block() {
        let config = dead_server_config().await;
        let publisher = JetStreamPublisher::connect(&config, Duration::from_millis(200))
            .await
            .unwrap();

        let start = Instant::now();
        let outcome = publish_with_deadline(
            &publisher,
            &Destination::from_config(&config),
            Bytes::from_static(b"{}"),
            Duration::from_millis(200),
        )
        .await;
        assert!(!outcome.is_delivered());
        assert!(start.elapsed() < Duration::from_secs(1));

        let closed = tokio::time::timeout(Duration::from_secs(2), publisher.close()).await;
        assert!(closed.is_ok(), "close blocked on an unreachable server");
    }

    #[tokio::test]
    async fn test_rejects_partition_destination() {
        let config = dead_server_config().await;
        let publisher = JetStreamPublisher::connect(&config, Duration::from_millis(100))
            .await
            .unwrap();

        let err = publisher
            .ensure_destination(&Destination::Partition {
                topic: "data".into(),
                partition: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::UnsupportedDestination { .. }));

        publisher.close().await;
    }
}
