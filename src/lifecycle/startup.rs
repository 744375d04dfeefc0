//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener (the only fatal startup step)
//! - Connect the publisher and prepare the destination
//! - Start the delivery report drain before traffic arrives
//! - Run the HTTP server until shutdown, then tear down in order
//!
//! # Design Decisions
//! - Listener binds first, so a taken port fails before any broker dial
//! - Teardown order: server drain, report drain, publisher close

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::broker::{self, BrokerError, DeliveryTally, Destination, Publisher};
use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::{ServerState, Shutdown, ShutdownOutcome};
use crate::net::{self, InFlightTracker, ListenerError};

/// Errors that end the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Bind(#[from] ListenerError),

    #[error("Broker setup failed: {0}")]
    Broker(#[from] BrokerError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A running gateway.
pub struct Gateway {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    reports_stop: Shutdown,
    state: watch::Receiver<ServerState>,
    in_flight: InFlightTracker,
    publisher: Arc<dyn Publisher>,
    close_timeout: Duration,
    server: JoinHandle<std::io::Result<ShutdownOutcome>>,
    reports: JoinHandle<DeliveryTally>,
}

impl Gateway {
    /// Start with the publisher selected by `config.broker`.
    pub async fn start(config: GatewayConfig) -> Result<Self, GatewayError> {
        let listener = net::bind(&config.listener).await?;
        let publisher = broker::connect(&config.broker, config.timeouts.publish()).await?;
        Ok(Self::launch(config, listener, publisher).await?)
    }

    /// Start with an already-built publisher.
    pub async fn start_with_publisher(
        config: GatewayConfig,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self, GatewayError> {
        let listener = match net::bind(&config.listener).await {
            Ok(listener) => listener,
            Err(e) => {
                publisher.close().await;
                return Err(e.into());
            }
        };
        Ok(Self::launch(config, listener, publisher).await?)
    }

    async fn launch(
        config: GatewayConfig,
        listener: tokio::net::TcpListener,
        publisher: Arc<dyn Publisher>,
    ) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;

        let destination = Destination::from_config(&config.broker);
        broker::prepare_destination(
            publisher.as_ref(),
            &destination,
            config.broker.create_destination,
        )
        .await;

        let shutdown = Shutdown::new();

        // Reports outlive the HTTP drain so late publishes are still counted.
        let reports_stop = Shutdown::new();
        let (report_tx, report_drain) = broker::report_channel();
        let reports = tokio::spawn(report_drain.run(reports_stop.subscribe()));

        let server = HttpServer::new(&config, publisher.clone(), report_tx);
        let state = server.state();
        let in_flight = server.in_flight();
        let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

        tracing::info!(
            address = %local_addr,
            publisher = publisher.name(),
            destination = %destination,
            "Gateway started"
        );

        Ok(Self {
            local_addr,
            shutdown,
            reports_stop,
            state,
            in_flight,
            publisher,
            close_timeout: config.timeouts.publish(),
            server,
            reports,
        })
    }

    /// The bound address (useful when port 0 was requested).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that triggers shutdown when fired.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.clone()
    }

    pub fn in_flight(&self) -> InFlightTracker {
        self.in_flight.clone()
    }

    /// Wait for the server to stop, then finish teardown.
    ///
    /// Returns as soon as shutdown has been triggered and the drain finished
    /// or timed out. Closing the publisher is bounded by the publish timeout.
    pub async fn wait(self) -> Result<(ShutdownOutcome, DeliveryTally), GatewayError> {
        let served = self.server.await;

        self.shutdown.trigger();
        self.reports_stop.trigger();
        let tally = self.reports.await;
        if tokio::time::timeout(self.close_timeout, self.publisher.close())
            .await
            .is_err()
        {
            tracing::warn!(
                publisher = self.publisher.name(),
                timeout_ms = self.close_timeout.as_millis() as u64,
                "Publisher close timed out; exiting anyway"
            );
        }

        let outcome = served??;
        let tally = tally?;

        tracing::info!(
            outcome = ?outcome,
            delivered = tally.delivered,
            failed = tally.rejected + tally.unreachable,
            "Gateway stopped"
        );
        Ok((outcome, tally))
    }
}
