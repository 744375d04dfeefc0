//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the bridge handler
//! - Wire up middleware (tracing, limits, request ID, in-flight tracking)
//! - Serve on a bound listener
//! - Drain in-flight requests on shutdown, bounded by the drain timeout

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot, watch};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::broker::{Destination, Publisher, ReportSender};
use crate::config::GatewayConfig;
use crate::envelope::EnvelopeBuilder;
use crate::http::bridge::{bridge_handler, AppState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, track_in_flight};
use crate::lifecycle::{ServerState, ShutdownOutcome, StateTracker};
use crate::net::InFlightTracker;
use crate::routing::RouteTable;

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    drain_timeout: Duration,
    in_flight: InFlightTracker,
    state: StateTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and publisher.
    pub fn new(config: &GatewayConfig, publisher: Arc<dyn Publisher>, reports: ReportSender) -> Self {
        let routes = Arc::new(RouteTable::legacy());
        let destination = Arc::new(Destination::from_config(&config.broker));

        tracing::info!(
            routes = routes.len(),
            destination = %destination,
            publisher = publisher.name(),
            "Bridge configured"
        );

        let app_state = AppState {
            routes,
            envelopes: EnvelopeBuilder::new(config.envelope.source.clone()),
            publisher,
            destination,
            publish_deadline: config.timeouts.publish(),
            reports,
            compat: config.compat.clone(),
        };

        let in_flight = InFlightTracker::new();
        let router = Self::build_router(config, app_state, in_flight.clone());

        Self {
            router,
            drain_timeout: config.timeouts.drain(),
            in_flight,
            state: StateTracker::new(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, in_flight: InFlightTracker) -> Router {
        Router::new()
            .fallback(bridge_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(middleware::from_fn_with_state(in_flight, track_in_flight))
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// Observe lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Handle to the in-flight request counter.
    pub fn in_flight(&self) -> InFlightTracker {
        self.in_flight.clone()
    }

    /// Run the server until `shutdown` fires, then drain.
    ///
    /// Returns [`ShutdownOutcome::TimedOut`] when in-flight requests outlive
    /// the drain timeout; those requests are abandoned.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<ShutdownOutcome, io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let serve = axum::serve(listener, self.router).with_graceful_shutdown(async move {
            let _ = drain_rx.await;
        });
        let mut server = tokio::spawn(async move { serve.await });
        self.state.set(ServerState::Listening);

        tokio::select! {
            joined = &mut server => {
                // Serve loop ended without a shutdown signal.
                self.state.set(ServerState::Stopped);
                return match joined {
                    Ok(result) => result.map(|()| ShutdownOutcome::Drained),
                    Err(e) => Err(io::Error::other(e)),
                };
            }
            _ = shutdown.recv() => {}
        }

        self.state.set(ServerState::Draining);
        tracing::info!(
            in_flight = self.in_flight.active_count(),
            drain_timeout_secs = self.drain_timeout.as_secs_f64(),
            "Draining in-flight requests"
        );
        let _ = drain_tx.send(());

        let outcome = match tokio::time::timeout(self.drain_timeout, &mut server).await {
            Ok(Ok(Ok(()))) => ShutdownOutcome::Drained,
            Ok(Ok(Err(e))) => {
                self.state.set(ServerState::Stopped);
                return Err(e);
            }
            Ok(Err(e)) => {
                self.state.set(ServerState::Stopped);
                return Err(io::Error::other(e));
            }
            Err(_) => {
                server.abort();
                let abandoned = self.in_flight.active_count();
                tracing::error!(
                    abandoned,
                    drain_timeout_secs = self.drain_timeout.as_secs_f64(),
                    "Drain timed out; abandoning in-flight requests"
                );
                ShutdownOutcome::TimedOut {
                    timeout: self.drain_timeout,
                    abandoned,
                }
            }
        };

        self.state.set(ServerState::Stopped);
        tracing::info!(outcome = ?outcome, "HTTP server stopped");
        Ok(outcome)
    }
}
