//! ingest-gateway
//!
//! Republishes inbound HTTP requests onto a distributed log.
//!
//! ```text
//!   Client ──HTTP──▶ listener ─▶ route table ─▶ envelope ─▶ publisher ──▶ Kafka / JetStream
//!                                                               │
//!   Client ◀─ 200 / 4xx / 500 ◀───────────── outcome ◀──────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ingest_gateway::config::loader::{finalize, read_config};
use ingest_gateway::config::GatewayConfig;
use ingest_gateway::lifecycle::{spawn_signal_listener, Gateway, GatewayError};
use ingest_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ingest-gateway")]
#[command(about = "HTTP to Kafka / JetStream ingestion gateway", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen host, overrides the file.
    #[arg(long, env = "GATEWAY_HOST")]
    host: Option<String>,

    /// Listen port, overrides the file.
    #[arg(short, long, env = "GATEWAY_PORT")]
    port: Option<u16>,
}

fn load(cli: &Cli) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };

    if let Some(host) = &cli.host {
        config.listener.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    Ok(finalize(config)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ingest-gateway: configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ingest-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        broker = ?config.broker.kind,
        publish_timeout_ms = config.timeouts.publish_ms,
        drain_timeout_secs = config.timeouts.drain_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = match Gateway::start(config).await {
        Ok(gateway) => gateway,
        Err(e @ GatewayError::Bind(_)) => {
            tracing::error!(error = %e, "Bind failure");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = spawn_signal_listener(gateway.shutdown_handle()) {
        tracing::error!(error = %e, "Failed to install signal handlers; shutting down");
        gateway.shutdown_handle().trigger();
    }

    match gateway.wait().await {
        Ok((outcome, _)) => {
            tracing::info!("Shutdown complete");
            outcome.exit_code()
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
