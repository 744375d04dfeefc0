//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve and bind the configured `host:port`
//! - Turn bind problems into the one fatal startup error
//!
//! # Design Decisions
//! - Host names are resolved by Tokio, so `localhost` works as in the
//!   legacy deployment
//! - No admission control: every accepted connection is served

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let address = config.bind_address();

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ListenerError::Bind {
            address: address.clone(),
            source,
        })?;

    let local_addr = listener.local_addr().map_err(|source| ListenerError::Bind {
        address: address.clone(),
        source,
    })?;

    tracing::info!(
        address = %local_addr,
        "Listener bound"
    );

    Ok(listener)
}
