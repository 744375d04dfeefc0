//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Trigger graceful shutdown on the first one received
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered before the listener task starts, so a signal
//!   arriving right after startup is never lost
//! - Non-unix targets only get Ctrl+C

use std::io;

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// Registered shutdown signals.
pub struct SignalListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl SignalListener {
    /// Register handlers. Must be called inside a Tokio runtime.
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait until SIGINT or SIGTERM arrives; returns its name.
    pub async fn recv(&mut self) -> io::Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => Ok("SIGINT"),
                _ = self.terminate.recv() => Ok("SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            Ok("ctrl-c")
        }
    }
}

/// Register signal handlers, then spawn a task that triggers `shutdown` on
/// the first signal.
pub fn spawn_signal_listener(shutdown: Shutdown) -> io::Result<JoinHandle<&'static str>> {
    let mut signals = SignalListener::install()?;

    Ok(tokio::spawn(async move {
        let name = match signals.recv().await {
            Ok(name) => name,
            Err(e) => {
                tracing::error!(error = %e, "Signal stream failed; shutting down");
                "error"
            }
        };
        tracing::info!(signal = name, "Shutdown signal received");
        shutdown.trigger();
        name
    }))
}
