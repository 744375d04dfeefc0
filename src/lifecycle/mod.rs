//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind listener → Connect publisher → Prepare destination
//!     → Start report drain → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! State (state.rs):
//!     Starting → Listening → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Bind failure is the only fatal startup error
//! - Ordered shutdown: stop accept, drain, stop reports, close publisher
//! - Drain has a timeout; overrun is reported, never a hang

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{Shutdown, ShutdownOutcome};
pub use signals::{spawn_signal_listener, SignalListener};
pub use startup::{Gateway, GatewayError};
pub use state::{ServerState, StateTracker};
