//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured host:port
//!     → listener.rs (bind, BindFailure is fatal)
//!     → axum serve loop
//!     → connection.rs (in-flight tracking for drain)
//! ```
//!
//! # Design Decisions
//! - Binding happens before anything else accepts traffic
//! - Each request tracked for graceful shutdown

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker, RequestSeq};
pub use listener::{bind, ListenerError};
