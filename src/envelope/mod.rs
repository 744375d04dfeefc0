//! Envelope subsystem.
//!
//! # Data Flow
//! ```text
//! Buffered request (method, uri, headers, body)
//!     → builder.rs (snapshot → Envelope, body classification)
//!     → types.rs (Envelope::to_bytes)
//!     → Broker publisher payload
//! ```
//!
//! # Design Decisions
//! - Pure transformation: no I/O, same snapshot gives the same bytes
//! - JSON bodies embedded verbatim, everything else base64
//! - Header values kept per name as ordered lists

pub mod builder;
pub mod types;

pub use builder::{EnvelopeBuilder, InboundRequest};
pub use types::{BodyEncoding, Envelope, EnvelopeError};
