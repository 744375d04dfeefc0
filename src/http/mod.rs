//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, drain)
//!     → request.rs (request ID, in-flight guard)
//!     → bridge.rs (route → envelope → publish)
//!     → response.rs (outcome → status)
//!     → Send to client
//! ```

pub mod bridge;
pub mod request;
pub mod response;
pub mod server;

pub use bridge::{bridge_handler, AppState};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
