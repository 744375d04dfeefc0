//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup: literals first, then patterns)
//!     → matcher.rs (segment-by-segment match, capture params)
//!     → Return: RouteMatch { action, params } or NoMatch
//!
//! Route Compilation (at startup):
//!     action.rs legacy_routes()
//!     → Split literal vs parameterized patterns
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Many legacy spellings resolve to one canonical Action
//! - Deterministic: same input always matches same route
//! - Literal beats parameterized; then first registered wins

pub mod action;
pub mod matcher;
pub mod router;

pub use action::Action;
pub use matcher::{PathParams, PathPattern};
pub use router::{RouteMatch, RouteTable};
