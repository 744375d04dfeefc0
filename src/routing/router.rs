//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for (method, path)
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) literal lookup via HashMap, checked before any parameterized pattern
//! - O(n) parameterized scan in registration order (first match wins)
//! - Explicit NoMatch rather than silent default

use std::collections::HashMap;

use axum::http::Method;

use crate::routing::action::{legacy_routes, Action};
use crate::routing::matcher::{PathParams, PathPattern};

/// A compiled route entry.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub action: Action,
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub action: Action,
    pub params: PathParams,
    /// The pattern that matched, for logging.
    pub pattern: String,
}

/// Static (method, pattern) → action table.
#[derive(Debug, Default)]
pub struct RouteTable {
    /// Patterns without parameters, by method then exact path.
    literals: HashMap<Method, HashMap<String, Action>>,
    /// Parameterized patterns in registration order.
    patterns: Vec<Route>,
}

impl RouteTable {
    /// Build a table from (method, pattern, action) triples.
    ///
    /// If the same literal (method, path) is registered twice the first
    /// registration is kept.
    pub fn new<P: Into<String>>(routes: impl IntoIterator<Item = (Method, P, Action)>) -> Self {
        let mut table = Self::default();

        for (method, pattern, action) in routes {
            let pattern = PathPattern::new(pattern);
            if pattern.is_literal() {
                table
                    .literals
                    .entry(method)
                    .or_default()
                    .entry(pattern.as_str().to_string())
                    .or_insert(action);
            } else {
                table.patterns.push(Route {
                    method,
                    pattern,
                    action,
                });
            }
        }

        tracing::debug!(
            literal_routes = table.literal_count(),
            parameterized_routes = table.patterns.len(),
            "Route table compiled"
        );

        table
    }

    /// The table with every legacy gateway path registered.
    pub fn legacy() -> Self {
        Self::new(legacy_routes())
    }

    /// Resolve a request to its canonical action.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        if let Some(action) = self.literals.get(method).and_then(|paths| paths.get(path)) {
            return Some(RouteMatch {
                action: *action,
                params: PathParams::new(),
                pattern: path.to_string(),
            });
        }

        self.patterns
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.pattern.matches(path).map(|params| RouteMatch {
                    action: route.action,
                    params,
                    pattern: route.pattern.to_string(),
                })
            })
    }

    fn literal_count(&self) -> usize {
        self.literals.values().map(HashMap::len).sum()
    }

    /// Total number of registered routes.
    pub fn len(&self) -> usize {
        self.literal_count() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
