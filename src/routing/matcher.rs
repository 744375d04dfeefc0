//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse `/literal/:param/...` patterns once at startup
//! - Match a concrete request path segment by segment
//! - Capture named parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Segment counts must be equal (no trailing wildcards)
//! - Parameter values are not validated beyond being non-empty
//! - No regex to guarantee O(n) matching

use std::collections::BTreeMap;
use std::fmt;

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern such as `/v1/datasets/:dataSetId/data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

/// Named parameters captured from a path, in pattern order of names.
pub type PathParams = BTreeMap<String, String>;

impl PathPattern {
    /// Compile a pattern. Segments starting with `:` are parameters.
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = split_path(&raw)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self { raw, segments }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern has no parameter segments.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// Match a concrete path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut parts = split_path(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(expected) => {
                    if part != expected {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split on `/`, dropping the leading empty segment of an absolute path.
fn split_path(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}
