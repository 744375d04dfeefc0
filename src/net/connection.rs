//! In-flight request tracking.
//!
//! # Responsibilities
//! - Generate unique request sequence numbers for tracing
//! - Count requests currently being handled
//! - Report the count when draining starts

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Global atomic counter for request sequence numbers.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static REQUEST_SEQ_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-local sequence number of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestSeq(u64);

impl RequestSeq {
    /// Generate a new unique sequence number.
    pub fn next() -> Self {
        Self(REQUEST_SEQ_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Tracks requests in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active_count: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new request. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_in_flight(count);
        InFlightGuard {
            active_count: Arc::clone(&self.active_count),
            seq: RequestSeq::next(),
        }
    }

    /// Current number of requests in flight.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard held for the lifetime of one request.
/// Decrements the in-flight count when dropped, including on panic or
/// when the task is abandoned at drain timeout.
#[derive(Debug)]
pub struct InFlightGuard {
    active_count: Arc<AtomicU64>,
    seq: RequestSeq,
}

impl InFlightGuard {
    pub fn seq(&self) -> RequestSeq {
        self.seq
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let count = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_in_flight(count);
        tracing::trace!(seq = %self.seq, "Request finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_seq_unique() {
        let a = RequestSeq::next();
        let b = RequestSeq::next();
        assert_ne!(a, b);
        assert!(b.to_string().starts_with("req-"));
    }

    #[test]
    fn in_flight_tracker_counts() {
        let tracker = InFlightTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.seq(), guard2.seq());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }
}
