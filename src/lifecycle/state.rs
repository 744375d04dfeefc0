//! Server lifecycle states.
//!
//! # State Transitions
//! ```text
//! Starting → Listening → Draining → Stopped
//! ```

use std::fmt;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Binding the listener.
    Starting,
    /// Accepting connections.
    Listening,
    /// Shutdown signalled, waiting for in-flight requests.
    Draining,
    /// Server loop finished.
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Starting => "starting",
            ServerState::Listening => "listening",
            ServerState::Draining => "draining",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Publishes the current state to any number of observers.
#[derive(Debug)]
pub struct StateTracker {
    tx: watch::Sender<ServerState>,
}

impl StateTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServerState::Starting);
        Self { tx }
    }

    pub fn set(&self, state: ServerState) {
        let previous = self.tx.send_replace(state);
        tracing::info!(from = %previous, to = %state, "Server state changed");
    }

    pub fn current(&self) -> ServerState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.tx.subscribe()
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_observers_see_transitions() {
        let tracker = StateTracker::new();
        let mut rx = tracker.subscribe();
        assert_eq!(*rx.borrow(), ServerState::Starting);

        tracker.set(ServerState::Listening);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ServerState::Listening);

        tracker.set(ServerState::Draining);
        tracker.set(ServerState::Stopped);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ServerState::Stopped);
        assert_eq!(tracker.current(), ServerState::Stopped);
    }
}
