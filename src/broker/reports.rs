//! Delivery report drain.
//!
//! Request handlers send one [`DeliveryReport`] per publish. A single task
//! consumes them for the whole process lifetime, logging failures and
//! feeding metrics, and stops when the shutdown broadcast fires.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::broker::publisher::DeliveryOutcome;
use crate::observability::metrics;
use crate::routing::Action;

/// What happened to one published envelope.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub request_id: Uuid,
    pub action: Action,
    pub destination: String,
    pub outcome: DeliveryOutcome,
    pub elapsed: Duration,
}

/// Counts of outcomes seen by the drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTally {
    pub delivered: u64,
    pub rejected: u64,
    pub unreachable: u64,
}

impl DeliveryTally {
    pub fn total(&self) -> u64 {
        self.delivered + self.rejected + self.unreachable
    }

    fn record(&mut self, report: &DeliveryReport) {
        match &report.outcome {
            DeliveryOutcome::Delivered => {
                self.delivered += 1;
                tracing::debug!(
                    request_id = %report.request_id,
                    action = %report.action,
                    destination = %report.destination,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Envelope delivered"
                );
            }
            DeliveryOutcome::Rejected(reason) => {
                self.rejected += 1;
                tracing::warn!(
                    request_id = %report.request_id,
                    action = %report.action,
                    destination = %report.destination,
                    reason = %reason,
                    "Envelope rejected by broker"
                );
            }
            DeliveryOutcome::Unreachable(reason) => {
                self.unreachable += 1;
                tracing::warn!(
                    request_id = %report.request_id,
                    action = %report.action,
                    destination = %report.destination,
                    reason = %reason,
                    "Broker unreachable"
                );
            }
        }
        metrics::record_publish(report.outcome.label(), report.elapsed);
    }
}

/// Handle used by request tasks to submit reports.
#[derive(Debug, Clone)]
pub struct ReportSender {
    tx: mpsc::UnboundedSender<DeliveryReport>,
}

impl ReportSender {
    /// Submit a report. Reports sent after the drain stopped are dropped.
    pub fn send(&self, report: DeliveryReport) {
        if self.tx.send(report).is_err() {
            tracing::trace!("Delivery report dropped: drain stopped");
        }
    }
}

/// Receiving side, run as a background task.
#[derive(Debug)]
pub struct ReportDrain {
    rx: mpsc::UnboundedReceiver<DeliveryReport>,
}

/// Create a connected sender/drain pair.
pub fn report_channel() -> (ReportSender, ReportDrain) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReportSender { tx }, ReportDrain { rx })
}

impl ReportDrain {
    /// Consume reports until shutdown, then flush whatever is queued.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> DeliveryTally {
        let mut tally = DeliveryTally::default();
        tracing::debug!("Delivery report drain started");

        loop {
            tokio::select! {
                Some(report) = self.rx.recv() => tally.record(&report),
                _ = shutdown.recv() => break,
            }
        }

        self.rx.close();
        while let Ok(report) = self.rx.try_recv() {
            tally.record(&report);
        }

        tracing::info!(
            delivered = tally.delivered,
            rejected = tally.rejected,
            unreachable = tally.unreachable,
            "Delivery report drain stopped"
        );
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    fn report(outcome: DeliveryOutcome) -> DeliveryReport {
        DeliveryReport {
            request_id: Uuid::new_v4(),
            action: Action::IngestDeviceData,
            destination: "data/0".into(),
            outcome,
            elapsed: Duration::from_millis(3),
        }
    }

    #[tokio::test]
    async fn test_drain_counts_until_shutdown() {
        let shutdown = Shutdown::new();
        let (sender, drain) = report_channel();
        let handle = tokio::spawn(drain.run(shutdown.subscribe()));

        sender.send(report(DeliveryOutcome::Delivered));
        sender.send(report(DeliveryOutcome::Delivered));
        sender.send(report(DeliveryOutcome::Rejected("partition error".into())));
        sender.send(report(DeliveryOutcome::Unreachable("refused".into())));

        shutdown.trigger();
        let tally = handle.await.unwrap();

        assert_eq!(tally.delivered, 2);
        assert_eq!(tally.rejected, 1);
        assert_eq!(tally.unreachable, 1);
        assert_eq!(tally.total(), 4);
    }

    #[tokio::test]
    async fn test_send_after_stop_is_harmless() {
        let shutdown = Shutdown::new();
        let (sender, drain) = report_channel();
        let handle = tokio::spawn(drain.run(shutdown.subscribe()));

        shutdown.trigger();
        assert_eq!(handle.await.unwrap().total(), 0);

        sender.send(report(DeliveryOutcome::Delivered));
    }
}
