//! The queue-drain processor.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use securecast_intake::{IntakeApi, IntakeError};
use securecast_ledger::LedgerApi;
use securecast_types::Identity;

/// Which ledger verb replication uses. Threaded explicitly through every
/// run; there is no process-wide update flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplicationMode {
    /// `POST /user/add`: the record is new to the ledger.
    Insert,
    /// `PUT /user/update`: the record re-registers an existing identity.
    Update,
}

impl ReplicationMode {
    fn verb(self) -> &'static str {
        match self {
            ReplicationMode::Insert => "add",
            ReplicationMode::Update => "update",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DrainConfig {
    /// Concurrent dequeue+replicate tasks per iteration. Bounds the load a
    /// drain pass puts on the ledger.
    pub batch_size: usize,

    /// Sleep before ending a run once the queue reports empty.
    pub idle_wait: Duration,

    /// Sleep after an iteration-level failure before continuing.
    pub error_backoff: Duration,

    /// Safety valve, not a semantic limit: a run never loops more than
    /// this many iterations.
    pub max_iterations: u64,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            idle_wait: Duration::from_secs(5),
            error_backoff: Duration::from_secs(5),
            max_iterations: 10_000,
        }
    }
}

/// Tally of one `run` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub iterations: u64,
    pub replicated: u64,
    /// Records dropped because the integrity check failed. Upstream
    /// redelivery is the queue's concern; this count keeps the loss visible.
    pub integrity_skipped: u64,
    /// Records lost to transport or ledger errors (after the transport
    /// layer's own retries).
    pub failed: u64,
    /// Iterations that failed before their batch could start.
    pub faulted_iterations: u64,
}

/// Outcome of one dequeue+replicate task.
enum RecordOutcome {
    Replicated,
    QueueEmpty,
    IntegritySkipped,
    Failed,
}

enum IterationOutcome {
    QueueIdle,
    BatchDone,
}

pub struct DrainProcessor {
    intake: Arc<dyn IntakeApi>,
    ledger: Arc<dyn LedgerApi>,
    config: DrainConfig,
}

impl DrainProcessor {
    pub fn new(
        intake: Arc<dyn IntakeApi>,
        ledger: Arc<dyn LedgerApi>,
        config: DrainConfig,
    ) -> Self {
        Self {
            intake,
            ledger,
            config,
        }
    }

    /// Drain the intake queue until it reports empty (or the iteration cap
    /// trips). Callers may reinvoke to resume.
    pub async fn run(&self, mode: ReplicationMode) -> DrainSummary {
        info!(mode = mode.verb(), "starting queue drain");
        let mut summary = DrainSummary::default();

        while summary.iterations < self.config.max_iterations {
            summary.iterations += 1;

            match self.iteration(mode, &mut summary).await {
                Ok(IterationOutcome::QueueIdle) => {
                    info!("intake queue is empty, ending drain run");
                    tokio::time::sleep(self.config.idle_wait).await;
                    break;
                }
                Ok(IterationOutcome::BatchDone) => {}
                Err(err) => {
                    summary.faulted_iterations += 1;
                    error!(error = %err, "drain iteration failed, backing off");
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }

        info!(
            iterations = summary.iterations,
            replicated = summary.replicated,
            integrity_skipped = summary.integrity_skipped,
            failed = summary.failed,
            "queue drain finished"
        );
        summary
    }

    /// One iteration: probe the queue, then fire a full batch and wait for
    /// it to settle. Only the metrics probe can fail an iteration; record
    /// failures are tallied, never raised.
    async fn iteration(
        &self,
        mode: ReplicationMode,
        summary: &mut DrainSummary,
    ) -> Result<IterationOutcome, IntakeError> {
        let metrics = self.intake.metrics().await?;
        if metrics.queue_size == 0 {
            return Ok(IterationOutcome::QueueIdle);
        }
        debug!(queue_size = metrics.queue_size, "draining batch");

        let batch = (0..self.config.batch_size).map(|_| self.replicate_one(mode));
        for outcome in join_all(batch).await {
            match outcome {
                RecordOutcome::Replicated => summary.replicated += 1,
                RecordOutcome::IntegritySkipped => summary.integrity_skipped += 1,
                RecordOutcome::Failed => summary.failed += 1,
                RecordOutcome::QueueEmpty => {}
            }
        }
        Ok(IterationOutcome::BatchDone)
    }

    /// Dequeue one record and, if the ledger attests integrity at this
    /// moment, replicate it with the mode's verb.
    ///
    /// The integrity report is fetched per record, not per batch: a ledger
    /// that corrupts mid-batch must not receive the rest of the batch.
    async fn replicate_one(&self, mode: ReplicationMode) -> RecordOutcome {
        let identity = match self.intake.dequeue().await {
            Ok(Some(identity)) => identity,
            Ok(None) => return RecordOutcome::QueueEmpty,
            Err(err) => {
                error!(error = %err, "dequeue failed");
                return RecordOutcome::Failed;
            }
        };

        let report = match self.ledger.verify_integrity().await {
            Ok(report) => report,
            Err(err) => {
                error!(email = %identity.email, error = %err, "integrity check unavailable, record not written");
                return RecordOutcome::Failed;
            }
        };
        if !report.intact {
            error!(
                email = %identity.email,
                message = %report.message,
                "ledger integrity failed, skipping record"
            );
            return RecordOutcome::IntegritySkipped;
        }

        self.write_record(mode, &identity).await
    }

    async fn write_record(&self, mode: ReplicationMode, identity: &Identity) -> RecordOutcome {
        let result = match mode {
            ReplicationMode::Insert => self.ledger.add(identity).await,
            ReplicationMode::Update => self.ledger.update(identity).await,
        };
        match result {
            Ok(message) => {
                info!(email = %identity.email, verb = mode.verb(), %message, "record replicated");
                RecordOutcome::Replicated
            }
            Err(err) => {
                error!(email = %identity.email, verb = mode.verb(), error = %err, "replication failed");
                RecordOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use securecast_nullables::{shared_journal, IntegrityStep, MetricsStep, NullIntake, NullLedger};

    fn fast_config(batch_size: usize) -> DrainConfig {
        DrainConfig {
            batch_size,
            idle_wait: Duration::from_millis(1),
            error_backoff: Duration::from_millis(1),
            max_iterations: 50,
        }
    }

    fn identity(email: &str) -> Identity {
        Identity::new("A", email, "addr", "0000", "Zg==")
    }

    fn processor(
        intake: &Arc<NullIntake>,
        ledger: &Arc<NullLedger>,
        batch_size: usize,
    ) -> DrainProcessor {
        DrainProcessor::new(intake.clone(), ledger.clone(), fast_config(batch_size))
    }

    #[tokio::test]
    async fn test_empty_queue_sleeps_without_dequeuing() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        intake.script_metrics([MetricsStep::Depth(0)]);

        let summary = processor(&intake, &ledger, 5)
            .run(ReplicationMode::Insert)
            .await;

        assert_eq!(summary.iterations, 1);
        assert_eq!(intake.dequeue_calls(), 0);
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_insert_mode_uses_create_verb() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        intake.preload([identity("a@x.com")]);

        let summary = processor(&intake, &ledger, 1)
            .run(ReplicationMode::Insert)
            .await;

        assert_eq!(summary.replicated, 1);
        assert!(ledger.calls().contains(&"ledger.add:a@x.com".to_string()));
        assert!(ledger.contains("a@x.com"));
    }

    #[tokio::test]
    async fn test_update_mode_uses_idempotent_verb() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        intake.preload([identity("a@x.com")]);

        let summary = processor(&intake, &ledger, 1)
            .run(ReplicationMode::Update)
            .await;

        assert_eq!(summary.replicated, 1);
        assert!(ledger
            .calls()
            .contains(&"ledger.update:a@x.com".to_string()));
        assert!(!ledger.calls().contains(&"ledger.add:a@x.com".to_string()));
    }

    #[tokio::test]
    async fn test_integrity_failure_skips_record_without_write() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        intake.preload([identity("a@x.com")]);
        ledger.script_integrity([IntegrityStep::Corrupted]);

        let summary = processor(&intake, &ledger, 1).run(ReplicationMode::Insert).await;

        assert_eq!(summary.integrity_skipped, 1);
        assert_eq!(summary.replicated, 0);
        assert!(!ledger.contains("a@x.com"));
        // The loop kept going after the skip: the next iteration probed
        // metrics again and found the queue empty.
        assert!(summary.iterations >= 2);
    }

    #[tokio::test]
    async fn test_integrity_checked_freshly_per_record() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        intake.preload([identity("a@x.com"), identity("b@x.com")]);
        ledger.script_integrity([IntegrityStep::Intact, IntegrityStep::Corrupted]);

        let summary = processor(&intake, &ledger, 2).run(ReplicationMode::Insert).await;

        assert_eq!(summary.replicated, 1);
        assert_eq!(summary.integrity_skipped, 1);
        let verifies = ledger
            .calls()
            .iter()
            .filter(|c| c.as_str() == "ledger.verify")
            .count();
        assert_eq!(verifies, 2);
    }

    #[tokio::test]
    async fn test_integrity_outage_counts_as_failure_not_skip() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        intake.preload([identity("a@x.com")]);
        ledger.script_integrity([IntegrityStep::Unreachable]);

        let summary = processor(&intake, &ledger, 1).run(ReplicationMode::Insert).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.integrity_skipped, 0);
        assert!(!ledger.contains("a@x.com"));
    }

    #[tokio::test]
    async fn test_metrics_outage_pauses_and_continues() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        intake.script_metrics([MetricsStep::Unreachable, MetricsStep::Depth(0)]);

        let summary = processor(&intake, &ledger, 5).run(ReplicationMode::Insert).await;

        assert_eq!(summary.faulted_iterations, 1);
        assert_eq!(summary.iterations, 2);
    }

    #[tokio::test]
    async fn test_batch_settles_before_next_metrics_probe() {
        let journal = shared_journal();
        let intake = Arc::new(NullIntake::with_journal(journal.clone()));
        let ledger = Arc::new(NullLedger::with_journal(journal.clone()));
        intake.preload([identity("a@x.com"), identity("b@x.com")]);

        processor(&intake, &ledger, 2).run(ReplicationMode::Insert).await;

        let entries = journal.lock().unwrap().clone();
        // Exactly two metrics probes: one before the batch, one after it
        // fully settled (finding the queue empty). Nothing interleaves a
        // batch entry after the second probe.
        let probe_positions: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.as_str() == "intake.metrics")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(probe_positions.len(), 2);
        assert_eq!(*probe_positions.last().unwrap(), entries.len() - 1);
    }

    #[tokio::test]
    async fn test_iteration_cap_bounds_the_run() {
        let intake = Arc::new(NullIntake::new());
        let ledger = Arc::new(NullLedger::new());
        // The queue keeps claiming depth but never hands out records.
        intake.script_metrics((0..60).map(|_| MetricsStep::Depth(1)));

        let config = DrainConfig {
            max_iterations: 3,
            ..fast_config(1)
        };
        let summary = DrainProcessor::new(intake.clone(), ledger.clone(), config)
            .run(ReplicationMode::Insert)
            .await;

        assert_eq!(summary.iterations, 3);
    }
}
