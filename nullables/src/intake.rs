//! Nullable intake queue: an in-memory VecDeque with scriptable metrics.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use securecast_client::ClientError;
use securecast_intake::{IntakeApi, IntakeError};
use securecast_types::{Identity, QueueMetrics};

use crate::journal::{record, Journal};

/// One scripted answer for `metrics`. When the script runs out, the real
/// queue depth is reported.
#[derive(Clone, Copy, Debug)]
pub enum MetricsStep {
    Depth(u64),
    Unreachable,
}

#[derive(Default)]
pub struct NullIntake {
    queue: Mutex<VecDeque<Identity>>,
    metrics_script: Mutex<VecDeque<MetricsStep>>,
    journal: Option<Journal>,
    calls: Mutex<Vec<String>>,
}

impl NullIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    /// Stage records as if registrations had been submitted.
    pub fn preload(&self, identities: impl IntoIterator<Item = Identity>) {
        self.queue.lock().unwrap().extend(identities);
    }

    /// Queue metrics answers, consumed one per `metrics` call.
    pub fn script_metrics(&self, steps: impl IntoIterator<Item = MetricsStep>) {
        self.metrics_script.lock().unwrap().extend(steps);
    }

    pub fn depth(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of dequeue calls received so far.
    pub fn dequeue_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.as_str() == "intake.dequeue")
            .count()
    }
}

#[async_trait]
impl IntakeApi for NullIntake {
    async fn metrics(&self) -> Result<QueueMetrics, IntakeError> {
        record(&self.journal, &self.calls, "intake.metrics".into());
        let step = self.metrics_script.lock().unwrap().pop_front();
        match step {
            Some(MetricsStep::Depth(queue_size)) => Ok(QueueMetrics { queue_size }),
            Some(MetricsStep::Unreachable) => Err(IntakeError::Client(ClientError::Transport {
                endpoint: "null://intake".into(),
                detail: "scripted outage".into(),
            })),
            None => Ok(QueueMetrics {
                queue_size: self.depth() as u64,
            }),
        }
    }

    async fn dequeue(&self) -> Result<Option<Identity>, IntakeError> {
        record(&self.journal, &self.calls, "intake.dequeue".into());
        Ok(self.queue.lock().unwrap().pop_front())
    }

    async fn enqueue(&self, identity: &Identity) -> Result<(), IntakeError> {
        record(
            &self.journal,
            &self.calls,
            format!("intake.enqueue:{}", identity.email),
        );
        self.queue.lock().unwrap().push_back(identity.clone());
        Ok(())
    }
}
