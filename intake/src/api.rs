//! Intake-queue trait for orchestrators and test doubles.

use async_trait::async_trait;

use securecast_types::{Identity, QueueMetrics};

use crate::error::IntakeError;

#[async_trait]
pub trait IntakeApi: Send + Sync {
    /// `GET /metrics`. Current queue depth.
    async fn metrics(&self) -> Result<QueueMetrics, IntakeError>;

    /// `GET /get-user`. `Ok(None)` when the queue had nothing to hand out.
    async fn dequeue(&self) -> Result<Option<Identity>, IntakeError>;

    /// `POST /add-user`. Stages a registration for ledger replication.
    async fn enqueue(&self, identity: &Identity) -> Result<(), IntakeError>;
}
