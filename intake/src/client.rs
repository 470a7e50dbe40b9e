//! HTTP client for the IQ intake queue service.

use async_trait::async_trait;
use serde::Deserialize;

use securecast_client::ResilientClient;
use securecast_types::{Identity, QueueEnvelope, QueueMetrics};

use crate::api::IntakeApi;
use crate::error::IntakeError;

pub struct IntakeClient {
    http: ResilientClient,
    base_url: String,
}

/// `POST /add-user` ack.
#[derive(Debug, Deserialize)]
struct AddWire {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    is_added: bool,
}

impl IntakeClient {
    pub fn new(http: ResilientClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl IntakeApi for IntakeClient {
    async fn metrics(&self) -> Result<QueueMetrics, IntakeError> {
        let metrics = self.http.get_json(&self.endpoint("/metrics")).await?;
        Ok(metrics)
    }

    async fn dequeue(&self) -> Result<Option<Identity>, IntakeError> {
        let envelope: QueueEnvelope = self.http.get_json(&self.endpoint("/get-user")).await?;
        Ok(envelope.decode()?)
    }

    async fn enqueue(&self, identity: &Identity) -> Result<(), IntakeError> {
        let body = QueueEnvelope::encode(identity)?;
        // A saturated queue answers 429, which surfaces as a ClientError
        // before we ever see the ack body.
        let ack: AddWire = self.http.post_json(&self.endpoint("/add-user"), &body).await?;
        if ack.error || !ack.is_added {
            tracing::warn!(email = %identity.email, "intake queue did not confirm the add");
        }
        Ok(())
    }
}
