//! Wire shapes owned by the intake queue.
//!
//! The queue hands records back double-encoded: the dequeue response is JSON
//! whose `data` field is itself a JSON string holding the [`Identity`]. The
//! enqueue request mirrors that shape. Decoding is a pure function, so a
//! redelivered record (the queue is at-least-once) decodes identically every
//! time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Identity;

/// `GET /metrics` response.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct QueueMetrics {
    pub queue_size: u64,
}

/// `GET /get-user` response: a record, or a signal that the queue was empty
/// at the time of the poll.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QueueEnvelope {
    #[serde(default)]
    pub is_returned_data: bool,

    /// JSON-serialized [`Identity`], present only when `is_returned_data`.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope flagged as carrying data but the payload is missing")]
    MissingPayload,

    #[error("queue record payload is not a valid identity: {0}")]
    BadPayload(#[from] serde_json::Error),
}

impl QueueEnvelope {
    /// Extract the identity carried by a dequeue response.
    ///
    /// `Ok(None)` means the queue was empty; an envelope that claims to
    /// carry data but cannot produce an identity is an error.
    pub fn decode(&self) -> Result<Option<Identity>, EnvelopeError> {
        if !self.is_returned_data {
            return Ok(None);
        }
        let payload = self.data.as_deref().ok_or(EnvelopeError::MissingPayload)?;
        let identity = serde_json::from_str(payload)?;
        Ok(Some(identity))
    }

    /// Build the `POST /add-user` body for a registration submission.
    pub fn encode(identity: &Identity) -> Result<serde_json::Value, EnvelopeError> {
        let payload = serde_json::to_string(identity)?;
        Ok(serde_json::json!({ "data": payload }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Identity {
        Identity::new("A", "a@x.com", "addr", "0000", "Zg==")
    }

    #[test]
    fn test_decode_present_record() {
        let envelope = QueueEnvelope {
            is_returned_data: true,
            data: Some(serde_json::to_string(&sample()).unwrap()),
        };
        let decoded = envelope.decode().unwrap();
        assert_eq!(decoded, Some(sample()));
    }

    #[test]
    fn test_decode_empty_queue() {
        let envelope = QueueEnvelope {
            is_returned_data: false,
            data: None,
        };
        assert!(envelope.decode().unwrap().is_none());
    }

    #[test]
    fn test_decode_ignores_payload_without_flag() {
        // The flag, not payload presence, is authoritative.
        let envelope = QueueEnvelope {
            is_returned_data: false,
            data: Some("garbage".into()),
        };
        assert!(envelope.decode().unwrap().is_none());
    }

    #[test]
    fn test_decode_flagged_but_missing_payload() {
        let envelope = QueueEnvelope {
            is_returned_data: true,
            data: None,
        };
        assert!(matches!(
            envelope.decode(),
            Err(EnvelopeError::MissingPayload)
        ));
    }

    #[test]
    fn test_decode_is_pure_under_redelivery() {
        let envelope = QueueEnvelope {
            is_returned_data: true,
            data: Some(serde_json::to_string(&sample()).unwrap()),
        };
        let first = envelope.decode().unwrap();
        let second = envelope.decode().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_wraps_identity_as_string() {
        let body = QueueEnvelope::encode(&sample()).unwrap();
        let inner = body["data"].as_str().unwrap();
        let identity: Identity = serde_json::from_str(inner).unwrap();
        assert_eq!(identity, sample());
    }

    #[test]
    fn test_metrics_shape() {
        let metrics: QueueMetrics = serde_json::from_str(r#"{"queue_size": 7}"#).unwrap();
        assert_eq!(metrics.queue_size, 7);
    }
}
