//! Transport-layer error taxonomy.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single top-level request after the retry budget is spent.
///
/// Exactly one of {parsed response, `ClientError`} is produced per call;
/// the variant carries the *last* attempt's failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The per-attempt deadline expired and the in-flight request was
    /// cancelled.
    #[error("request to {endpoint} timed out after {deadline:?}")]
    DeadlineExceeded { endpoint: String, deadline: Duration },

    /// The service answered with a non-success status; the body is kept as
    /// the error payload.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("transport failure for {endpoint}: {detail}")]
    Transport { endpoint: String, detail: String },

    /// The service answered 2xx but the body did not parse as the expected
    /// JSON shape.
    #[error("malformed response from {endpoint}: {detail}")]
    Malformed { endpoint: String, detail: String },
}

impl ClientError {
    /// Endpoint the failing request was addressed to.
    pub fn endpoint(&self) -> &str {
        match self {
            ClientError::DeadlineExceeded { endpoint, .. }
            | ClientError::Status { endpoint, .. }
            | ClientError::Transport { endpoint, .. }
            | ClientError::Malformed { endpoint, .. } => endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_carries_body() {
        let err = ClientError::Status {
            endpoint: "http://ct/user/vote".into(),
            status: 429,
            body: "slow down".into(),
        };
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("slow down"));
    }

    #[test]
    fn test_endpoint_accessor() {
        let err = ClientError::Transport {
            endpoint: "http://iq/metrics".into(),
            detail: "connection refused".into(),
        };
        assert_eq!(err.endpoint(), "http://iq/metrics");
    }
}
