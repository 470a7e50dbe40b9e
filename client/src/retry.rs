//! Bounded retry with a hard per-attempt deadline.
//!
//! The retry core is a free function over a closure producing attempt
//! futures, so the attempt-count contract can be pinned down in tests
//! without a network. [`crate::ResilientClient`] feeds it reqwest attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ClientError;

/// Timeout and retry budget applied to every top-level request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Hard deadline per attempt. Expiry cancels the in-flight request and
    /// consumes one attempt.
    pub attempt_timeout: Duration,

    /// Additional attempts after the first. Retries fire immediately, with
    /// no backoff between attempts.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_millis(5000),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Total attempts this policy permits.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Drive `attempt` until it succeeds or the retry budget is exhausted.
///
/// Each attempt runs under `policy.attempt_timeout`; expiry drops the
/// attempt future, cancelling whatever I/O it had in flight. Every retry is
/// logged with its ordinal. The deadline is armed and released once per
/// attempt: `tokio::time::timeout` owns the timer for exactly the
/// attempt's lifetime.
pub async fn send_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    endpoint: &str,
    mut attempt: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let max_attempts = policy.max_attempts();
    let mut last_error: Option<ClientError> = None;

    for ordinal in 1..=max_attempts {
        let outcome = tokio::time::timeout(policy.attempt_timeout, attempt()).await;
        let error = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(_) => ClientError::DeadlineExceeded {
                endpoint: endpoint.to_string(),
                deadline: policy.attempt_timeout,
            },
        };

        if ordinal < max_attempts {
            warn!(
                endpoint,
                retry = ordinal,
                of = policy.max_retries,
                error = %error,
                "request failed, retrying"
            );
        }
        last_error = Some(error);
    }

    // The loop body ran at least once, so last_error is populated.
    Err(last_error.unwrap_or(ClientError::Transport {
        endpoint: endpoint.to_string(),
        detail: "retry budget of zero attempts".into(),
    }))
}
