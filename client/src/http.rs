//! Reqwest-backed resilient HTTP client.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::ClientError;
use crate::retry::{send_with_retry, RetryPolicy};

/// Connection-establishment timeout, separate from the per-attempt deadline.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared HTTP client with timeout/retry semantics applied to every call.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ResilientClient {
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl ResilientClient {
    /// Build a client with the given policy.
    ///
    /// The per-attempt deadline lives in the retry layer, not the reqwest
    /// builder, so that cancelling an attempt also cancels body reads.
    pub fn new(policy: RetryPolicy) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `GET url` -> T
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        self.request_json(Method::GET, url, None, &[]).await
    }

    /// `POST url` with a JSON body -> T
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let body = to_body(url, body)?;
        self.request_json(Method::POST, url, Some(body), &[]).await
    }

    /// `PUT url` with a JSON body -> T. The idempotent verb used for
    /// ledger record updates.
    pub async fn put_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let body = to_body(url, body)?;
        self.request_json(Method::PUT, url, Some(body), &[]).await
    }

    /// `POST url` with extra request headers (credentialed upstreams).
    pub async fn post_json_with_headers<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let body = to_body(url, body)?;
        self.request_json(Method::POST, url, Some(body), headers)
            .await
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        headers: &[(&str, String)],
    ) -> Result<T, ClientError> {
        send_with_retry(&self.policy, url, || {
            single_attempt(&self.http, method.clone(), url, body.as_ref(), headers)
        })
        .await
    }
}

impl Default for ResilientClient {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

/// Serialize the request body once; every retry reuses the same value.
fn to_body(url: &str, body: &impl Serialize) -> Result<Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::Malformed {
        endpoint: url.to_string(),
        detail: format!("request body: {e}"),
    })
}

/// One attempt: send, check status, parse JSON. Non-success responses keep
/// the body as the error payload.
async fn single_attempt<T: DeserializeOwned>(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
    headers: &[(&str, String)],
) -> Result<T, ClientError> {
    let mut request = http.request(method, url);
    for (name, value) in headers {
        request = request.header(*name, value);
    }
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_connect() {
            ClientError::Transport {
                endpoint: url.to_string(),
                detail: format!("connection failed: {e}"),
            }
        } else {
            ClientError::Transport {
                endpoint: url.to_string(),
                detail: e.to_string(),
            }
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            endpoint: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response.json::<T>().await.map_err(|e| ClientError::Malformed {
        endpoint: url.to_string(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_contract() {
        let client = ResilientClient::default();
        assert_eq!(client.policy().attempt_timeout, Duration::from_millis(5000));
        assert_eq!(client.policy().max_retries, 3);
        assert_eq!(client.policy().max_attempts(), 4);
    }

    #[test]
    fn test_body_serialized_once_up_front() {
        let body = to_body("http://x", &serde_json::json!({"email": "a@x.com"})).unwrap();
        assert_eq!(body["email"], "a@x.com");
    }
}
