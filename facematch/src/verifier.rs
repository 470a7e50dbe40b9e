//! The fail-closed face verifier.

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

use securecast_client::ResilientClient;

#[async_trait]
pub trait FaceOracle: Send + Sync {
    /// True iff the oracle's confidence strictly exceeds the cutoff.
    /// Failures of any kind are a non-match.
    async fn matches(&self, captured: &str, reference: &str) -> bool;
}

/// Oracle configuration. Threshold and credential pool are deployment
/// values, not behavior.
#[derive(Clone, Debug, Deserialize)]
pub struct FaceMatchConfig {
    /// Full verification endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Value for the oracle's host header.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Upstream client identifier, echoed in every request.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Match cutoff: confidence must be strictly greater to count as a
    /// match. 75.0 exactly is a non-match.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// API keys, one drawn uniformly at random per call. Load distribution
    /// across upstream quotas, not a security mechanism.
    #[serde(default)]
    pub credentials: Vec<String>,
}

fn default_endpoint() -> String {
    "https://facematch.p.rapidapi.com/API/verify/Facematch".to_string()
}

fn default_api_host() -> String {
    "facematch.p.rapidapi.com".to_string()
}

fn default_client_id() -> String {
    "222".to_string()
}

fn default_threshold() -> f64 {
    75.0
}

impl Default for FaceMatchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_host: default_api_host(),
            client_id: default_client_id(),
            threshold: default_threshold(),
            credentials: Vec::new(),
        }
    }
}

pub struct FaceVerifier {
    http: ResilientClient,
    config: FaceMatchConfig,
}

impl FaceVerifier {
    pub fn new(http: ResilientClient, config: FaceMatchConfig) -> Self {
        Self { http, config }
    }

    fn pick_credential(&self) -> Option<&str> {
        if self.config.credentials.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..self.config.credentials.len());
        Some(&self.config.credentials[index])
    }

    async fn confidence(&self, captured: &str, reference: &str) -> Option<f64> {
        let credential = match self.pick_credential() {
            Some(key) => key.to_string(),
            None => {
                error!("face-match credential pool is empty");
                return None;
            }
        };

        let txn_id = format!(
            "txn-{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default()
        );

        let body = serde_json::json!({
            "method": "facevalidate",
            "txn_id": txn_id,
            "clientid": self.config.client_id,
            "image_base64_1": captured,
            "image_base64_2": reference,
        });

        let headers = [
            ("x-rapidapi-key", credential),
            ("x-rapidapi-host", self.config.api_host.clone()),
        ];

        let response: Value = match self
            .http
            .post_json_with_headers(&self.config.endpoint, &headers, &body)
            .await
        {
            Ok(value) => value,
            Err(err) => {
                error!(error = %err, "face-match request failed");
                return None;
            }
        };

        extract_confidence(&response)
    }
}

/// The match decision: confidence must strictly exceed the cutoff.
/// Equality is a non-match.
fn clears_threshold(confidence: f64, threshold: f64) -> bool {
    confidence > threshold
}

/// Pull `Succeeded.data.confidence` out of the oracle response. The field
/// arrives as a string on the live service but a bare number is accepted
/// too.
fn extract_confidence(response: &Value) -> Option<f64> {
    let raw = response.get("Succeeded")?.get("data")?.get("confidence")?;
    match raw {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[async_trait]
impl FaceOracle for FaceVerifier {
    async fn matches(&self, captured: &str, reference: &str) -> bool {
        match self.confidence(captured, reference).await {
            Some(confidence) => {
                debug!(confidence, threshold = self.config.threshold, "oracle answered");
                clears_threshold(confidence, self.config.threshold)
            }
            None => false,
        }
    }
}
