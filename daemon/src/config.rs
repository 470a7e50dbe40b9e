//! Daemon configuration with TOML file support.
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields a working configuration pointed at the hosted services.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use securecast_client::RetryPolicy;
use securecast_facematch::FaceMatchConfig;
use securecast_replicator::DrainConfig;

#[derive(Clone, Debug, Deserialize)]
pub struct SecurecastConfig {
    /// Base URL of the IQ intake queue.
    #[serde(default = "default_intake_url")]
    pub intake_url: String,

    /// Base URL of the CT ledger.
    #[serde(default = "default_ledger_url")]
    pub ledger_url: String,

    /// Base URL of the OTP service.
    #[serde(default = "default_otp_url")]
    pub otp_url: String,

    /// Per-attempt request deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Additional attempts after the first, per request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Concurrent replication tasks per drain iteration.
    #[serde(default = "default_batch_size")]
    pub drain_batch_size: usize,

    /// Milliseconds to wait once the queue reports empty.
    #[serde(default = "default_wait_ms")]
    pub drain_idle_wait_ms: u64,

    /// Milliseconds to back off after a faulted drain iteration.
    #[serde(default = "default_wait_ms")]
    pub drain_error_backoff_ms: u64,

    /// Drain iteration safety cap.
    #[serde(default = "default_max_iterations")]
    pub drain_max_iterations: u64,

    /// Face-match oracle settings (endpoint, threshold, credential pool).
    #[serde(default)]
    pub facematch: FaceMatchConfig,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_intake_url() -> String {
    "https://securecast-iqueue.onrender.com".to_string()
}

fn default_ledger_url() -> String {
    "https://securecast-captaintree.onrender.com".to_string()
}

fn default_otp_url() -> String {
    "https://securecast-p8oo.onrender.com".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    3
}

fn default_batch_size() -> usize {
    5
}

fn default_wait_ms() -> u64 {
    5000
}

fn default_max_iterations() -> u64 {
    10_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SecurecastConfig {
    fn default() -> Self {
        // serde defaults and Default must agree; an empty TOML table is
        // the canonical empty input.
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl SecurecastConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempt_timeout: Duration::from_millis(self.request_timeout_ms),
            max_retries: self.max_retries,
        }
    }

    pub fn drain_config(&self) -> DrainConfig {
        DrainConfig {
            batch_size: self.drain_batch_size,
            idle_wait: Duration::from_millis(self.drain_idle_wait_ms),
            error_backoff: Duration::from_millis(self.drain_error_backoff_ms),
            max_iterations: self.drain_max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_contract_defaults() {
        let config = SecurecastConfig::default();
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.drain_batch_size, 5);
        assert_eq!(config.facematch.threshold, 75.0);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config: SecurecastConfig = toml::from_str(
            r#"
            ledger_url = "http://localhost:7070"
            max_retries = 1

            [facematch]
            threshold = 80.0
            credentials = ["key-a", "key-b"]
            "#,
        )
        .unwrap();
        assert_eq!(config.ledger_url, "http://localhost:7070");
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.facematch.threshold, 80.0);
        assert_eq!(config.facematch.credentials.len(), 2);
        // Untouched fields keep their defaults.
        assert_eq!(config.request_timeout_ms, 5000);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "drain_batch_size = 2").unwrap();
        let config = SecurecastConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.drain_batch_size, 2);
        assert_eq!(config.drain_config().batch_size, 2);
    }

    #[test]
    fn test_policy_conversions() {
        let config = SecurecastConfig::default();
        let policy = config.retry_policy();
        assert_eq!(policy.attempt_timeout, Duration::from_millis(5000));
        assert_eq!(policy.max_attempts(), 4);
        let drain = config.drain_config();
        assert_eq!(drain.idle_wait, Duration::from_millis(5000));
        assert_eq!(drain.max_iterations, 10_000);
    }
}
