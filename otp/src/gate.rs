//! Issue and validate one-time codes against the OTP service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use securecast_client::{ClientError, ResilientClient};

/// A pending challenge, held client-side between issue and validate.
///
/// `issued_at` is echoed back to the service untouched on validation; its
/// format and its expiry are the service's business.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct OtpChallenge {
    /// Opaque challenge token (the service's hash of the mailed code).
    #[serde(rename = "otp")]
    pub token: String,

    /// Issuance timestamp in whatever shape the service chose.
    #[serde(rename = "time", default)]
    pub issued_at: Value,
}

/// Result of validating a user-entered code.
///
/// `valid: false` must never be silently retried; callers restart their
/// whole workflow from scratch.
#[derive(Clone, Debug, Deserialize)]
pub struct OtpValidation {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("OTP service transport error: {0}")]
    Client(#[from] ClientError),
}

#[async_trait]
pub trait OtpApi: Send + Sync {
    /// `POST /init-otp {email}`. Mails a code and returns the challenge.
    async fn issue(&self, email: &str) -> Result<OtpChallenge, OtpError>;

    /// `POST /validate-otp {otp, hashOTP, setTime}`.
    async fn validate(
        &self,
        code: &str,
        challenge: &OtpChallenge,
    ) -> Result<OtpValidation, OtpError>;
}

pub struct OtpGate {
    http: ResilientClient,
    base_url: String,
}

impl OtpGate {
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
impl OtpApi for OtpGate {
    async fn issue(&self, email: &str) -> Result<OtpChallenge, OtpError> {
        let challenge = self
            .http
            .post_json(
                &self.endpoint("/init-otp"),
                &serde_json::json!({ "email": email }),
            )
            .await?;
        Ok(challenge)
    }

    async fn validate(
        &self,
        code: &str,
        challenge: &OtpChallenge,
    ) -> Result<OtpValidation, OtpError> {
        let validation = self
            .http
            .post_json(
                &self.endpoint("/validate-otp"),
                &serde_json::json!({
                    "otp": code,
                    "hashOTP": challenge.token,
                    "setTime": challenge.issued_at,
                }),
            )
            .await?;
        Ok(validation)
    }
}
