//! Nullable OTP gate: accepts exactly one configured code.

use async_trait::async_trait;
use std::sync::Mutex;

use securecast_otp::{OtpApi, OtpChallenge, OtpError, OtpValidation};

use crate::journal::{record, Journal};

pub struct NullOtp {
    /// The one code `validate` will accept. `None` rejects everything.
    accepted_code: Mutex<Option<String>>,
    journal: Option<Journal>,
    calls: Mutex<Vec<String>>,
}

impl NullOtp {
    pub fn accepting(code: &str) -> Self {
        Self {
            accepted_code: Mutex::new(Some(code.to_string())),
            journal: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accepted_code: Mutex::new(None),
            journal: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OtpApi for NullOtp {
    async fn issue(&self, email: &str) -> Result<OtpChallenge, OtpError> {
        record(&self.journal, &self.calls, format!("otp.issue:{email}"));
        Ok(OtpChallenge {
            token: "null-challenge".into(),
            issued_at: serde_json::json!(1_735_689_600u64),
        })
    }

    async fn validate(
        &self,
        code: &str,
        _challenge: &OtpChallenge,
    ) -> Result<OtpValidation, OtpError> {
        record(&self.journal, &self.calls, "otp.validate".into());
        let accepted = self.accepted_code.lock().unwrap();
        let valid = accepted.as_deref() == Some(code);
        Ok(OtpValidation {
            valid,
            message: if valid {
                "OTP is valid".into()
            } else {
                "Invalid OTP".into()
            },
        })
    }
}
