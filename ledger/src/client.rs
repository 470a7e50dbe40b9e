//! HTTP client for the CT ledger service.
//!
//! Every response from the ledger carries the `{error, message, …}`
//! envelope; data fields (`user`, `integrity`) are merged alongside it.

use async_trait::async_trait;
use serde::Deserialize;

use securecast_client::ResilientClient;
use securecast_types::{Identity, Party};

use crate::api::{IntegrityReport, LedgerApi, VoteReceipt};
use crate::error::LedgerError;

pub struct LedgerClient {
    http: ResilientClient,
    base_url: String,
}

/// `POST /user/details` response.
#[derive(Debug, Deserialize)]
struct DetailsWire {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    user: Option<Identity>,
}

/// `GET /tree/verify` response.
#[derive(Debug, Deserialize)]
struct VerifyWire {
    #[serde(default)]
    message: String,
    #[serde(default)]
    integrity: bool,
}

/// `/user/add`, `/user/update`, `/user/vote` responses.
#[derive(Debug, Deserialize)]
struct MutateWire {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    message: String,
}

impl LedgerClient {
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

/// The vote endpoint reports idempotency conflicts through the error flag,
/// not the HTTP status.
fn receipt_from(wire: MutateWire) -> VoteReceipt {
    if wire.error {
        VoteReceipt::AlreadyCast {
            message: wire.message,
        }
    } else {
        VoteReceipt::Accepted {
            message: wire.message,
        }
    }
}

#[async_trait]
impl LedgerApi for LedgerClient {
    async fn fetch_identity(&self, email: &str) -> Result<Option<Identity>, LedgerError> {
        let response: DetailsWire = self
            .http
            .post_json(
                &self.endpoint("/user/details"),
                &serde_json::json!({ "identifier": email }),
            )
            .await?;

        if response.error {
            return Ok(None);
        }
        Ok(response.user)
    }

    async fn verify_integrity(&self) -> Result<IntegrityReport, LedgerError> {
        let response: VerifyWire = self.http.get_json(&self.endpoint("/tree/verify")).await?;
        Ok(IntegrityReport {
            intact: response.integrity,
            message: response.message,
        })
    }

    async fn add(&self, identity: &Identity) -> Result<String, LedgerError> {
        let response: MutateWire = self
            .http
            .post_json(&self.endpoint("/user/add"), identity)
            .await?;
        if response.error {
            return Err(LedgerError::Rejected {
                message: response.message,
            });
        }
        Ok(response.message)
    }

    async fn update(&self, identity: &Identity) -> Result<String, LedgerError> {
        let response: MutateWire = self
            .http
            .put_json(&self.endpoint("/user/update"), identity)
            .await?;
        if response.error {
            return Err(LedgerError::Rejected {
                message: response.message,
            });
        }
        Ok(response.message)
    }

    async fn cast_vote(&self, email: &str, party: &Party) -> Result<VoteReceipt, LedgerError> {
        let response: MutateWire = self
            .http
            .post_json(
                &self.endpoint("/user/vote"),
                &serde_json::json!({ "email": email, "party": party }),
            )
            .await?;
        Ok(receipt_from(response))
    }
}
