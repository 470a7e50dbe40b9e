//! Ledger-facing trait and the outcome types it returns.
//!
//! Orchestrators (the queue-drain processor, the vote transaction) depend on
//! this trait rather than the concrete HTTP client so the nullable doubles
//! can stand in during tests.

use async_trait::async_trait;
use tracing::warn;

use securecast_types::{Identity, Party};

use crate::error::LedgerError;

/// Fresh attestation of the ledger's structural consistency.
///
/// Ephemeral by contract: fetched immediately before every mutation and
/// never cached, since a stale report could let a write through against a
/// corrupted ledger.
#[derive(Clone, Debug)]
pub struct IntegrityReport {
    pub intact: bool,
    pub message: String,
}

/// Outcome of a vote-cast call.
///
/// `AlreadyCast` is the ledger's idempotency signal: a terminal,
/// informational outcome, distinct from both success and failure, and never
/// something to retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteReceipt {
    Accepted { message: String },
    AlreadyCast { message: String },
}

#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// `POST /user/details`. `Ok(None)` when the ledger answers with an
    /// error-shaped response (identity unknown).
    async fn fetch_identity(&self, email: &str) -> Result<Option<Identity>, LedgerError>;

    /// `GET /tree/verify`. Always a fresh report, never cached.
    async fn verify_integrity(&self) -> Result<IntegrityReport, LedgerError>;

    /// `POST /user/add`, the create verb for new identities.
    async fn add(&self, identity: &Identity) -> Result<String, LedgerError>;

    /// `PUT /user/update`, the idempotent verb for existing identities.
    async fn update(&self, identity: &Identity) -> Result<String, LedgerError>;

    /// `POST /user/vote`, the single vote-cast endpoint. The ledger alone
    /// enforces at-most-one-cast per email.
    async fn cast_vote(&self, email: &str, party: &Party) -> Result<VoteReceipt, LedgerError>;

    /// Does this identity already exist in the ledger?
    ///
    /// The insert-vs-update resolver. Transport failure deliberately maps
    /// to `false`; the conservative bias is toward treating the registrant
    /// as new rather than erroring the registration flow.
    async fn exists(&self, email: &str) -> bool {
        match self.fetch_identity(email).await {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!(
                    email,
                    error = %err,
                    "identity lookup failed, defaulting to new identity"
                );
                false
            }
        }
    }
}
