//! The gate sequence and its outcomes.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use securecast_facematch::FaceOracle;
use securecast_ledger::{LedgerApi, LedgerError, VoteReceipt};
use securecast_otp::{OtpApi, OtpChallenge, OtpError};
use securecast_types::{Identity, Party};

/// Everything one transaction attempt needs, captured up front.
#[derive(Clone, Debug)]
pub struct VoteRequest {
    /// Code the voter typed in.
    pub otp_code: String,
    /// Challenge returned at issuance, carried verbatim.
    pub challenge: OtpChallenge,
    /// Live capture to compare against the registered face template.
    pub captured_face: String,
    /// Ballot selection.
    pub party: Party,
}

/// Why the workflow must restart from scratch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestartReason {
    /// The OTP service rejected the code. Never retried silently.
    OtpRejected { message: String },
    /// The face oracle did not clear the match cutoff.
    FaceMismatch,
}

/// Terminal outcome of one transaction attempt. Every variant is a distinct
/// user-facing result; none of them is an error to retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The ledger recorded the vote.
    Completed { message: String },
    /// The ledger had already recorded a vote for this email. Terminal and
    /// success-adjacent, not a failure.
    AlreadyCast { message: String },
    /// A gate failed; the voter starts over.
    Restart(RestartReason),
    /// Ledger integrity could not be attested; the workflow lands in a
    /// safe state without any vote attempt.
    Unavailable,
}

/// Transport-level failure after the resilient client's budget was spent.
/// Business-logic failures are [`VoteOutcome`] variants, not errors.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub struct VoteTransaction {
    ledger: Arc<dyn LedgerApi>,
    otp: Arc<dyn OtpApi>,
    face: Arc<dyn FaceOracle>,
}

impl VoteTransaction {
    pub fn new(
        ledger: Arc<dyn LedgerApi>,
        otp: Arc<dyn OtpApi>,
        face: Arc<dyn FaceOracle>,
    ) -> Self {
        Self { ledger, otp, face }
    }

    /// Fetch the voter's ledger identity ahead of the transaction.
    ///
    /// `Ok(None)` means the email is not registered; callers route the user
    /// to registration instead of starting a transaction.
    pub async fn lookup_voter(&self, email: &str) -> Result<Option<Identity>, VoteError> {
        Ok(self.ledger.fetch_identity(email).await?)
    }

    /// Ask the OTP service to mail a code and return the challenge the
    /// caller must hold on to.
    pub async fn issue_challenge(&self, email: &str) -> Result<OtpChallenge, VoteError> {
        Ok(self.otp.issue(email).await?)
    }

    /// Run the gate sequence and, if every gate passes, cast the vote.
    ///
    /// Steps are strictly sequential and short-circuit: OTP, face,
    /// integrity, cast. The cast call happens at most once per invocation
    /// and is never retried here; the idempotency contract belongs to the
    /// ledger.
    pub async fn execute(
        &self,
        voter: &Identity,
        request: &VoteRequest,
    ) -> Result<VoteOutcome, VoteError> {
        let validation = self
            .otp
            .validate(&request.otp_code, &request.challenge)
            .await?;
        if !validation.valid {
            warn!(email = %voter.email, message = %validation.message, "OTP rejected");
            return Ok(VoteOutcome::Restart(RestartReason::OtpRejected {
                message: validation.message,
            }));
        }

        if !self
            .face
            .matches(&request.captured_face, &voter.face_template)
            .await
        {
            warn!(email = %voter.email, "face verification failed");
            return Ok(VoteOutcome::Restart(RestartReason::FaceMismatch));
        }

        let report = self.ledger.verify_integrity().await?;
        if !report.intact {
            warn!(
                email = %voter.email,
                message = %report.message,
                "ledger integrity not attested, aborting before any vote attempt"
            );
            return Ok(VoteOutcome::Unavailable);
        }

        match self.ledger.cast_vote(&voter.email, &request.party).await? {
            VoteReceipt::Accepted { message } => {
                info!(email = %voter.email, party = %request.party, "vote cast");
                Ok(VoteOutcome::Completed { message })
            }
            VoteReceipt::AlreadyCast { message } => {
                info!(email = %voter.email, "vote already cast, nothing to do");
                Ok(VoteOutcome::AlreadyCast { message })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use securecast_nullables::{
        shared_journal, IntegrityStep, NullFaceOracle, NullLedger, NullOtp,
    };

    fn voter() -> Identity {
        Identity::new("A", "a@x.com", "addr", "0000", "cmVnaXN0ZXJlZA==")
    }

    fn request() -> VoteRequest {
        VoteRequest {
            otp_code: "123456".into(),
            challenge: OtpChallenge {
                token: "null-challenge".into(),
                issued_at: serde_json::json!(0),
            },
            captured_face: "bGl2ZQ==".into(),
            party: Party::new("Unity Alliance"),
        }
    }

    fn transaction(
        ledger: &Arc<NullLedger>,
        otp: &Arc<NullOtp>,
        face: &Arc<NullFaceOracle>,
    ) -> VoteTransaction {
        VoteTransaction::new(ledger.clone(), otp.clone(), face.clone())
    }

    #[tokio::test]
    async fn test_happy_path_runs_gates_in_order() {
        let journal = shared_journal();
        let ledger = Arc::new(NullLedger::with_journal(journal.clone()));
        let otp = Arc::new(NullOtp::accepting("123456").with_journal(journal.clone()));
        let face = Arc::new(NullFaceOracle::matching().with_journal(journal.clone()));
        ledger.insert_identity(voter());

        let outcome = transaction(&ledger, &otp, &face)
            .execute(&voter(), &request())
            .await
            .unwrap();

        assert!(matches!(outcome, VoteOutcome::Completed { .. }));
        assert_eq!(
            journal.lock().unwrap().clone(),
            vec![
                "otp.validate".to_string(),
                "face.matches".to_string(),
                "ledger.verify".to_string(),
                "ledger.vote:a@x.com".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_otp_short_circuits_everything() {
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::rejecting());
        let face = Arc::new(NullFaceOracle::matching());

        let outcome = transaction(&ledger, &otp, &face)
            .execute(&voter(), &request())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            VoteOutcome::Restart(RestartReason::OtpRejected {
                message: "Invalid OTP".into()
            })
        );
        assert!(face.calls().is_empty());
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_face_mismatch_restarts_before_integrity() {
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::accepting("123456"));
        let face = Arc::new(NullFaceOracle::rejecting());

        let outcome = transaction(&ledger, &otp, &face)
            .execute(&voter(), &request())
            .await
            .unwrap();

        assert_eq!(outcome, VoteOutcome::Restart(RestartReason::FaceMismatch));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_integrity_failure_aborts_without_cast() {
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::accepting("123456"));
        let face = Arc::new(NullFaceOracle::matching());
        ledger.script_integrity([IntegrityStep::Corrupted]);

        let outcome = transaction(&ledger, &otp, &face)
            .execute(&voter(), &request())
            .await
            .unwrap();

        assert_eq!(outcome, VoteOutcome::Unavailable);
        assert!(!ledger
            .calls()
            .iter()
            .any(|c| c.starts_with("ledger.vote")));
    }

    #[tokio::test]
    async fn test_second_cast_reports_already_cast() {
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::accepting("123456"));
        let face = Arc::new(NullFaceOracle::matching());
        let tx = transaction(&ledger, &otp, &face);

        let first = tx.execute(&voter(), &request()).await.unwrap();
        let second = tx.execute(&voter(), &request()).await.unwrap();

        assert!(matches!(first, VoteOutcome::Completed { .. }));
        assert!(matches!(second, VoteOutcome::AlreadyCast { .. }));
        assert!(ledger.has_voted("a@x.com"));
    }

    #[tokio::test]
    async fn test_integrity_outage_surfaces_as_transport_error() {
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::accepting("123456"));
        let face = Arc::new(NullFaceOracle::matching());
        ledger.script_integrity([IntegrityStep::Unreachable]);

        let result = transaction(&ledger, &otp, &face)
            .execute(&voter(), &request())
            .await;

        assert!(matches!(result, Err(VoteError::Ledger(_))));
        assert!(!ledger
            .calls()
            .iter()
            .any(|c| c.starts_with("ledger.vote")));
    }

    #[tokio::test]
    async fn test_lookup_routes_unregistered_voters_away() {
        let ledger = Arc::new(NullLedger::new());
        let otp = Arc::new(NullOtp::accepting("123456"));
        let face = Arc::new(NullFaceOracle::matching());
        let tx = transaction(&ledger, &otp, &face);

        assert!(tx.lookup_voter("ghost@x.com").await.unwrap().is_none());

        ledger.insert_identity(voter());
        let found = tx.lookup_voter("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.face_template, "cmVnaXN0ZXJlZA==");
    }
}
