use securecast_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport error: {0}")]
    Client(#[from] ClientError),

    /// The ledger answered but refused the mutation (e.g. a malformed
    /// record on `/user/add`). Vote idempotency conflicts are *not* errors
    /// and are reported via [`crate::VoteReceipt::AlreadyCast`] instead.
    #[error("ledger rejected the request: {message}")]
    Rejected { message: String },
}
