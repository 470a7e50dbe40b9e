//! Client for the CT ledger, the integrity-checked store of identities and
//! vote state and the sole arbiter of vote idempotency.
//!
//! No mutation (`add`, `update`, `cast_vote`) may be attempted by callers
//! while the most recently fetched [`IntegrityReport`] is not intact; the
//! report is fetched fresh before every write and never cached.

pub mod api;
pub mod client;
pub mod error;

pub use api::{IntegrityReport, LedgerApi, VoteReceipt};
pub use client::LedgerClient;
pub use error::LedgerError;
