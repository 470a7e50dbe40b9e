//! The vote-casting transaction.
//!
//! An ordered gate sequence (OTP validation, then face verification, then
//! ledger integrity) guards a single vote-cast call. Each gate failure maps to its
//! own terminal outcome, and the cast itself is attempted at most once per
//! transaction: the ledger is the sole arbiter of exactly-once voting, and
//! its "already voted" signal is an outcome, not an error.

pub mod transaction;

pub use transaction::{RestartReason, VoteError, VoteOutcome, VoteRequest, VoteTransaction};
