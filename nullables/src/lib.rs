//! Deterministic test doubles for the SecureCast backend services.
//!
//! Each null implements the corresponding service trait, records every call
//! it receives, and returns scripted responses. Nothing here touches the
//! network. Pass one shared [`Journal`] to several nulls to assert
//! cross-service call ordering in workflow tests.

pub mod face;
pub mod intake;
pub mod journal;
pub mod ledger;
pub mod otp;

pub use face::NullFaceOracle;
pub use intake::{MetricsStep, NullIntake};
pub use journal::{shared_journal, Journal};
pub use ledger::{IntegrityStep, NullLedger};
pub use otp::NullOtp;
