//! OTP gate: one-time codes bound to an email and an issuance timestamp.
//!
//! Both issuance and validation are delegated to the OTP service; this crate
//! owns only the request/response shapes and the obligation to carry the
//! returned challenge verbatim between the two calls. Nothing here is
//! authoritative: expiry in particular is enforced by the service alone, so
//! the challenge timestamp is held as an opaque value the client never
//! interprets.

pub mod gate;

pub use gate::{OtpApi, OtpChallenge, OtpError, OtpGate, OtpValidation};
