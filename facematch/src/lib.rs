//! Face verification against the external matching oracle.
//!
//! The oracle returns a similarity confidence between two base64 face
//! images; this crate reduces it to a boolean decision against a configured
//! cutoff. The reduction fails closed: any transport or parse failure is a
//! non-match, never an error bubbled to the caller.

pub mod verifier;

pub use verifier::{FaceMatchConfig, FaceOracle, FaceVerifier};
