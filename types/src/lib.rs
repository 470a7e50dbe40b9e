//! Shared data model for the SecureCast client pipeline.
//!
//! This crate defines the types exchanged between the intake queue ("IQ"),
//! the integrity-checked ledger ("CT") and the workflow crates: the identity
//! record, the queue envelope that carries it, and the ballot party.

pub mod envelope;
pub mod identity;
pub mod party;

pub use envelope::{EnvelopeError, QueueEnvelope, QueueMetrics};
pub use identity::Identity;
pub use party::Party;
