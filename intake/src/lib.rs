//! Client for the IQ intake queue, the staging store for newly submitted
//! identity records awaiting ledger replication.
//!
//! Delivery is at-least-once: a dequeued record that fails downstream may be
//! seen again on a later poll, and consumers must tolerate redelivery.

pub mod api;
pub mod client;
pub mod error;

pub use api::IntakeApi;
pub use client::IntakeClient;
pub use error::IntakeError;
