//! The IQ → CT replication pipeline.
//!
//! A bounded-iteration loop drains the intake queue in concurrent batches
//! and replicates each record into the ledger, fetching a fresh integrity
//! report immediately before every write. One corrupted report skips one
//! record; one failed record never halts the loop.

pub mod drain;

pub use drain::{DrainConfig, DrainProcessor, DrainSummary, ReplicationMode};
