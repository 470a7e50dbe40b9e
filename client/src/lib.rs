//! Resilient HTTP primitive for the SecureCast pipeline.
//!
//! Every backend call in the workspace goes through [`ResilientClient`]:
//! a shared `reqwest` connection pool wrapped in a per-attempt deadline and
//! a bounded retry budget. Retries are immediate (no backoff) so the
//! observable contract is simply "at most `max_retries + 1` attempts".

pub mod error;
pub mod http;
pub mod retry;

pub use error::ClientError;
pub use http::ResilientClient;
pub use retry::{send_with_retry, RetryPolicy};
