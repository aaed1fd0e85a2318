//! Retry handling for units of work
//!
//! Page loads fail intermittently. This module turns a fallible unit of
//! work into one that retries transient failures a bounded number of times,
//! resetting the session in between, and falls back to a degraded result
//! instead of failing the batch.

mod backoff;
mod policy;

pub use backoff::Backoff;
pub use policy::{with_retry, FallibleWork, RetryPolicy, RetryState, Retrying};
