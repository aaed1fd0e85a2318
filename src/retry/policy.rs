//! Bounded retry around fallible units of work
//!
//! A wrapped unit of work moves through four states:
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Attempting | success | Succeeded |
//! | Attempting | transient error, attempts left | Recovering |
//! | Attempting | transient error, no attempts left | DegradedFallback |
//! | Attempting | non-transient error | DegradedFallback |
//! | Recovering | session reset + backoff | Attempting |
//!
//! Succeeded and DegradedFallback are terminal. Whether an error is
//! retryable comes from [`WorkError::is_transient`]; how many attempts were
//! made is the state's own counter.

use crate::config::CrawlerConfig;
use crate::pool::UnitOfWork;
use crate::retry::Backoff;
use crate::session::{Session, WorkError};
use async_trait::async_trait;

/// A unit of work that may fail and knows its degraded result
#[async_trait]
pub trait FallibleWork<S: Session>: Send + Sync + 'static {
    type Input: Send + Sync + 'static;
    type Output: Send + 'static;

    /// Makes one attempt; navigates the session itself
    async fn attempt(&self, session: &mut S, input: &Self::Input) -> Result<Self::Output, WorkError>;

    /// Result emitted once attempts are exhausted
    fn degraded(&self, input: &Self::Input) -> Self::Output;

    /// Short description of the input for log lines
    fn describe(&self, input: &Self::Input) -> String;
}

/// How many attempts a unit of work gets and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_attempts,
            Backoff::new(config.retry_backoff_ms, config.retry_backoff_max_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Backoff::new(2000, 30_000))
    }
}

/// Position of a unit of work in the retry state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32 },
    Recovering { attempt: u32 },
    Succeeded { attempts: u32 },
    DegradedFallback { attempts: u32 },
}

impl RetryState {
    pub fn start() -> Self {
        Self::Attempting { attempt: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::DegradedFallback { .. })
    }

    /// Transition taken when the current attempt succeeds
    pub fn on_success(self) -> Self {
        match self {
            Self::Attempting { attempt } => Self::Succeeded { attempts: attempt },
            other => other,
        }
    }

    /// Transition taken when the current attempt fails with `error`
    pub fn on_error(self, error: &WorkError, max_attempts: u32) -> Self {
        match self {
            Self::Attempting { attempt } if error.is_transient() && attempt < max_attempts => {
                Self::Recovering { attempt }
            }
            Self::Attempting { attempt } => Self::DegradedFallback { attempts: attempt },
            other => other,
        }
    }

    /// Transition taken once the session has been reset
    pub fn on_recovered(self) -> Self {
        match self {
            Self::Recovering { attempt } => Self::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }
}

/// A unit of work wrapped by [`with_retry`]
#[derive(Debug)]
pub struct Retrying<W> {
    work: W,
    policy: RetryPolicy,
}

impl<W> Retrying<W> {
    pub fn inner(&self) -> &W {
        &self.work
    }
}

/// Wraps `work` so transient failures are retried under `policy`
///
/// The wrapped work never fails: once attempts run out, or on an error that
/// retrying cannot fix, it yields `work.degraded(input)`.
pub fn with_retry<W>(work: W, policy: RetryPolicy) -> Retrying<W> {
    Retrying { work, policy }
}

#[async_trait]
impl<S, W> UnitOfWork<S> for Retrying<W>
where
    S: Session,
    W: FallibleWork<S>,
{
    type Input = W::Input;
    type Output = W::Output;

    async fn run(&self, session: &mut S, input: W::Input) -> W::Output {
        let mut state = RetryState::start();
        let mut output = None;

        while !state.is_terminal() {
            state = match state {
                RetryState::Attempting { attempt } => {
                    match self.work.attempt(session, &input).await {
                        Ok(value) => {
                            if attempt > 1 {
                                tracing::debug!(
                                    "{} succeeded on attempt {}",
                                    self.work.describe(&input),
                                    attempt
                                );
                            }
                            output = Some(value);
                            state.on_success()
                        }
                        Err(e) => {
                            let next = state.on_error(&e, self.policy.max_attempts);
                            if matches!(next, RetryState::Recovering { .. }) {
                                tracing::warn!(
                                    "{} failed on attempt {}/{}: {}. Retrying...",
                                    self.work.describe(&input),
                                    attempt,
                                    self.policy.max_attempts,
                                    e
                                );
                            } else {
                                tracing::warn!(
                                    "{} failed on attempt {}/{}: {}. Using degraded values",
                                    self.work.describe(&input),
                                    attempt,
                                    self.policy.max_attempts,
                                    e
                                );
                            }
                            next
                        }
                    }
                }
                RetryState::Recovering { attempt } => {
                    if let Err(e) = session.reset().await {
                        tracing::debug!("Session reset failed: {}", e);
                    }
                    tokio::time::sleep(self.policy.backoff.delay(attempt)).await;
                    state.on_recovered()
                }
                terminal => terminal,
            };
        }

        match output {
            Some(value) => value,
            None => self.work.degraded(&input),
        }
    }
}
