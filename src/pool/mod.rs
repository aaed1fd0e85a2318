//! Worker pool of exclusive page sessions
//!
//! The pool owns a fixed number of sessions, one per worker slot, for the
//! lifetime of the run. Each slot is guarded by its own lock and a counting
//! semaphore with one permit per slot bounds how many tasks may try to claim
//! a slot at once, so claiming never spins and never double-books a session.
//!
//! - [`WorkerHandle`]: one session plus its bookkeeping
//! - [`WorkerGuard`]: scoped ownership of a handle, released on drop
//! - [`WorkerPool`]: acquisition and chunked `map` over the slots
//! - [`UnitOfWork`]: what a worker runs against its session

mod handle;
mod worker_pool;

pub use handle::{WorkerGuard, WorkerHandle};
pub use worker_pool::{chunk_size, PoolOptions, WorkerPool};

use crate::session::{Session, SessionError};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the worker pool
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("All {0} workers are busy")]
    Exhausted(usize),

    #[error("Worker pool is shut down")]
    Closed,

    #[error("Worker pool needs at least one worker")]
    Empty,

    #[error("Chunk task failed: {0}")]
    TaskFailed(String),

    #[error("Failed to start worker {worker}: {source}")]
    Init {
        worker: usize,
        #[source]
        source: SessionError,
    },
}

/// A single extraction call made against one session
///
/// Implementations never fail: whatever goes wrong must already be folded
/// into `Output` (see [`crate::retry::with_retry`]).
#[async_trait]
pub trait UnitOfWork<S: Session>: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn run(&self, session: &mut S, input: Self::Input) -> Self::Output;
}
