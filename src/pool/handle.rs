use crate::pool::UnitOfWork;
use crate::session::{Session, SessionError};
use std::ops::{Deref, DerefMut};
use tokio::sync::{OwnedMutexGuard, OwnedSemaphorePermit};
use tracing::Instrument;

/// One worker slot: an exclusive session and its counters
#[derive(Debug)]
pub struct WorkerHandle<S> {
    id: usize,
    session: S,
    units_run: u64,
}

impl<S: Session> WorkerHandle<S> {
    pub fn new(id: usize, session: S) -> Self {
        Self {
            id,
            session,
            units_run: 0,
        }
    }

    /// Index of this worker in the pool
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of units of work executed on this worker so far
    pub fn units_run(&self) -> u64 {
        self.units_run
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Runs one unit of work against this worker's session
    pub async fn execute<W>(&mut self, work: &W, input: W::Input) -> W::Output
    where
        W: UnitOfWork<S>,
    {
        self.units_run += 1;
        let span = tracing::debug_span!("worker", id = self.id);
        work.run(&mut self.session, input).instrument(span).await
    }

    /// Closes the underlying session
    pub async fn close(&mut self) -> Result<(), SessionError> {
        self.session.close().await
    }
}

/// Scoped ownership of one worker slot
///
/// Dropping the guard unlocks the slot first and returns the pool permit
/// second, so a task woken by the permit always finds a free slot.
pub struct WorkerGuard<S> {
    handle: OwnedMutexGuard<WorkerHandle<S>>,
    _permit: OwnedSemaphorePermit,
}

impl<S> WorkerGuard<S> {
    pub(crate) fn new(handle: OwnedMutexGuard<WorkerHandle<S>>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            handle,
            _permit: permit,
        }
    }
}

impl<S> Deref for WorkerGuard<S> {
    type Target = WorkerHandle<S>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<S> DerefMut for WorkerGuard<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.handle
    }
}
