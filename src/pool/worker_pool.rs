use crate::config::WorkerInit;
use crate::pool::handle::{WorkerGuard, WorkerHandle};
use crate::pool::{PoolError, UnitOfWork};
use crate::retry::Backoff;
use crate::session::{Session, SessionFactory};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::task::JoinSet;

/// Settings used when starting a pool from a session factory
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Number of worker slots
    pub size: usize,
    /// Upper bound on the number of items handed to one worker at a time
    pub max_chunk_size: usize,
    /// What to do when a session cannot be started
    pub worker_init: WorkerInit,
    /// Delay between session start attempts
    pub init_backoff: Backoff,
}

struct PoolInner<S> {
    slots: Vec<Arc<Mutex<WorkerHandle<S>>>>,
    permits: Arc<Semaphore>,
    max_chunk_size: usize,
}

/// Fixed-size pool of exclusive sessions
///
/// Cloning the pool is cheap and every clone refers to the same slots.
pub struct WorkerPool<S> {
    inner: Arc<PoolInner<S>>,
}

impl<S> Clone for WorkerPool<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Session> WorkerPool<S> {
    /// Builds a pool around already started sessions
    pub fn from_sessions(sessions: Vec<S>, max_chunk_size: usize) -> Result<Self, PoolError> {
        if sessions.is_empty() {
            return Err(PoolError::Empty);
        }

        let slots: Vec<_> = sessions
            .into_iter()
            .enumerate()
            .map(|(id, session)| Arc::new(Mutex::new(WorkerHandle::new(id, session))))
            .collect();

        Ok(Self {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(slots.len())),
                slots,
                max_chunk_size: max_chunk_size.max(1),
            }),
        })
    }

    /// Starts `options.size` sessions and builds a pool around them
    ///
    /// With [`WorkerInit::Retry`] a session that fails to start is retried
    /// until it comes up; with [`WorkerInit::FailFast`] the first failure
    /// closes the sessions started so far and is returned.
    pub async fn launch<F>(factory: &F, options: PoolOptions) -> Result<Self, PoolError>
    where
        F: SessionFactory<Session = S>,
    {
        if options.size == 0 {
            return Err(PoolError::Empty);
        }

        let mut sessions = Vec::with_capacity(options.size);
        for worker in 0..options.size {
            let mut attempt = 0u32;
            let session = loop {
                attempt += 1;
                match factory.create(worker).await {
                    Ok(session) => {
                        tracing::debug!("Worker {} session initialised", worker);
                        break session;
                    }
                    Err(e) if options.worker_init == WorkerInit::Retry => {
                        let delay = options.init_backoff.delay(attempt);
                        tracing::warn!(
                            "Worker {} session could not be started ({}). Retrying in {:?}",
                            worker,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        tracing::error!("Worker {} session could not be started: {}", worker, e);
                        for started in sessions.iter_mut() {
                            let _ = Session::close(started).await;
                        }
                        return Err(PoolError::Init { worker, source: e });
                    }
                }
            };
            sessions.push(session);
        }

        tracing::info!("Started {} worker sessions", sessions.len());
        Self::from_sessions(sessions, options.max_chunk_size)
    }

    /// Number of worker slots
    pub fn size(&self) -> usize {
        self.inner.slots.len()
    }

    /// Number of slots not currently claimed
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.permits.is_closed()
    }

    /// Claims a free worker, waiting until one is released
    ///
    /// Fails with [`PoolError::Closed`] once the pool is shut down, which
    /// also wakes every task still waiting here.
    pub async fn acquire(&self) -> Result<WorkerGuard<S>, PoolError> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        self.claim_slot(permit)
    }

    /// Claims a free worker without waiting
    pub fn try_acquire(&self) -> Result<WorkerGuard<S>, PoolError> {
        let permit = Arc::clone(&self.inner.permits)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::NoPermits => PoolError::Exhausted(self.size()),
                TryAcquireError::Closed => PoolError::Closed,
            })?;
        self.claim_slot(permit)
    }

    /// Takes the first slot whose lock is free, scanning in index order
    fn claim_slot(&self, permit: OwnedSemaphorePermit) -> Result<WorkerGuard<S>, PoolError> {
        for slot in &self.inner.slots {
            if let Ok(handle) = Arc::clone(slot).try_lock_owned() {
                tracing::trace!("Worker {} acquired", handle.id());
                return Ok(WorkerGuard::new(handle, permit));
            }
        }
        // Only reachable while shutdown holds slot locks.
        Err(PoolError::Exhausted(self.size()))
    }

    /// Runs `work` over every item using whichever workers are free
    ///
    /// Items are split into chunks (see [`chunk_size`]); each chunk runs
    /// sequentially on one worker. The returned vector holds one output per
    /// input item, in input order.
    pub async fn map<W>(&self, work: Arc<W>, items: Vec<W::Input>) -> Result<Vec<W::Output>, PoolError>
    where
        W: UnitOfWork<S>,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total = items.len();
        let size = chunk_size(total, self.size(), self.inner.max_chunk_size);
        let mut chunks = Vec::new();
        let mut iter = items.into_iter();
        loop {
            let chunk: Vec<_> = iter.by_ref().take(size).collect();
            if chunk.is_empty() {
                break;
            }
            chunks.push(chunk);
        }

        tracing::debug!(
            "Mapping {} items in {} chunks of up to {}",
            total,
            chunks.len(),
            size
        );

        let chunk_count = chunks.len();
        let mut tasks = JoinSet::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let pool = self.clone();
            let work = Arc::clone(&work);
            tasks.spawn(async move {
                let mut worker = pool.acquire().await?;
                tracing::debug!(
                    "Worker {} took chunk {} ({} items)",
                    worker.id(),
                    index,
                    chunk.len()
                );
                let mut outputs = Vec::with_capacity(chunk.len());
                for item in chunk {
                    outputs.push(worker.execute(work.as_ref(), item).await);
                }
                Ok::<_, PoolError>((index, outputs))
            });
        }

        let mut ordered: Vec<Option<Vec<W::Output>>> = (0..chunk_count).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outputs) = joined.map_err(|e| PoolError::TaskFailed(e.to_string()))??;
            ordered[index] = Some(outputs);
        }

        Ok(ordered.into_iter().flatten().flatten().collect())
    }

    /// Stops handing out workers and closes every session
    ///
    /// Waits for workers still in use to be released. Returns the number of
    /// sessions closed cleanly.
    pub async fn shutdown(&self) -> usize {
        self.inner.permits.close();

        let mut closed = 0;
        for slot in &self.inner.slots {
            let mut handle = slot.lock().await;
            tracing::debug!("Worker {} ran {} units", handle.id(), handle.units_run());
            match handle.close().await {
                Ok(()) => closed += 1,
                Err(e) => tracing::warn!("Failed to close worker {}: {}", handle.id(), e),
            }
        }
        closed
    }
}

/// Number of items per chunk for `total` items over `workers` workers
///
/// Spreads the items evenly over the workers, never below one item and
/// never above `max_chunk_size`.
pub fn chunk_size(total: usize, workers: usize, max_chunk_size: usize) -> usize {
    total
        .div_ceil(workers.max(1))
        .clamp(1, max_chunk_size.max(1))
}
