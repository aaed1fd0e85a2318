//! Crawl coordinator: batches, stages and persistence
//!
//! Pending artists are processed in fixed-size batches, strictly one after
//! the other. Within a batch the three stages run in sequence, each spread
//! over the worker pool, and the joined rows are appended to the output
//! before the next batch starts.

use crate::extract::Extractor;
use crate::output::RunSummary;
use crate::pipeline::join::join_rows;
use crate::pipeline::stages::{CollectionsStage, ContentStage, StatsStage};
use crate::pool::{PoolError, WorkerPool};
use crate::progress::ProgressStore;
use crate::records::{ArtistTarget, JoinedRow};
use crate::retry::{with_retry, RetryPolicy, Retrying};
use crate::session::Session;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Result of crawling one batch of artists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Number of artists in the batch
    pub artists: usize,
    pub rows: Vec<JoinedRow>,
}

impl BatchOutcome {
    fn empty(artists: usize) -> Self {
        Self {
            artists,
            rows: Vec::new(),
        }
    }

    /// Rows whose stats are unavailable
    pub fn degraded_rows(&self) -> usize {
        self.rows.iter().filter(|row| !row.has_stats()).count()
    }
}

/// Three-stage crawl over a worker pool
pub struct CrawlPipeline<S, E> {
    pool: WorkerPool<S>,
    collections: Arc<Retrying<CollectionsStage<E>>>,
    contents: Arc<Retrying<ContentStage<E>>>,
    stats: Arc<Retrying<StatsStage<E>>>,
    batch_size: usize,
}

impl<S, E> CrawlPipeline<S, E>
where
    S: Session,
    E: Extractor<S>,
{
    pub fn new(pool: WorkerPool<S>, extractor: Arc<E>, policy: RetryPolicy, batch_size: usize) -> Self {
        Self {
            pool,
            collections: Arc::new(with_retry(
                CollectionsStage::new(Arc::clone(&extractor)),
                policy,
            )),
            contents: Arc::new(with_retry(ContentStage::new(Arc::clone(&extractor)), policy)),
            stats: Arc::new(with_retry(StatsStage::new(extractor), policy)),
            batch_size: batch_size.max(1),
        }
    }

    pub fn pool(&self) -> &WorkerPool<S> {
        &self.pool
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Splits pending artists into batches, keeping their order
    pub fn batches(&self, pending: &[ArtistTarget]) -> Vec<Vec<ArtistTarget>> {
        pending
            .chunks(self.batch_size)
            .map(<[ArtistTarget]>::to_vec)
            .collect()
    }

    /// Crawls one batch of artists and joins the stage outputs
    ///
    /// A batch in which no collection, or no content item, is found ends
    /// early with no rows.
    pub async fn run_batch(&self, batch: Vec<ArtistTarget>) -> Result<BatchOutcome, PoolError> {
        let artists = batch.len();

        let collections: Vec<_> = self
            .pool
            .map(Arc::clone(&self.collections), batch)
            .await?
            .into_iter()
            .flatten()
            .collect();
        if collections.is_empty() {
            tracing::info!("No collections found for this batch");
            return Ok(BatchOutcome::empty(artists));
        }

        let collection_keys = unique_keys(collections.iter().map(|c| c.collection_key.as_str()));
        tracing::info!("Fetching content of {} collections", collection_keys.len());
        let contents: Vec<_> = self
            .pool
            .map(Arc::clone(&self.contents), collection_keys)
            .await?
            .into_iter()
            .flatten()
            .collect();
        if contents.is_empty() {
            tracing::info!("No content items found for this batch");
            return Ok(BatchOutcome::empty(artists));
        }

        let content_keys = unique_keys(contents.iter().map(|c| c.content_key.as_str()));
        tracing::info!("Fetching stats of {} content items", content_keys.len());
        let stats = self.pool.map(Arc::clone(&self.stats), content_keys).await?;

        let rows = join_rows(&collections, &contents, &stats);
        Ok(BatchOutcome { artists, rows })
    }

    /// Crawls every pending artist, appending each batch to `store`
    pub async fn run(
        &self,
        pending: Vec<ArtistTarget>,
        store: &mut ProgressStore,
    ) -> crate::Result<RunSummary> {
        let start = Instant::now();
        let batches = self.batches(&pending);
        let total = batches.len();
        let mut summary = RunSummary::default();

        tracing::info!(
            "Crawling {} artists in {} batches of up to {}",
            pending.len(),
            total,
            self.batch_size
        );

        for (index, batch) in batches.into_iter().enumerate() {
            tracing::info!("Batch {}/{} ({} artists)", index + 1, total, batch.len());

            let outcome = self.run_batch(batch).await?;
            let written = store.append(&outcome.rows)?;
            summary.record_batch(outcome.artists, written, outcome.degraded_rows());

            let elapsed = start.elapsed();
            tracing::info!(
                "Progress: {}/{} batches, {} rows written, {:.1}s elapsed",
                index + 1,
                total,
                summary.rows_written,
                elapsed.as_secs_f64()
            );
        }

        summary.elapsed = start.elapsed();
        summary.log();
        Ok(summary)
    }
}

/// Keys in first-seen order without duplicates
fn unique_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}
