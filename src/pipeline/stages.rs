//! The three crawl stages as retryable units of work

use crate::extract::Extractor;
use crate::records::{ArtistTarget, CollectionRecord, ContentRecord, StatsRecord};
use crate::retry::FallibleWork;
use crate::session::{Session, WorkError};
use async_trait::async_trait;
use std::sync::Arc;

/// Stage 1: an artist's collections
pub struct CollectionsStage<E> {
    pub(crate) extractor: Arc<E>,
}

/// Stage 2: a collection's content items
pub struct ContentStage<E> {
    pub(crate) extractor: Arc<E>,
}

/// Stage 3: a content item's statistics
pub struct StatsStage<E> {
    pub(crate) extractor: Arc<E>,
}

impl<E> CollectionsStage<E> {
    pub fn new(extractor: Arc<E>) -> Self {
        Self { extractor }
    }
}

impl<E> ContentStage<E> {
    pub fn new(extractor: Arc<E>) -> Self {
        Self { extractor }
    }
}

impl<E> StatsStage<E> {
    pub fn new(extractor: Arc<E>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl<S, E> FallibleWork<S> for CollectionsStage<E>
where
    S: Session,
    E: Extractor<S>,
{
    type Input = ArtistTarget;
    type Output = Vec<CollectionRecord>;

    async fn attempt(
        &self,
        session: &mut S,
        artist: &ArtistTarget,
    ) -> Result<Vec<CollectionRecord>, WorkError> {
        let listing = self.extractor.fetch_collections(session, artist).await?;
        Ok(listing
            .collection_keys
            .into_iter()
            .map(|collection_key| CollectionRecord {
                artist_key: artist.as_str().to_string(),
                collection_key,
                artist_name: listing.artist_name.clone(),
            })
            .collect())
    }

    fn degraded(&self, _artist: &ArtistTarget) -> Vec<CollectionRecord> {
        Vec::new()
    }

    fn describe(&self, artist: &ArtistTarget) -> String {
        format!("Collections of {}", artist)
    }
}

#[async_trait]
impl<S, E> FallibleWork<S> for ContentStage<E>
where
    S: Session,
    E: Extractor<S>,
{
    type Input = String;
    type Output = Vec<ContentRecord>;

    async fn attempt(
        &self,
        session: &mut S,
        collection_key: &String,
    ) -> Result<Vec<ContentRecord>, WorkError> {
        let listing = self
            .extractor
            .fetch_content_items(session, collection_key)
            .await?;
        Ok(listing
            .items
            .into_iter()
            .map(|item| ContentRecord {
                collection_key: collection_key.clone(),
                content_key: item.key,
                collection_name: listing.collection_name.clone(),
                kind: item.kind,
            })
            .collect())
    }

    fn degraded(&self, collection_key: &String) -> Vec<ContentRecord> {
        tracing::warn!(
            "Collection {} could not be read; its items are left out of the output",
            collection_key
        );
        Vec::new()
    }

    fn describe(&self, collection_key: &String) -> String {
        format!("Content of {}", collection_key)
    }
}

#[async_trait]
impl<S, E> FallibleWork<S> for StatsStage<E>
where
    S: Session,
    E: Extractor<S>,
{
    type Input = String;
    type Output = StatsRecord;

    async fn attempt(&self, session: &mut S, content_key: &String) -> Result<StatsRecord, WorkError> {
        let values = self.extractor.fetch_stats(session, content_key).await?;
        Ok(StatsRecord::new(content_key.clone(), values))
    }

    fn degraded(&self, content_key: &String) -> StatsRecord {
        StatsRecord::degraded(content_key.clone())
    }

    fn describe(&self, content_key: &String) -> String {
        format!("Stats of {}", content_key)
    }
}
