//! Shared fixtures: a session that detects concurrent use and a scripted site

use artist_harvest::config::DegradedMarker;
use artist_harvest::extract::{CollectionListing, ContentLink, ContentListing, Extractor};
use artist_harvest::progress::ProgressStore;
use artist_harvest::records::{ArtistTarget, ContentKind, StatsValues};
use artist_harvest::retry::Backoff;
use artist_harvest::session::{Page, Session, SessionError, WorkError};
use artist_harvest::{CrawlPipeline, RetryPolicy, WorkerPool};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Usage counters shared by every session of a pool
#[derive(Debug, Default)]
pub struct Usage {
    in_use: Mutex<HashMap<usize, usize>>,
    pub overlaps: AtomicUsize,
    pub loads: AtomicUsize,
}

impl Usage {
    fn enter(&self, id: usize) {
        let mut in_use = self.in_use.lock().unwrap();
        let count = in_use.entry(id).or_insert(0);
        if *count > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        *count += 1;
    }

    fn leave(&self, id: usize) {
        let mut in_use = self.in_use.lock().unwrap();
        if let Some(count) = in_use.get_mut(&id) {
            *count -= 1;
        }
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}

/// Session that records whether two tasks ever use it at the same time
pub struct CountingSession {
    pub id: usize,
    usage: Arc<Usage>,
    page: Option<Page>,
}

impl CountingSession {
    pub fn new(id: usize, usage: Arc<Usage>) -> Self {
        Self {
            id,
            usage,
            page: None,
        }
    }
}

#[async_trait]
impl Session for CountingSession {
    async fn goto(&mut self, url: &str) -> Result<(), WorkError> {
        self.usage.enter(self.id);
        self.usage.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.page = Some(Page {
            url: url.to_string(),
            body: String::new(),
        });
        self.usage.leave(self.id);
        Ok(())
    }

    fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    async fn reset(&mut self) -> Result<(), WorkError> {
        self.page = None;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.page = None;
        Ok(())
    }
}

/// Extractor answering from in-memory maps
///
/// Every fetch navigates the session first, so concurrent use of a session
/// shows up in [`Usage`].
#[derive(Default)]
pub struct ScriptedSite {
    artists: HashMap<String, Vec<String>>,
    collections: HashMap<String, Vec<String>>,
    always_timeout: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedSite {
    pub fn artist(mut self, artist: &str, collections: &[&str]) -> Self {
        self.artists.insert(
            artist.to_string(),
            collections.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn collection(mut self, collection: &str, items: &[&str]) -> Self {
        self.collections.insert(
            collection.to_string(),
            items.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Makes every stats fetch of `content` time out
    pub fn timing_out(mut self, content: &str) -> Self {
        self.always_timeout.insert(content.to_string());
        self
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    fn count(&self, key: &str) {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert(0) += 1;
    }
}

#[async_trait]
impl Extractor<CountingSession> for ScriptedSite {
    async fn fetch_collections(
        &self,
        session: &mut CountingSession,
        artist: &ArtistTarget,
    ) -> Result<CollectionListing, WorkError> {
        self.count(artist.as_str());
        session.goto(artist.as_str()).await?;
        Ok(CollectionListing {
            artist_name: format!("Artist {}", artist),
            collection_keys: self
                .artists
                .get(artist.as_str())
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn fetch_content_items(
        &self,
        session: &mut CountingSession,
        collection_key: &str,
    ) -> Result<ContentListing, WorkError> {
        self.count(collection_key);
        session.goto(collection_key).await?;
        let items = self
            .collections
            .get(collection_key)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|key| ContentLink {
                kind: if key.contains("video") {
                    ContentKind::Video
                } else {
                    ContentKind::Photo
                },
                key,
            })
            .collect();
        Ok(ContentListing {
            collection_name: format!("Collection {}", collection_key),
            items,
        })
    }

    async fn fetch_stats(
        &self,
        session: &mut CountingSession,
        content_key: &str,
    ) -> Result<StatsValues, WorkError> {
        self.count(content_key);
        session.goto(content_key).await?;
        if self.always_timeout.contains(content_key) {
            return Err(WorkError::Timeout {
                url: content_key.to_string(),
            });
        }
        Ok(StatsValues {
            title: format!("Title {}", content_key),
            views: 100,
            downloads: 10,
            likes: 1,
            upload_date: NaiveDate::from_ymd_opt(2021, 3, 9).unwrap(),
        })
    }
}

pub fn counting_pool(workers: usize, usage: &Arc<Usage>) -> WorkerPool<CountingSession> {
    let sessions = (0..workers)
        .map(|id| CountingSession::new(id, Arc::clone(usage)))
        .collect();
    WorkerPool::from_sessions(sessions, 2000).unwrap()
}

pub fn scripted_pipeline(
    site: Arc<ScriptedSite>,
    workers: usize,
    batch_size: usize,
    max_attempts: u32,
) -> (CrawlPipeline<CountingSession, ScriptedSite>, Arc<Usage>) {
    let usage = Arc::new(Usage::default());
    let pool = counting_pool(workers, &usage);
    let pipeline = CrawlPipeline::new(
        pool,
        site,
        RetryPolicy::new(max_attempts, Backoff::none()),
        batch_size,
    );
    (pipeline, usage)
}

pub fn targets(keys: &[&str]) -> Vec<ArtistTarget> {
    keys.iter().map(|k| ArtistTarget::new(*k)).collect()
}

pub fn open_store(path: &Path) -> ProgressStore {
    ProgressStore::open(path, DegradedMarker::Sentinel).unwrap()
}

/// Reads the output file back as header-keyed rows
pub fn read_rows(path: &Path) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect()
        })
        .collect()
}
