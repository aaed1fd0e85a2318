use serde::Deserialize;

/// Main configuration structure for Artist-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Crawl orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of page sessions in the worker pool (defaults to physical cores x 3)
    #[serde(default)]
    pub workers: Option<usize>,

    /// Number of artists crawled end-to-end before progress is persisted
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound on the number of items handed to one worker at a time
    #[serde(rename = "max-chunk-size", default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Attempts per unit of work before a degraded record is emitted
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts (milliseconds, doubled per retry)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Cap on the delay between attempts (milliseconds)
    #[serde(rename = "retry-backoff-max-ms", default = "default_retry_backoff_max_ms")]
    pub retry_backoff_max_ms: u64,

    /// What to do when a session cannot be started
    #[serde(rename = "worker-init", default)]
    pub worker_init: WorkerInit,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            batch_size: default_batch_size(),
            max_chunk_size: default_max_chunk_size(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_backoff_max_ms: default_retry_backoff_max_ms(),
            worker_init: WorkerInit::default(),
        }
    }
}

impl CrawlerConfig {
    /// Resolves the worker count, falling back to three workers per physical core
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get_physical().max(1) * 3)
    }
}

/// Session startup failure handling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkerInit {
    /// Keep retrying until the session starts
    #[default]
    Retry,
    /// Abort the run on the first failure
    FailFast,
}

/// Page session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// User agent sent with every page request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Time allowed for a page to load (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Time allowed to establish a connection (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Site layout: where pages live and which selectors pick values out of them
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL used to resolve relative links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path appended to an artist URL to reach the artist's collections page
    #[serde(rename = "collections-path", default = "default_collections_path")]
    pub collections_path: String,

    #[serde(rename = "artist-name")]
    pub artist_name: String,

    #[serde(rename = "collection-link")]
    pub collection_link: String,

    /// Collection hrefs containing any of these substrings are skipped
    #[serde(rename = "collection-exclude", default)]
    pub collection_exclude: Vec<String>,

    #[serde(rename = "collection-name")]
    pub collection_name: String,

    #[serde(rename = "photo-link")]
    pub photo_link: String,

    #[serde(rename = "video-link")]
    pub video_link: String,

    pub title: String,
    pub views: String,
    pub downloads: String,
    pub likes: String,

    #[serde(rename = "upload-date")]
    pub upload_date: String,

    /// chrono format string used to read the upload date text
    #[serde(rename = "date-format", default = "default_date_format")]
    pub date_format: String,
}

/// Input and output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// File with one artist URL per line
    #[serde(rename = "artists-path")]
    pub artists_path: String,

    /// Append-only CSV file receiving joined rows
    #[serde(rename = "data-path")]
    pub data_path: String,

    /// How degraded or missing values are written
    #[serde(rename = "degraded-marker", default)]
    pub degraded_marker: DegradedMarker,
}

/// Representation of values that could not be extracted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DegradedMarker {
    /// Write the literal `unavailable`
    #[default]
    Sentinel,
    /// Leave the cell empty
    Missing,
}

impl DegradedMarker {
    pub const SENTINEL: &'static str = "unavailable";

    /// Returns the cell text used for a missing value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sentinel => Self::SENTINEL,
            Self::Missing => "",
        }
    }
}

fn default_batch_size() -> usize {
    5
}

fn default_max_chunk_size() -> usize {
    2000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_retry_backoff_max_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("artist-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_timeout_secs() -> u64 {
    20
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_collections_path() -> String {
    "/collections/".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}
