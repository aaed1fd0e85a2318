//! Artist-Harvest: a resumable collection crawler
//!
//! This crate crawls a content site artist by artist, walking each artist's
//! collections down to individual content items and their engagement
//! statistics. Work is spread over a fixed pool of page sessions, transient
//! page failures are retried, and every finished batch is appended to a CSV
//! file so an interrupted run picks up where it stopped.

pub mod config;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod records;
pub mod retry;
pub mod session;

use thiserror::Error;

/// Main error type for Artist-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] pool::PoolError),

    #[error("Progress store error: {0}")]
    Store(#[from] progress::StoreError),

    #[error("Failed to read targets from {path}: {source}")]
    Targets {
        path: String,
        source: std::io::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Artist-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{CrawlPipeline, RunSummary};
pub use pool::{UnitOfWork, WorkerPool};
pub use records::{ArtistTarget, CollectionRecord, ContentRecord, JoinedRow, StatsRecord};
pub use retry::{with_retry, RetryPolicy};
pub use session::{Session, SessionFactory, WorkError};
