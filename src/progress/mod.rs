//! Crawl progress persisted in the output file itself
//!
//! The output CSV doubles as the progress ledger: an artist whose key
//! appears in it has been crawled. A restarted run reads the ledger once,
//! skips those artists and keeps appending.

mod store;
mod targets;

pub use store::{ProgressStore, HEADER};
pub use targets::{load_targets, parse_targets};

use thiserror::Error;

/// Errors raised while reading or appending to the output file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{path} has no '{column}' column")]
    MissingColumn { path: String, column: String },
}
