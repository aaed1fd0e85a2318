//! The crawl pipeline
//!
//! Artists → collections → content items → stats, joined into one row per
//! content item and appended batch by batch to the output file.

mod coordinator;
mod join;
mod stages;

pub use crate::output::RunSummary;
pub use coordinator::{BatchOutcome, CrawlPipeline};
pub use join::join_rows;
pub use stages::{CollectionsStage, ContentStage, StatsStage};
