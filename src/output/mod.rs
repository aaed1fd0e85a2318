//! Reporting on crawl results
//!
//! - [`RunSummary`]: totals of one run, logged when the run ends
//! - [`load_statistics`] / [`print_statistics`]: counts over an existing
//!   output file

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, DataStatistics};
pub use summary::RunSummary;
