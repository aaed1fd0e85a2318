//! Statistics over an existing output file
//!
//! Backs the `--stats` flag: reads the CSV and counts what it holds.

use crate::config::DegradedMarker;
use crate::progress::StoreError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Summary of the rows in an output file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataStatistics {
    pub total_rows: u64,
    pub unique_artists: u64,
    pub unique_collections: u64,
    pub unique_content: u64,
    /// Rows whose stats columns all hold the degraded marker
    pub degraded_rows: u64,
    /// Rows skipped because they could not be read
    pub unreadable_rows: u64,
    /// Row count per content type
    pub rows_by_type: HashMap<String, u64>,
}

impl DataStatistics {
    /// Rows with real stats, as a percentage of all rows
    pub fn success_rate(&self) -> f64 {
        if self.total_rows > 0 {
            (self.total_rows - self.degraded_rows) as f64 / self.total_rows as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Reads statistics from the output file at `path`
pub fn load_statistics(
    path: impl AsRef<Path>,
    marker: DegradedMarker,
) -> Result<DataStatistics, StoreError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StoreError::MissingColumn {
                path: path.display().to_string(),
                column: name.to_string(),
            })
    };
    let artist = column("artist_url")?;
    let collection = column("collection_url")?;
    let content = column("content_url")?;
    let content_type = column("content_type")?;
    let value_columns = [
        column("views")?,
        column("downloads")?,
        column("likes")?,
        column("upload_date")?,
    ];

    let mut stats = DataStatistics::default();
    let mut artists = HashSet::new();
    let mut collections = HashSet::new();
    let mut contents = HashSet::new();

    for record in reader.records() {
        let Ok(record) = record else {
            stats.unreadable_rows += 1;
            continue;
        };
        stats.total_rows += 1;

        let cell = |index: usize| record.get(index).unwrap_or_default();
        artists.insert(cell(artist).to_string());
        collections.insert(cell(collection).to_string());
        contents.insert(cell(content).to_string());

        let kind = match cell(content_type) {
            "" => "unknown",
            other => other,
        };
        *stats.rows_by_type.entry(kind.to_string()).or_insert(0) += 1;

        if value_columns
            .iter()
            .all(|&index| cell(index) == marker.as_str())
        {
            stats.degraded_rows += 1;
        }
    }

    stats.unique_artists = artists.len() as u64;
    stats.unique_collections = collections.len() as u64;
    stats.unique_content = contents.len() as u64;
    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DataStatistics) {
    println!("=== Output Statistics ===\n");

    println!("Overview:");
    println!("  Total rows: {}", stats.total_rows);
    println!("  Unique artists: {}", stats.unique_artists);
    println!("  Unique collections: {}", stats.unique_collections);
    println!("  Unique content items: {}", stats.unique_content);
    println!();

    if !stats.rows_by_type.is_empty() {
        println!("Rows by Content Type:");
        let mut type_counts: Vec<_> = stats.rows_by_type.iter().collect();
        type_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in type_counts {
            let percentage = if stats.total_rows > 0 {
                (*count as f64 / stats.total_rows as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", kind, count, percentage);
        }
        println!();
    }

    if stats.unreadable_rows > 0 {
        println!("Unreadable rows skipped: {}", stats.unreadable_rows);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} rows with stats)",
        stats.success_rate(),
        stats.total_rows - stats.degraded_rows,
        stats.total_rows
    );
}
