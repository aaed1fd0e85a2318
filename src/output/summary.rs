use std::time::Duration;

/// Totals of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub artists: usize,
    pub rows_written: usize,
    /// Rows whose stats could not be extracted
    pub degraded_rows: usize,
    /// Batches in which no collection or no content item was found
    pub empty_batches: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Adds one finished batch to the totals
    pub fn record_batch(&mut self, artists: usize, rows_written: usize, degraded_rows: usize) {
        self.batches += 1;
        self.artists += artists;
        self.rows_written += rows_written;
        self.degraded_rows += degraded_rows;
        if rows_written == 0 {
            self.empty_batches += 1;
        }
    }

    /// Artists per minute over the whole run
    pub fn artists_per_minute(&self) -> f64 {
        let minutes = self.elapsed.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.artists as f64 / minutes
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        tracing::info!("=== Run Summary ===");
        tracing::info!("Batches: {} ({} empty)", self.batches, self.empty_batches);
        tracing::info!(
            "Artists: {} ({:.1}/min)",
            self.artists,
            self.artists_per_minute()
        );
        tracing::info!(
            "Rows written: {} ({} with unavailable stats)",
            self.rows_written,
            self.degraded_rows
        );
        tracing::info!("Elapsed: {:.1}s", self.elapsed.as_secs_f64());
    }
}
