use crate::config::DegradedMarker;
use crate::progress::StoreError;
use crate::records::{ArtistTarget, JoinedRow};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Output columns, in order
pub const HEADER: [&str; 11] = [
    "artist_url",
    "artist_name",
    "collection_url",
    "collection_name",
    "content_url",
    "content_type",
    "title",
    "views",
    "downloads",
    "likes",
    "upload_date",
];

const ARTIST_COLUMN: &str = "artist_url";

/// Append-only CSV output and the set of artists it already holds
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    marker: DegradedMarker,
    completed: HashSet<String>,
}

impl ProgressStore {
    /// Opens the output file, reading the artists it already contains
    ///
    /// A missing or empty file yields an empty ledger. Rows that cannot be
    /// read are skipped with a warning. A file that does not end in a
    /// newline was cut off mid-write: the partial row is truncated away and
    /// its artist is left out of the ledger so it is crawled again.
    pub fn open(path: impl AsRef<Path>, marker: DegradedMarker) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let completed = if is_empty_or_missing(&path)? {
            HashSet::new()
        } else {
            read_ledger(&path)?
        };

        tracing::info!(
            "{} artists already present in {}",
            completed.len(),
            path.display()
        );

        Ok(Self {
            path,
            marker,
            completed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of artists with rows in the output
    pub fn completed(&self) -> usize {
        self.completed.len()
    }

    pub fn is_complete(&self, target: &ArtistTarget) -> bool {
        self.completed.contains(target.as_str())
    }

    /// Targets still to crawl, in input order and without duplicates
    pub fn pending(&self, targets: &[ArtistTarget]) -> Vec<ArtistTarget> {
        let mut seen = HashSet::new();
        targets
            .iter()
            .filter(|target| !self.is_complete(target))
            .filter(|target| seen.insert(*target))
            .cloned()
            .collect()
    }

    /// Appends rows to the output file and records their artists
    ///
    /// The whole batch is serialised first and written with a single append
    /// followed by fsync. The header is written only into a missing or
    /// empty file. Returns the number of rows written.
    pub fn append(&mut self, rows: &[JoinedRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let write_header = is_empty_or_missing(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        if write_header {
            writer.write_record(HEADER)?;
        }
        for row in rows {
            writer.write_record(self.cells(row))?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&buffer)?;
        file.sync_all()?;

        for row in rows {
            self.completed.insert(row.artist_key.clone());
        }

        tracing::debug!("Appended {} rows to {}", rows.len(), self.path.display());
        Ok(rows.len())
    }

    fn cells(&self, row: &JoinedRow) -> [String; 11] {
        let [title, views, downloads, likes, upload_date] = row.stats_cells(self.marker);
        [
            row.artist_key.clone(),
            row.artist_name.clone(),
            row.collection_key.clone(),
            row.collection_name.clone(),
            row.content_key.clone(),
            row.kind.as_str().to_string(),
            title,
            views,
            downloads,
            likes,
            upload_date,
        ]
    }
}

fn is_empty_or_missing(path: &Path) -> Result<bool, StoreError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

fn ends_with_newline(path: &Path) -> Result<bool, StoreError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn truncate(path: &Path, len: u64) -> Result<(), StoreError> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()?;
    Ok(())
}

/// A data row as seen while reading the ledger
struct LedgerRow {
    /// Byte offset where the row starts
    start: u64,
    artist: Option<String>,
    complete: bool,
}

impl LedgerRow {
    fn commit(self, path: &Path, completed: &mut HashSet<String>, skipped: &mut usize) {
        if !self.complete {
            *skipped += 1;
            tracing::warn!(
                "Skipping unreadable row at byte {} of {}",
                self.start,
                path.display()
            );
            return;
        }
        if let Some(artist) = self.artist.filter(|a| !a.is_empty()) {
            completed.insert(artist);
        }
    }
}

fn read_ledger(path: &Path) -> Result<HashSet<String>, StoreError> {
    let torn = !ends_with_newline(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut record = csv::ByteRecord::new();
    if !reader.read_byte_record(&mut record)? {
        return Ok(HashSet::new());
    }
    let width = record.len();
    let column = record.iter().position(|name| name == ARTIST_COLUMN.as_bytes());
    let column = match column {
        Some(column) => column,
        // Only a partial header made it to disk
        None if torn && !reader.read_byte_record(&mut record)? => {
            drop(reader);
            tracing::warn!("{} holds a partial header; truncating it", path.display());
            truncate(path, 0)?;
            return Ok(HashSet::new());
        }
        None => {
            return Err(StoreError::MissingColumn {
                path: path.display().to_string(),
                column: ARTIST_COLUMN.to_string(),
            })
        }
    };

    let mut completed = HashSet::new();
    let mut skipped = 0usize;
    // The last row is held back until the next one is read, since a torn
    // file's last row is partial.
    let mut last: Option<LedgerRow> = None;
    loop {
        let start = reader.position().byte();
        if !reader.read_byte_record(&mut record)? {
            break;
        }
        let row = LedgerRow {
            start,
            artist: record
                .get(column)
                .map(|artist| String::from_utf8_lossy(artist).into_owned()),
            complete: record.len() == width,
        };
        if let Some(previous) = last.replace(row) {
            previous.commit(path, &mut completed, &mut skipped);
        }
    }
    drop(reader);

    match last {
        Some(row) if torn => {
            tracing::warn!(
                "{} ends with a partial row; truncating it at byte {}",
                path.display(),
                row.start
            );
            truncate(path, row.start)?;
            if let Some(artist) = row.artist {
                if completed.remove(&artist) {
                    tracing::warn!(
                        "Artist {} lost rows in the partial write; crawling it again",
                        artist
                    );
                }
            }
        }
        Some(row) => row.commit(path, &mut completed, &mut skipped),
        None if torn => {
            tracing::warn!("{} holds a partial header; truncating it", path.display());
            truncate(path, 0)?;
        }
        None => {}
    }

    if skipped > 0 {
        tracing::warn!("{} rows of {} could not be read", skipped, path.display());
    }
    Ok(completed)
}
