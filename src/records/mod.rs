//! Records produced by the crawl stages
//!
//! Each stage of the pipeline emits one record type, keyed by the
//! identifier the next stage consumes:
//!
//! - [`CollectionRecord`] per (artist, collection), keyed by artist
//! - [`ContentRecord`] per (collection, content item), keyed by collection
//! - [`StatsRecord`] per content item, keyed by content
//!
//! [`JoinedRow`] carries the full lineage of one content item and is what
//! ends up in the output file.

use crate::config::DegradedMarker;
use chrono::NaiveDate;
use std::fmt;

/// Identifier (URL) of an artist to crawl
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtistTarget(String);

impl ArtistTarget {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtistTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtistTarget {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ArtistTarget {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// One collection owned by an artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub artist_key: String,
    pub collection_key: String,
    pub artist_name: String,
}

/// Kind of a content item, as told apart by the collection page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Photo,
    Video,
    Unknown,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Unknown => "",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "photo" => Self::Photo,
            "video" => Self::Video,
            _ => Self::Unknown,
        }
    }
}

/// One content item inside a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub collection_key: String,
    pub content_key: String,
    pub collection_name: String,
    pub kind: ContentKind,
}

/// Engagement values read from a content page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsValues {
    /// Empty when the page has no title
    pub title: String,
    pub views: u64,
    pub downloads: u64,
    pub likes: u64,
    pub upload_date: NaiveDate,
}

/// Statistics for one content item
///
/// `values` is `None` for a degraded record, i.e. one whose extraction
/// failed for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRecord {
    pub content_key: String,
    pub values: Option<StatsValues>,
}

impl StatsRecord {
    pub fn new(content_key: impl Into<String>, values: StatsValues) -> Self {
        Self {
            content_key: content_key.into(),
            values: Some(values),
        }
    }

    /// Creates a record with every value field unavailable
    pub fn degraded(content_key: impl Into<String>) -> Self {
        Self {
            content_key: content_key.into(),
            values: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.values.is_none()
    }

    /// Renders title, views, downloads, likes and upload date as cells
    pub fn cells(&self, marker: DegradedMarker) -> [String; 5] {
        stats_cells(self.values.as_ref(), marker)
    }
}

/// One output row: artist → collection → content → stats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub artist_key: String,
    pub artist_name: String,
    pub collection_key: String,
    pub collection_name: String,
    pub content_key: String,
    pub kind: ContentKind,
    /// `None` when stats are missing or degraded
    pub stats: Option<StatsValues>,
}

impl JoinedRow {
    pub fn has_stats(&self) -> bool {
        self.stats.is_some()
    }

    /// Renders the stats columns of this row as cells
    pub fn stats_cells(&self, marker: DegradedMarker) -> [String; 5] {
        stats_cells(self.stats.as_ref(), marker)
    }
}

fn stats_cells(values: Option<&StatsValues>, marker: DegradedMarker) -> [String; 5] {
    match values {
        Some(v) => [
            v.title.clone(),
            v.views.to_string(),
            v.downloads.to_string(),
            v.likes.to_string(),
            v.upload_date.format("%Y-%m-%d").to_string(),
        ],
        None => std::array::from_fn(|_| marker.as_str().to_string()),
    }
}
