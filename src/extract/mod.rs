//! Extraction of listings and statistics from pages
//!
//! An [`Extractor`] drives a [`Session`] to the page it needs and reads the
//! values out of it. Each call maps to one stage of the crawl:
//!
//! - `fetch_collections`: an artist's name and collection links
//! - `fetch_content_items`: a collection's name and content links
//! - `fetch_stats`: a content item's engagement values

mod selector;
mod values;

pub use selector::SelectorExtractor;
pub use values::{parse_count, parse_date};

use crate::records::{ArtistTarget, ContentKind, StatsValues};
use crate::session::{Session, WorkError};
use async_trait::async_trait;

/// What an artist's collections page lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionListing {
    pub artist_name: String,
    /// Absolute collection URLs, in page order, without duplicates
    pub collection_keys: Vec<String>,
}

/// One content link found on a collection page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLink {
    pub key: String,
    pub kind: ContentKind,
}

/// What a collection page lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentListing {
    pub collection_name: String,
    pub items: Vec<ContentLink>,
}

/// Reads the values each crawl stage needs from site pages
#[async_trait]
pub trait Extractor<S: Session>: Send + Sync + 'static {
    async fn fetch_collections(
        &self,
        session: &mut S,
        artist: &ArtistTarget,
    ) -> Result<CollectionListing, WorkError>;

    async fn fetch_content_items(
        &self,
        session: &mut S,
        collection_key: &str,
    ) -> Result<ContentListing, WorkError>;

    async fn fetch_stats(&self, session: &mut S, content_key: &str)
        -> Result<StatsValues, WorkError>;
}
