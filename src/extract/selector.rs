//! Extractor driven by CSS selectors from the `[site]` config section
//!
//! Markup is parsed with `scraper` in plain functions that return owned
//! values, so no parsed document is held across an await point.

use crate::config::SiteConfig;
use crate::extract::values::{parse_count, parse_date};
use crate::extract::{CollectionListing, ContentLink, ContentListing, Extractor};
use crate::records::{ArtistTarget, ContentKind, StatsValues};
use crate::session::{Page, Session, WorkError};
use crate::ConfigError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Compiled selectors for every value the crawl reads
#[derive(Debug)]
struct Selectors {
    artist_name: Selector,
    collection_link: Selector,
    collection_name: Selector,
    photo_link: Selector,
    video_link: Selector,
    title: Selector,
    views: Selector,
    downloads: Selector,
    likes: Selector,
    upload_date: Selector,
}

/// Configuration-driven [`Extractor`] usable with any session
#[derive(Debug)]
pub struct SelectorExtractor {
    base_url: Url,
    collections_path: String,
    collection_exclude: Vec<String>,
    date_format: String,
    selectors: Selectors,
}

fn compile(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, selector, e)))
}

impl SelectorExtractor {
    pub fn from_config(site: &SiteConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&site.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", site.base_url, e)))?;

        let selectors = Selectors {
            artist_name: compile("artist-name", &site.artist_name)?,
            collection_link: compile("collection-link", &site.collection_link)?,
            collection_name: compile("collection-name", &site.collection_name)?,
            photo_link: compile("photo-link", &site.photo_link)?,
            video_link: compile("video-link", &site.video_link)?,
            title: compile("title", &site.title)?,
            views: compile("views", &site.views)?,
            downloads: compile("downloads", &site.downloads)?,
            likes: compile("likes", &site.likes)?,
            upload_date: compile("upload-date", &site.upload_date)?,
        };

        Ok(Self {
            base_url,
            collections_path: site.collections_path.clone(),
            collection_exclude: site.collection_exclude.clone(),
            date_format: site.date_format.clone(),
            selectors,
        })
    }

    /// URL of the page listing an artist's collections
    pub fn collections_url(&self, artist: &ArtistTarget) -> String {
        let artist = artist.as_str().trim_end_matches('/');
        if self.collections_path.starts_with('/') {
            format!("{}{}", artist, self.collections_path)
        } else {
            format!("{}/{}", artist, self.collections_path)
        }
    }

    pub fn parse_collections(&self, page: &Page) -> Result<CollectionListing, WorkError> {
        let document = Html::parse_document(&page.body);

        let artist_name = required_text(&document, &self.selectors.artist_name)
            .ok_or_else(|| missing(page, "artist-name"))?;

        let hrefs = document
            .select(&self.selectors.collection_link)
            .filter_map(|element| element.value().attr("href"))
            .filter(|href| {
                !self
                    .collection_exclude
                    .iter()
                    .any(|pattern| href.contains(pattern.as_str()))
            });

        Ok(CollectionListing {
            artist_name,
            collection_keys: self.resolve_unique(hrefs),
        })
    }

    pub fn parse_content_items(&self, page: &Page) -> Result<ContentListing, WorkError> {
        let document = Html::parse_document(&page.body);

        let collection_name = required_text(&document, &self.selectors.collection_name)
            .ok_or_else(|| missing(page, "collection-name"))?;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        let kinds = [
            (&self.selectors.photo_link, ContentKind::Photo),
            (&self.selectors.video_link, ContentKind::Video),
        ];
        for (selector, kind) in kinds {
            for element in document.select(selector) {
                let Some(key) = element
                    .value()
                    .attr("href")
                    .and_then(|href| resolve_link(href, &self.base_url))
                else {
                    continue;
                };
                if seen.insert(key.clone()) {
                    items.push(ContentLink { key, kind });
                }
            }
        }

        Ok(ContentListing {
            collection_name,
            items,
        })
    }

    pub fn parse_stats(&self, page: &Page) -> Result<StatsValues, WorkError> {
        let document = Html::parse_document(&page.body);

        let title = required_text(&document, &self.selectors.title).unwrap_or_default();

        let count = |selector: &Selector, name: &str| {
            required_text(&document, selector)
                .and_then(|text| parse_count(&text))
                .ok_or_else(|| missing(page, name))
        };
        let views = count(&self.selectors.views, "views")?;
        let downloads = count(&self.selectors.downloads, "downloads")?;
        let likes = count(&self.selectors.likes, "likes")?;

        let upload_date = required_text(&document, &self.selectors.upload_date)
            .and_then(|text| parse_date(&text, &self.date_format))
            .ok_or_else(|| missing(page, "upload-date"))?;

        Ok(StatsValues {
            title,
            views,
            downloads,
            likes,
            upload_date,
        })
    }

    /// Resolves hrefs against the base URL, keeping the first occurrence
    fn resolve_unique<'a>(&self, hrefs: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        hrefs
            .filter_map(|href| resolve_link(href, &self.base_url))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

async fn load<'s, S: Session>(session: &'s mut S, url: &str) -> Result<&'s Page, WorkError> {
    session.goto(url).await?;
    session.page().ok_or(WorkError::NoPage)
}

#[async_trait]
impl<S: Session> Extractor<S> for SelectorExtractor {
    async fn fetch_collections(
        &self,
        session: &mut S,
        artist: &ArtistTarget,
    ) -> Result<CollectionListing, WorkError> {
        let url = self.collections_url(artist);
        let page = load(session, &url).await?;
        let listing = self.parse_collections(page)?;
        tracing::info!(
            "Found {} collections from \"{}\"",
            listing.collection_keys.len(),
            listing.artist_name
        );
        Ok(listing)
    }

    async fn fetch_content_items(
        &self,
        session: &mut S,
        collection_key: &str,
    ) -> Result<ContentListing, WorkError> {
        let page = load(session, collection_key).await?;
        let listing = self.parse_content_items(page)?;
        tracing::info!(
            "Found {} content items in \"{}\"",
            listing.items.len(),
            listing.collection_name
        );
        Ok(listing)
    }

    async fn fetch_stats(
        &self,
        session: &mut S,
        content_key: &str,
    ) -> Result<StatsValues, WorkError> {
        let page = load(session, content_key).await?;
        self.parse_stats(page)
    }
}

/// Trimmed text of the first match, if non-empty
fn required_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element: ElementRef<'_>| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn missing(page: &Page, element: &str) -> WorkError {
    WorkError::MissingElement {
        url: page.url.clone(),
        element: element.to_string(),
    }
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragments, non-navigational schemes and
/// anything that does not resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| href.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}
