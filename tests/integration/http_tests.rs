//! End-to-end crawl over HTTP against a mock site
//!
//! These tests use wiremock to serve artist, collection and content pages
//! and run the real session, extractor, pool and output file together.

use crate::support::{read_rows, targets};
use artist_harvest::config::parse_config;
use artist_harvest::extract::SelectorExtractor;
use artist_harvest::pool::PoolOptions;
use artist_harvest::progress::ProgressStore;
use artist_harvest::retry::Backoff;
use artist_harvest::session::HttpSessionFactory;
use artist_harvest::{CrawlPipeline, RetryPolicy, WorkerPool};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_toml(base_url: &str, data_path: &str) -> String {
    format!(
        r#"
[crawler]
workers = 2
batch-size = 5
max-attempts = 2
retry-backoff-ms = 1
retry-backoff-max-ms = 1

[session]
user-agent = "artist-harvest-test/1.0"
page-timeout-secs = 5

[site]
base-url = "{base_url}"
artist-name = "h1"
collection-link = "a.collection"
collection-exclude = ["likes"]
collection-name = "h1"
photo-link = "a.photo"
video-link = "a.video"
title = "h2.title"
views = ".views"
downloads = ".downloads"
likes = ".likes"
upload-date = "small.date"
date-format = "Uploaded at %B %d, %Y"

[output]
artists-path = "artists.txt"
data-path = "{data_path}"
"#
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn stats_page(title: &str, views: &str) -> String {
    format!(
        r#"<html><body>
            <h2 class="title">{}</h2>
            <div class="views">{}</div>
            <div class="downloads">1,024</div>
            <div class="likes">12</div>
            <small class="date">Uploaded at March 9, 2021</small>
        </body></html>"#,
        title, views
    )
}

#[tokio::test]
async fn test_full_crawl_over_http() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/@ana/collections/",
        r#"<html><body>
            <h1>Ana</h1>
            <a class="collection" href="/collections/sea-1/">Sea</a>
            <a class="collection" href="/collections/likes-2/">Likes</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/collections/sea-1/",
        r#"<html><body>
            <h1>Sea</h1>
            <a class="photo" href="/photo/wave-1/">p</a>
            <a class="photo" href="/photo/tide-2/">p</a>
            <a class="video" href="/video/surf-3/">v</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/photo/wave-1/", &stats_page("Wave", "12.5K")).await;
    mount_page(&server, "/video/surf-3/", &stats_page("", "87")).await;

    // Always rate limited: retried up to the bound, then degraded
    Mock::given(method("GET"))
        .and(path("/photo/tide-2/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    // Excluded collection must never be requested
    Mock::given(method("GET"))
        .and(path("/collections/likes-2/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.csv");
    let config = parse_config(&config_toml(&base_url, &data_path.display().to_string())).unwrap();

    let extractor = Arc::new(SelectorExtractor::from_config(&config.site).unwrap());
    let factory = HttpSessionFactory::new(config.session.clone());
    let pool = WorkerPool::launch(
        &factory,
        PoolOptions {
            size: config.crawler.worker_count(),
            max_chunk_size: config.crawler.max_chunk_size,
            worker_init: config.crawler.worker_init,
            init_backoff: Backoff::none(),
        },
    )
    .await
    .unwrap();
    assert_eq!(pool.size(), 2);

    let pipeline = CrawlPipeline::new(
        pool.clone(),
        extractor,
        RetryPolicy::from_config(&config.crawler),
        config.crawler.batch_size,
    );
    let mut store = ProgressStore::open(&config.output.data_path, config.output.degraded_marker)
        .unwrap();

    let artist = format!("{}/@ana", base_url);
    let summary = pipeline
        .run(targets(&[artist.as_str()]), &mut store)
        .await
        .unwrap();
    assert_eq!(pool.shutdown().await, 2);

    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.degraded_rows, 1);

    let rows = read_rows(&data_path);
    assert_eq!(rows.len(), 3);

    let wave = &rows[0];
    assert_eq!(wave["artist_url"], artist);
    assert_eq!(wave["artist_name"], "Ana");
    assert_eq!(wave["collection_url"], format!("{}/collections/sea-1/", base_url));
    assert_eq!(wave["collection_name"], "Sea");
    assert_eq!(wave["content_url"], format!("{}/photo/wave-1/", base_url));
    assert_eq!(wave["content_type"], "photo");
    assert_eq!(wave["title"], "Wave");
    assert_eq!(wave["views"], "12500");
    assert_eq!(wave["downloads"], "1024");
    assert_eq!(wave["likes"], "12");
    assert_eq!(wave["upload_date"], "2021-03-09");

    let tide = &rows[1];
    assert_eq!(tide["content_url"], format!("{}/photo/tide-2/", base_url));
    assert_eq!(tide["views"], "unavailable");
    assert_eq!(tide["upload_date"], "unavailable");

    let surf = &rows[2];
    assert_eq!(surf["content_type"], "video");
    assert_eq!(surf["title"], "");
    assert_eq!(surf["views"], "87");
}

#[tokio::test]
async fn test_missing_artist_page_yields_no_rows() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/@ghost/collections/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.csv");
    let config = parse_config(&config_toml(&base_url, &data_path.display().to_string())).unwrap();

    let factory = HttpSessionFactory::new(config.session.clone());
    let pool = WorkerPool::launch(
        &factory,
        PoolOptions {
            size: 1,
            max_chunk_size: 10,
            worker_init: config.crawler.worker_init,
            init_backoff: Backoff::none(),
        },
    )
    .await
    .unwrap();
    let pipeline = CrawlPipeline::new(
        pool,
        Arc::new(SelectorExtractor::from_config(&config.site).unwrap()),
        RetryPolicy::from_config(&config.crawler),
        5,
    );
    let mut store = ProgressStore::open(&data_path, config.output.degraded_marker).unwrap();

    let artist = format!("{}/@ghost", base_url);
    let summary = pipeline
        .run(targets(&[artist.as_str()]), &mut store)
        .await
        .unwrap();

    assert_eq!(summary.empty_batches, 1);
    assert!(!data_path.exists());
}
