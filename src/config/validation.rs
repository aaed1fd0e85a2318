use crate::config::types::{Config, CrawlerConfig, OutputConfig, SessionConfig, SiteConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_session_config(&config.session)?;
    validate_site_config(&config.site)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl orchestration settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if let Some(workers) = config.workers {
        if !(1..=256).contains(&workers) {
            return Err(ConfigError::Validation(format!(
                "workers must be between 1 and 256, got {}",
                workers
            )));
        }
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch_size must be >= 1, got 0".to_string(),
        ));
    }

    if config.max_chunk_size < 1 {
        return Err(ConfigError::Validation(
            "max_chunk_size must be >= 1, got 0".to_string(),
        ));
    }

    if !(1..=10).contains(&config.max_attempts) {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.retry_backoff_max_ms < config.retry_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_max_ms ({}ms) must be >= retry_backoff_ms ({}ms)",
            config.retry_backoff_max_ms, config.retry_backoff_ms
        )));
    }

    Ok(())
}

/// Validates page session settings
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if !(1..=300).contains(&config.page_timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "page_timeout_secs must be between 1 and 300, got {}",
            config.page_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the base URL and every selector
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    for (name, selector) in [
        ("artist-name", &config.artist_name),
        ("collection-link", &config.collection_link),
        ("collection-name", &config.collection_name),
        ("photo-link", &config.photo_link),
        ("video-link", &config.video_link),
        ("title", &config.title),
        ("views", &config.views),
        ("downloads", &config.downloads),
        ("likes", &config.likes),
        ("upload-date", &config.upload_date),
    ] {
        validate_selector(name, selector)?;
    }

    if config.date_format.trim().is_empty() {
        return Err(ConfigError::Validation(
            "date_format cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates input and output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.artists_path.is_empty() {
        return Err(ConfigError::Validation(
            "artists_path cannot be empty".to_string(),
        ));
    }

    if config.data_path.is_empty() {
        return Err(ConfigError::Validation(
            "data_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector(format!(
            "{} selector cannot be empty",
            name
        )));
    }

    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, selector, e)))
}
