//! HTTP-backed page session
//!
//! Loads pages with a `reqwest` client and keeps the last response body as
//! the session's current page. Response handling:
//!
//! | Condition | Result |
//! |-----------|--------|
//! | 2xx | Page loaded |
//! | Timeout (connect or read) | `WorkError::Timeout` |
//! | HTTP 429 / 5xx | `WorkError::Intercepted` |
//! | Other status | `WorkError::Navigation` |
//! | Connection error | `WorkError::Navigation` |

use crate::config::SessionConfig;
use crate::session::{Page, Session, SessionError, SessionFactory, WorkError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Builds an HTTP client from the session configuration
///
/// # Example
///
/// ```no_run
/// use artist_harvest::config::SessionConfig;
/// use artist_harvest::session::build_http_client;
///
/// let client = build_http_client(&SessionConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SessionConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.page_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A session that loads pages over plain HTTP
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    page: Option<Page>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self { client, page: None }
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn goto(&mut self, url: &str) -> Result<(), WorkError> {
        self.page = None;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(WorkError::Intercepted {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(WorkError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        tracing::trace!("Loaded {} ({} bytes)", final_url, body.len());
        self.page = Some(Page {
            url: final_url,
            body,
        });
        Ok(())
    }

    fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    async fn reset(&mut self) -> Result<(), WorkError> {
        self.page = None;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.page = None;
        Ok(())
    }
}

fn classify_request_error(url: &str, error: reqwest::Error) -> WorkError {
    if error.is_timeout() {
        WorkError::Timeout {
            url: url.to_string(),
        }
    } else {
        WorkError::Navigation {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Starts one [`HttpSession`] per worker, each with its own client
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    config: SessionConfig,
}

impl HttpSessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    async fn create(&self, worker_id: usize) -> Result<HttpSession, SessionError> {
        let client = build_http_client(&self.config).map_err(|e| SessionError::Start {
            worker: worker_id,
            reason: e.to_string(),
        })?;
        Ok(HttpSession::new(client))
    }
}
