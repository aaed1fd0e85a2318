//! Page sessions
//!
//! A session is one long-lived page-loading context (a browser tab, an HTTP
//! client with its current page). Sessions carry navigation state, so every
//! session is owned by exactly one worker slot of the pool and is never used
//! by two tasks at once.
//!
//! - [`Session`]: navigate, read the current page, reset, close
//! - [`SessionFactory`]: starts one session per worker
//! - [`WorkError`]: failure classes of a unit of work, tagged transient or not

mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use http::{build_http_client, HttpSession, HttpSessionFactory};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while running a unit of work against a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    #[error("Timed out waiting for {url}")]
    Timeout { url: String },

    #[error("Interaction intercepted at {url}: {reason}")]
    Intercepted { url: String, reason: String },

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Required element '{element}' missing on {url}")]
    MissingElement { url: String, element: String },

    #[error("No page is loaded in this session")]
    NoPage,
}

impl WorkError {
    /// Returns true for failures worth retrying after a session reset
    ///
    /// Timeouts and intercepted interactions come from the page not being
    /// ready; everything else will fail the same way on the next attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Intercepted { .. })
    }
}

/// Errors raised while starting or stopping sessions
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to start session for worker {worker}: {reason}")]
    Start { worker: usize, reason: String },

    #[error("Failed to close session: {0}")]
    Close(String),
}

/// The page a session currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects
    pub url: String,
    /// Page markup
    pub body: String,
}

/// One exclusive page-loading context
#[async_trait]
pub trait Session: Send + 'static {
    /// Loads `url`, replacing the current page
    async fn goto(&mut self, url: &str) -> Result<(), WorkError>;

    /// Returns the currently loaded page, if any
    fn page(&self) -> Option<&Page>;

    /// Navigates to a neutral blank state
    async fn reset(&mut self) -> Result<(), WorkError>;

    /// Releases the session's resources
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Starts sessions for the worker pool
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Session;

    /// Starts the session owned by worker `worker_id`
    async fn create(&self, worker_id: usize) -> Result<Self::Session, SessionError>;
}
