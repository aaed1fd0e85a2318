//! In-memory sessions for unit tests

use crate::session::{Page, Session, SessionError, SessionFactory, WorkError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Session serving canned pages, recording every call
#[derive(Debug, Default)]
pub(crate) struct MockSession {
    pub id: usize,
    pub pages: HashMap<String, String>,
    pub visited: Vec<String>,
    pub resets: usize,
    pub closed: bool,
    pub fail_close: bool,
    page: Option<Page>,
}

impl MockSession {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl Session for MockSession {
    async fn goto(&mut self, url: &str) -> Result<(), WorkError> {
        self.visited.push(url.to_string());
        match self.pages.get(url) {
            Some(body) => {
                self.page = Some(Page {
                    url: url.to_string(),
                    body: body.clone(),
                });
                Ok(())
            }
            None => {
                self.page = None;
                Err(WorkError::Navigation {
                    url: url.to_string(),
                    reason: "HTTP 404".to_string(),
                })
            }
        }
    }

    fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    async fn reset(&mut self) -> Result<(), WorkError> {
        self.resets += 1;
        self.page = None;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.fail_close {
            return Err(SessionError::Close(format!("worker {} did not exit", self.id)));
        }
        self.closed = true;
        Ok(())
    }
}

/// Factory whose first `failures` calls fail
pub(crate) struct MockFactory {
    failures: usize,
    attempts: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    type Session = MockSession;

    async fn create(&self, worker_id: usize) -> Result<MockSession, SessionError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(SessionError::Start {
                worker: worker_id,
                reason: "browser did not start".to_string(),
            });
        }
        Ok(MockSession::new(worker_id))
    }
}
