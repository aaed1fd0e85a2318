//! Integration tests for the worker pool

use crate::support::{counting_pool, CountingSession, Usage};
use artist_harvest::pool::PoolError;
use artist_harvest::{Session, UnitOfWork};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Loads a page per item and records which worker ran it
#[derive(Default)]
struct Visit {
    seen: Mutex<HashMap<u32, usize>>,
    runs: AtomicUsize,
}

#[async_trait]
impl UnitOfWork<CountingSession> for Visit {
    type Input = u32;
    type Output = u32;

    async fn run(&self, session: &mut CountingSession, input: u32) -> u32 {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let _ = session.goto(&format!("https://example.com/{}", input)).await;
        self.seen.lock().unwrap().insert(input, session.id);
        input * 10
    }
}

#[tokio::test]
async fn test_two_workers_five_items() {
    let usage = Arc::new(Usage::default());
    let pool = counting_pool(2, &usage);
    let work = Arc::new(Visit::default());

    let outputs = pool
        .map(Arc::clone(&work), vec![1, 2, 3, 4, 5])
        .await
        .unwrap();

    assert_eq!(outputs, vec![10, 20, 30, 40, 50]);
    assert_eq!(work.runs.load(Ordering::SeqCst), 5);
    assert_eq!(work.seen.lock().unwrap().len(), 5);
    assert_eq!(usage.overlaps(), 0);
}

#[tokio::test]
async fn test_concurrent_maps_share_pool_safely() {
    let usage = Arc::new(Usage::default());
    let pool = counting_pool(3, &usage);
    let work = Arc::new(Visit::default());

    let first = pool.map(Arc::clone(&work), (0..40).collect());
    let second = pool.map(Arc::clone(&work), (100..140).collect());
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap().len(), 40);
    assert_eq!(second.unwrap().len(), 40);
    assert_eq!(work.runs.load(Ordering::SeqCst), 80);
    assert_eq!(usage.overlaps(), 0);
    assert_eq!(pool.available(), 3);
}

#[tokio::test]
async fn test_acquire_times_out_while_exhausted() {
    let usage = Arc::new(Usage::default());
    let pool = counting_pool(1, &usage);

    let held = pool.acquire().await.unwrap();
    assert!(matches!(pool.try_acquire(), Err(PoolError::Exhausted(1))));

    let waited = tokio::time::timeout(Duration::from_millis(20), pool.acquire()).await;
    assert!(waited.is_err());

    drop(held);
    let again = pool.try_acquire().unwrap();
    assert_eq!(again.id(), 0);
}

#[tokio::test]
async fn test_map_after_shutdown_fails() {
    let usage = Arc::new(Usage::default());
    let pool = counting_pool(2, &usage);
    assert_eq!(pool.shutdown().await, 2);

    let result = pool.map(Arc::new(Visit::default()), vec![1]).await;
    assert!(matches!(result, Err(PoolError::Closed)));
}
