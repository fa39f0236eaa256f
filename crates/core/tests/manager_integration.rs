//! Integration tests for the cache manager, optimizer batching and pool
//! advisor through the crate's public API

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadence_common::MockClock;
use cadence_core::pool::{recommend, PoolLoad};
use cadence_core::{
    CacheConfig, CacheManager, PerfConfig, PerfError, PerfResult, QueryExecutor, QueryOptimizer,
    QueryOptions, QueryRequest, Rows, Statement,
};
use serde_json::{json, Value};

/// Returns the SQL text upper-cased, standing in for a database driver
#[derive(Default)]
struct UpperExecutor {
    calls: AtomicUsize,
}

#[async_trait]
impl QueryExecutor for UpperExecutor {
    async fn query(&self, sql: &str, _params: &[Value]) -> PerfResult<Rows> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!(sql.to_uppercase()))
    }
}

/// Verifies three concurrent batch calls each receive their own result.
///
/// # Test Steps
/// 1. Issue `batch` for `a`, `b`, `c` under one batch key concurrently
/// 2. Let the paused clock run out the batching window
/// 3. Verify results arrive as `A`, `B`, `C` respectively
#[tokio::test(start_paused = true)]
async fn test_batch_results_follow_submission_order() {
    let optimizer = QueryOptimizer::new(PerfConfig::default().optimizer);
    let executor: Arc<dyn QueryExecutor> = Arc::new(UpperExecutor::default());

    let (a, b, c) = tokio::join!(
        optimizer.batch(Arc::clone(&executor), vec![Statement::new("a")], "posts"),
        optimizer.batch(Arc::clone(&executor), vec![Statement::new("b")], "posts"),
        optimizer.batch(Arc::clone(&executor), vec![Statement::new("c")], "posts"),
    );

    assert_eq!(a.unwrap(), vec![json!("A")]);
    assert_eq!(b.unwrap(), vec![json!("B")]);
    assert_eq!(c.unwrap(), vec![json!("C")]);
}

/// Verifies a batch waits for its window before executing.
///
/// # Test Steps
/// 1. Submit one request under a 50ms window
/// 2. Advance the paused clock by 49ms and check nothing ran
/// 3. Advance past the window and check the request completes
#[tokio::test(start_paused = true)]
async fn test_batch_waits_for_window() {
    let mut config = PerfConfig::default().optimizer;
    config.batch_window = Duration::from_millis(50);
    let optimizer = Arc::new(QueryOptimizer::new(config));
    let executor = Arc::new(UpperExecutor::default());

    let handle = {
        let optimizer = Arc::clone(&optimizer);
        let executor: Arc<dyn QueryExecutor> = executor.clone();
        tokio::spawn(async move { optimizer.batch(executor, vec![Statement::new("q")], "k").await })
    };

    // Let the request register and its flush timer start
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
    tokio::time::advance(Duration::from_millis(49)).await;
    assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(optimizer.pending_batches(), 1);

    tokio::time::advance(Duration::from_millis(2)).await;
    let rows = handle.await.unwrap().unwrap();
    assert_eq!(rows, vec![json!("Q")]);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
}

/// Verifies the report after one miss and one hit.
///
/// # Test Steps
/// 1. Call `get_or_compute` twice for the same key
/// 2. Verify the reported hit rate is 0.5 and the report serializes
#[tokio::test]
async fn test_stats_hit_rate_after_miss_then_hit() {
    let manager = CacheManager::with_clock(&PerfConfig::default(), MockClock::new());
    let config = CacheConfig::new(Duration::from_secs(60));

    for _ in 0..2 {
        let value: Vec<String> = manager
            .get_or_compute("drafts", || async { Ok::<_, PerfError>(vec!["post".to_string()]) }, &config)
            .await
            .unwrap();
        assert_eq!(value, vec!["post"]);
    }

    let report = manager.stats();
    assert!((report.hit_rate - 0.5).abs() < f64::EPSILON);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["cache"]["entries"], 1);
}

/// Verifies compute failures reach the caller unchanged and cache nothing.
///
/// # Test Steps
/// 1. Call `get_or_compute` with a failing compute
/// 2. Verify the same error is returned
/// 3. Call again with a succeeding compute and verify it runs
#[tokio::test]
async fn test_compute_failure_is_not_cached() {
    #[derive(Debug, PartialEq)]
    struct Upstream(u16);
    impl std::fmt::Display for Upstream {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "upstream status {}", self.0)
        }
    }

    let manager = CacheManager::with_clock(&PerfConfig::default(), MockClock::new());
    let config = CacheConfig::new(Duration::from_secs(60));

    let err = manager
        .get_or_compute("insights", || async { Err::<u32, _>(Upstream(503)) }, &config)
        .await
        .unwrap_err();
    assert_eq!(err, Upstream(503));

    let value = manager
        .get_or_compute("insights", || async { Ok::<u32, Upstream>(9) }, &config)
        .await
        .unwrap();
    assert_eq!(value, 9);
}

/// Verifies the cached query path end to end.
///
/// # Test Steps
/// 1. Run the same query twice and a tag invalidation between runs
/// 2. Verify the executor runs once per cache fill
#[tokio::test]
async fn test_query_cache_and_invalidate() {
    let manager = CacheManager::with_clock(&PerfConfig::default(), MockClock::new());
    let executor = Arc::new(UpperExecutor::default());
    let options = QueryOptions::new(
        CacheConfig::builder(Duration::from_secs(60)).tag("posts").build(),
    );
    let request = || QueryRequest::from(Statement::new("select * from posts"));

    manager.query(executor.clone(), "feed", request(), &options).await.unwrap();
    manager.query(executor.clone(), "feed", request(), &options).await.unwrap();
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);

    assert_eq!(manager.invalidate(&["posts".to_string()], &[]), 1);
    assert_eq!(manager.invalidate(&["posts".to_string()], &[]), 0);

    let rows = manager.query(executor.clone(), "feed", request(), &options).await.unwrap();
    assert_eq!(rows, json!("SELECT * FROM POSTS"));
    assert_eq!(executor.calls.load(Ordering::SeqCst), 2);
}

/// Verifies the pool sizing scenario from observed load.
///
/// # Test Steps
/// 1. Recommend for 150 qps, 200ms average, peak 5
/// 2. Verify `max` scaled to at least 15 and the acquire timeout is unchanged
#[test]
fn test_pool_recommendation_scales_with_qps() {
    let baseline = recommend(&PoolLoad { qps: 0.0, avg_query_time_ms: 0.0, peak_concurrency: 0 });
    let rec = recommend(&PoolLoad { qps: 150.0, avg_query_time_ms: 200.0, peak_concurrency: 5 });

    assert!(rec.max >= 15);
    assert_eq!(rec.acquire_timeout, baseline.acquire_timeout);
}
