//! Query optimizer
//!
//! Groups concurrent requests into time-windowed batches, fans statements out
//! concurrently, and keeps per-query-type timing aggregates from which it
//! derives advisory suggestions. Statements are opaque to the optimizer.

mod batch;
mod stats;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use parking_lot::Mutex;
pub use stats::QueryStats;
use tracing::{debug, instrument};

use self::batch::BatchScheduler;
use crate::config::OptimizerConfig;
use crate::error::PerfResult;
use crate::ports::{QueryExecutor, Rows, Statement};

/// Batching and timing front for an injected [`QueryExecutor`]
pub struct QueryOptimizer {
    config: OptimizerConfig,
    scheduler: BatchScheduler,
    stats: Mutex<HashMap<String, QueryStats>>,
}

impl QueryOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        let scheduler = BatchScheduler::new(config.batch_window);
        Self { config, scheduler, stats: Mutex::new(HashMap::new()) }
    }

    /// Queue `statements` under `batch_key` and wait for the batch window to
    /// close
    ///
    /// # Errors
    /// Returns the executor's error if any statement in the batch failed;
    /// every caller in that batch receives the same error.
    #[instrument(skip(self, executor, statements), fields(statements = statements.len()))]
    pub async fn batch(
        &self,
        executor: Arc<dyn QueryExecutor>,
        statements: Vec<Statement>,
        batch_key: &str,
    ) -> PerfResult<Vec<Rows>> {
        self.scheduler.submit(executor, statements, batch_key, None).await
    }

    /// Like [`batch`](Self::batch), flushing as soon as `max_requests`
    /// callers have joined
    #[instrument(skip(self, executor, statements), fields(statements = statements.len()))]
    pub async fn batch_with_limit(
        &self,
        executor: Arc<dyn QueryExecutor>,
        statements: Vec<Statement>,
        batch_key: &str,
        max_requests: usize,
    ) -> PerfResult<Vec<Rows>> {
        self.scheduler.submit(executor, statements, batch_key, Some(max_requests.max(1))).await
    }

    /// Run statements concurrently, returning rows in statement order
    ///
    /// # Errors
    /// Returns the first executor error.
    pub async fn execute_parallel(
        &self,
        executor: &dyn QueryExecutor,
        statements: &[Statement],
    ) -> PerfResult<Vec<Rows>> {
        try_join_all(statements.iter().map(|s| executor.query(&s.sql, &s.params))).await
    }

    /// Run statements one after another
    ///
    /// # Errors
    /// Returns the first executor error; later statements are not run.
    pub async fn execute_sequential(
        &self,
        executor: &dyn QueryExecutor,
        statements: &[Statement],
    ) -> PerfResult<Vec<Rows>> {
        let mut rows = Vec::with_capacity(statements.len());
        for statement in statements {
            rows.push(executor.query(&statement.sql, &statement.params).await?);
        }
        Ok(rows)
    }

    /// Fold one execution time into the aggregate for `query_type`
    pub fn record_query(&self, query_type: &str, elapsed: Duration) {
        let mut stats = self.stats.lock();
        let entry = stats.entry(query_type.to_string()).or_default();
        entry.record(elapsed, self.config.slow_query_threshold);
        debug!(
            query_type,
            elapsed_ms = elapsed.as_millis() as u64,
            avg_ms = entry.avg_time_ms,
            "query recorded"
        );
    }

    /// Snapshot of all aggregates, ordered by query type
    pub fn query_stats(&self) -> BTreeMap<String, QueryStats> {
        self.stats.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Human-readable advisories for slow query types
    pub fn suggestions(&self) -> Vec<String> {
        let avg_threshold_ms = self.config.advisory_avg_time.as_secs_f64() * 1000.0;
        let mut suggestions = Vec::new();
        for (query_type, stats) in self.query_stats() {
            if stats.avg_time_ms > avg_threshold_ms {
                suggestions.push(format!(
                    "Query '{query_type}' averages {:.0}ms; consider caching its results or adding an index",
                    stats.avg_time_ms
                ));
            }
            if stats.slow_fraction() > self.config.advisory_slow_fraction {
                suggestions.push(format!(
                    "Query '{query_type}' is slow in {:.0}% of executions; consider batching or pagination",
                    stats.slow_fraction() * 100.0
                ));
            }
        }
        suggestions
    }

    /// Batch windows still collecting requests
    pub fn pending_batches(&self) -> usize {
        self.scheduler.pending()
    }

    /// Forget all timing aggregates
    pub fn clear_stats(&self) {
        self.stats.lock().clear();
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }
}

impl std::fmt::Debug for QueryOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOptimizer")
            .field("config", &self.config)
            .field("pending_batches", &self.pending_batches())
            .finish_non_exhaustive()
    }
}
