//! Cache manager façade
//!
//! Composes the LRU store, query optimizer and performance monitor behind a
//! get-or-compute operation and a cached query operation. The manager is a
//! cheap handle: clones share the same store, optimizer and monitor.

mod query;
mod report;

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cadence_common::{Clock, SystemClock};
use parking_lot::Mutex;
pub use query::{QueryOptions, QueryRequest};
pub use report::PerformanceReport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheConfig, Lookup, LruStore};
use crate::config::PerfConfig;
use crate::error::{PerfError, PerfResult};
use crate::monitor::{PerformanceMonitor, PerformanceSample};
use crate::optimizer::QueryOptimizer;
use crate::ports::{QueryExecutor, Rows};

struct ManagerInner<C: Clock> {
    store: LruStore<C>,
    optimizer: QueryOptimizer,
    monitor: PerformanceMonitor<C>,
    clock: C,
    /// Keys with a background refresh in flight
    refreshing: Mutex<HashSet<String>>,
}

impl<C: Clock> ManagerInner<C> {
    fn elapsed_since(&self, started: std::time::Instant) -> Duration {
        self.clock.now().saturating_duration_since(started)
    }

    /// Encode and store a freshly computed value, returning the bytes charged
    fn store_value<T: Serialize>(&self, key: &str, value: &T, config: &CacheConfig) -> usize {
        let stored = serde_json::to_value(value)
            .map_err(PerfError::from)
            .and_then(|json| self.store.set(key, json, config));
        match stored {
            Ok(size) => size,
            Err(err) => {
                warn!(key, error = %err, "failed to cache computed value");
                0
            }
        }
    }
}

/// Clears a key's in-flight refresh marker when the refresh task ends,
/// including when `compute` panics or the task is aborted
struct RefreshGuard<C: Clock + Clone> {
    inner: Arc<ManagerInner<C>>,
    key: String,
}

impl<C: Clock + Clone> Drop for RefreshGuard<C> {
    fn drop(&mut self) {
        self.inner.refreshing.lock().remove(&self.key);
    }
}

/// Public entry point of the performance layer
pub struct CacheManager<C: Clock + Clone = SystemClock> {
    inner: Arc<ManagerInner<C>>,
}

impl<C: Clock + Clone> Clone for CacheManager<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl CacheManager<SystemClock> {
    pub fn new(config: &PerfConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock + Clone> CacheManager<C> {
    /// Create a manager whose store and monitor share a custom clock
    pub fn with_clock(config: &PerfConfig, clock: C) -> Self {
        let inner = ManagerInner {
            store: LruStore::with_clock(&config.cache, clock.clone()),
            optimizer: QueryOptimizer::new(config.optimizer.clone()),
            monitor: PerformanceMonitor::with_clock(config.monitor.clone(), clock.clone()),
            clock,
            refreshing: Mutex::new(HashSet::new()),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Return the cached value for `key`, computing and caching it on a miss
    ///
    /// A value inside its stale-while-revalidate window is returned as-is and
    /// `compute` runs in the background to replace it; a failed refresh is
    /// logged and leaves the stale entry in place.
    ///
    /// # Errors
    /// Returns `compute`'s error unchanged. Nothing is cached in that case.
    #[instrument(skip(self, compute, config))]
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
        config: &CacheConfig,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        E: fmt::Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let inner = &self.inner;
        let started = inner.clock.now();

        match inner.store.lookup(key) {
            Lookup::Fresh { value, size } => match serde_json::from_value::<T>(value) {
                Ok(value) => {
                    inner.monitor.record(key, PerformanceSample::hit(inner.elapsed_since(started), size));
                    return Ok(value);
                }
                Err(err) => {
                    warn!(key, error = %err, "cached value has unexpected shape; recomputing");
                    inner.store.delete(key);
                }
            },
            Lookup::Stale { value, size } => match serde_json::from_value::<T>(value) {
                Ok(value) => {
                    inner.monitor.record(key, PerformanceSample::hit(inner.elapsed_since(started), size));
                    self.spawn_refresh(key, compute, config.clone());
                    return Ok(value);
                }
                Err(err) => {
                    warn!(key, error = %err, "cached value has unexpected shape; recomputing");
                    inner.store.delete(key);
                }
            },
            Lookup::Miss => {}
        }

        let value = compute().await?;
        let size = inner.store_value(key, &value, config);
        let sample = PerformanceSample::miss(inner.elapsed_since(started), size)
            .with_memory_usage(inner.store.memory_usage());
        inner.monitor.record(key, sample);
        Ok(value)
    }

    fn spawn_refresh<T, E, F, Fut>(&self, key: &str, compute: F, config: CacheConfig)
    where
        T: Serialize + Send + 'static,
        E: fmt::Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if !self.inner.refreshing.lock().insert(key.to_string()) {
            debug!(key, "refresh already in flight");
            return;
        }

        let guard = RefreshGuard { inner: Arc::clone(&self.inner), key: key.to_string() };
        tokio::spawn(async move {
            let RefreshGuard { inner, key } = &guard;
            match compute().await {
                Ok(value) => {
                    inner.store_value(key, &value, &config);
                    debug!(key = %key, "background refresh stored");
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "background refresh failed; keeping stale entry");
                }
            }
        });
    }

    /// Run a query through the cache
    ///
    /// The cache key is derived from `query_key` and the encoded statements.
    /// On a miss the statements run through the batching path when
    /// `options.batch_size` is set, concurrently when `options.parallel` is
    /// set for a multi-statement request, and sequentially otherwise. Timing
    /// is recorded under `query_key`.
    ///
    /// # Errors
    /// Returns the executor's error; nothing is cached in that case.
    #[instrument(skip(self, executor, request, options))]
    pub async fn query(
        &self,
        executor: Arc<dyn QueryExecutor>,
        query_key: &str,
        request: QueryRequest,
        options: &QueryOptions,
    ) -> PerfResult<Rows> {
        let cache_key = request.cache_key(query_key)?;
        if options.use_index || options.prefetch {
            debug!(use_index = options.use_index, prefetch = options.prefetch, "advisory query hints");
        }

        let inner = Arc::clone(&self.inner);
        let query_key = query_key.to_string();
        let batch_size = options.batch_size;
        let parallel = options.parallel;
        let compute = move || async move {
            let started = inner.clock.now();
            let rows = match (&request, batch_size) {
                (_, Some(limit)) => {
                    inner
                        .optimizer
                        .batch_with_limit(executor, request.statements().to_vec(), &query_key, limit)
                        .await?
                }
                (QueryRequest::Many(statements), None) if parallel => {
                    inner.optimizer.execute_parallel(executor.as_ref(), statements).await?
                }
                _ => inner.optimizer.execute_sequential(executor.as_ref(), request.statements()).await?,
            };
            inner.optimizer.record_query(&query_key, inner.elapsed_since(started));
            Ok::<Rows, PerfError>(request.shape(rows))
        };

        self.get_or_compute(&cache_key, compute, &options.cache).await
    }

    /// Store a value ahead of demand
    ///
    /// # Errors
    /// Returns an error when the value cannot be encoded.
    pub fn warm<T: Serialize>(&self, key: &str, value: &T, config: &CacheConfig) -> PerfResult<usize> {
        self.inner.store.set(key, serde_json::to_value(value)?, config)
    }

    /// Remove entries carrying any of `tags`, plus the listed `keys`
    ///
    /// Returns how many entries were removed; repeating a call is a no-op.
    pub fn invalidate(&self, tags: &[String], keys: &[String]) -> usize {
        let mut removed = self.inner.store.invalidate_by_tags(tags);
        removed += keys.iter().filter(|key| self.inner.store.delete(key)).count();
        debug!(?tags, ?keys, removed, "invalidate");
        removed
    }

    /// Drop entries past their TTL and revalidation window
    pub fn cleanup_expired(&self) -> usize {
        self.inner.store.cleanup_expired()
    }

    /// Drop all entries, samples, alerts and query statistics
    pub fn clear(&self) {
        self.inner.store.clear();
        self.inner.store.reset_stats();
        self.inner.monitor.clear();
        self.inner.optimizer.clear_stats();
    }

    /// Merged report of store, optimizer and monitor state
    pub fn stats(&self) -> PerformanceReport {
        let cache = self.inner.store.stats();
        PerformanceReport {
            hit_rate: cache.hit_rate(),
            cache,
            queries: self.inner.optimizer.query_stats(),
            performance: self.inner.monitor.metrics(None, None),
            alerts: self.inner.monitor.alerts(None),
            suggestions: self.inner.optimizer.suggestions(),
            pending_batches: self.inner.optimizer.pending_batches(),
        }
    }

    pub fn store(&self) -> &LruStore<C> {
        &self.inner.store
    }

    pub fn optimizer(&self) -> &QueryOptimizer {
        &self.inner.optimizer
    }

    pub fn monitor(&self) -> &PerformanceMonitor<C> {
        &self.inner.monitor
    }
}

impl<C: Clock + Clone> fmt::Debug for CacheManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("store", &self.inner.store)
            .field("optimizer", &self.inner.optimizer)
            .finish_non_exhaustive()
    }
}
