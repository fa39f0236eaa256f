//! Connection pool advisor
//!
//! [`recommend`] is a pure sizing function. [`ConnectionPoolAdvisor`] adds a
//! small health tracker for named pools fed by externally reported samples.

mod advisor;
mod health;

use std::collections::BTreeMap;

pub use advisor::{recommend, PoolLoad, PoolRecommendation};
pub use health::{PoolHealth, PoolMetrics, PoolSample};
use tracing::debug;

use self::health::PoolHealthTracker;
use crate::config::PoolThresholds;

#[derive(Debug, Default)]
pub struct ConnectionPoolAdvisor {
    thresholds: PoolThresholds,
    tracker: PoolHealthTracker,
}

impl ConnectionPoolAdvisor {
    pub fn new(thresholds: PoolThresholds) -> Self {
        Self { thresholds, tracker: PoolHealthTracker::default() }
    }

    /// See [`recommend`]
    pub fn recommend(&self, load: &PoolLoad) -> PoolRecommendation {
        recommend(load)
    }

    /// Fold one response into the pool's smoothed average and error count
    pub fn record_sample(&self, pool: &str, sample: PoolSample) {
        let metrics = self.tracker.record_sample(pool, sample);
        debug!(
            pool,
            avg_response_time_ms = metrics.avg_response_time_ms,
            errors = metrics.errors,
            "pool sample recorded"
        );
    }

    /// Replace the pool's connection and queue gauges
    pub fn update_pool_state(&self, pool: &str, active_connections: u32, queued_queries: u32) {
        self.tracker.update_state(pool, active_connections, queued_queries);
    }

    pub fn pool_metrics(&self, pool: &str) -> Option<PoolMetrics> {
        self.tracker.metrics(pool)
    }

    /// Forget a pool; returns whether it was tracked
    pub fn reset(&self, pool: &str) -> bool {
        self.tracker.reset(pool)
    }

    /// Health of every tracked pool
    pub fn health(&self) -> BTreeMap<String, PoolHealth> {
        self.tracker.health(&self.thresholds)
    }
}
