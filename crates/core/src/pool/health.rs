//! Health tracking for named pools

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::PoolThresholds;

/// Weight of the newest response time in the moving average
const SMOOTHING: f64 = 0.1;

/// One externally reported pool observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSample {
    pub response_time: Duration,
    pub error: bool,
}

impl PoolSample {
    pub fn ok(response_time: Duration) -> Self {
        Self { response_time, error: false }
    }

    pub fn failed(response_time: Duration) -> Self {
        Self { response_time, error: true }
    }
}

/// Current state of one pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolMetrics {
    pub active_connections: u32,
    pub queued_queries: u32,
    /// Exponentially smoothed response time
    pub avg_response_time_ms: f64,
    pub errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolHealth {
    Healthy,
    Warning,
    Critical,
}

impl PoolHealth {
    pub(crate) fn classify(metrics: &PoolMetrics, thresholds: &PoolThresholds) -> Self {
        if metrics.avg_response_time_ms > thresholds.critical_response_ms
            || metrics.queued_queries > thresholds.critical_queue_depth
            || metrics.errors > thresholds.critical_errors
        {
            Self::Critical
        } else if metrics.avg_response_time_ms > thresholds.warning_response_ms
            || metrics.queued_queries > thresholds.warning_queue_depth
            || metrics.errors > thresholds.warning_errors
        {
            Self::Warning
        } else {
            Self::Healthy
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PoolHealthTracker {
    pools: Mutex<HashMap<String, PoolMetrics>>,
}

impl PoolHealthTracker {
    pub(crate) fn record_sample(&self, pool: &str, sample: PoolSample) -> PoolMetrics {
        let mut pools = self.pools.lock();
        let metrics = pools.entry(pool.to_string()).or_default();
        let sample_ms = sample.response_time.as_secs_f64() * 1000.0;
        metrics.avg_response_time_ms =
            metrics.avg_response_time_ms * (1.0 - SMOOTHING) + sample_ms * SMOOTHING;
        if sample.error {
            metrics.errors += 1;
        }
        metrics.clone()
    }

    pub(crate) fn update_state(&self, pool: &str, active: u32, queued: u32) {
        let mut pools = self.pools.lock();
        let metrics = pools.entry(pool.to_string()).or_default();
        metrics.active_connections = active;
        metrics.queued_queries = queued;
    }

    pub(crate) fn metrics(&self, pool: &str) -> Option<PoolMetrics> {
        self.pools.lock().get(pool).cloned()
    }

    pub(crate) fn reset(&self, pool: &str) -> bool {
        self.pools.lock().remove(pool).is_some()
    }

    pub(crate) fn health(&self, thresholds: &PoolThresholds) -> BTreeMap<String, PoolHealth> {
        self.pools
            .lock()
            .iter()
            .map(|(name, metrics)| (name.clone(), PoolHealth::classify(metrics, thresholds)))
            .collect()
    }
}
