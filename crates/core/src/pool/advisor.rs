//! Pool sizing from observed load

use std::time::Duration;

use cadence_common::duration_millis;
use serde::{Deserialize, Serialize};

const BASELINE_MIN: u32 = 2;
const BASELINE_MAX: u32 = 10;
const MAX_CEILING: u32 = 50;
const QPS_SCALE_THRESHOLD: f64 = 100.0;
const QPS_PER_CONNECTION: f64 = 10.0;
const SLOW_QUERY_MS: f64 = 1000.0;
const SLOW_QUERY_INFLATION: f64 = 1.5;
/// 20% headroom over observed peak concurrency
const PEAK_HEADROOM_DIVISOR: u32 = 5;
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const RELAXED_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(60);

/// Load observed on a pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolLoad {
    pub qps: f64,
    pub avg_query_time_ms: f64,
    pub peak_concurrency: u32,
}

/// Suggested pool settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecommendation {
    pub min: u32,
    pub max: u32,
    #[serde(rename = "idle_timeout_ms", with = "duration_millis")]
    pub idle_timeout: Duration,
    #[serde(rename = "acquire_timeout_ms", with = "duration_millis")]
    pub acquire_timeout: Duration,
}

/// Size a pool for `load`
///
/// Starts from 2..10 connections, scales `max` with throughput above
/// 100 qps, inflates it by half and relaxes the acquire timeout when queries
/// average over a second, and grows it past the observed peak concurrency.
/// `max` never exceeds 50.
///
/// # Example
/// ```
/// use cadence_core::pool::{recommend, PoolLoad};
///
/// let rec = recommend(&PoolLoad { qps: 150.0, avg_query_time_ms: 200.0, peak_concurrency: 5 });
/// assert!(rec.max >= 15);
/// ```
pub fn recommend(load: &PoolLoad) -> PoolRecommendation {
    let mut max = BASELINE_MAX;
    let mut acquire_timeout = ACQUIRE_TIMEOUT;

    if load.qps > QPS_SCALE_THRESHOLD {
        max = max.max(ceil_u32(load.qps / QPS_PER_CONNECTION));
    }

    if load.avg_query_time_ms > SLOW_QUERY_MS {
        max = ceil_u32(f64::from(max) * SLOW_QUERY_INFLATION);
        acquire_timeout = RELAXED_ACQUIRE_TIMEOUT;
    }

    if load.peak_concurrency > max {
        let peak = load.peak_concurrency;
        max = peak.saturating_add(peak.div_ceil(PEAK_HEADROOM_DIVISOR));
    }

    let max = max.min(MAX_CEILING);
    PoolRecommendation {
        min: BASELINE_MIN.min(max),
        max,
        idle_timeout: IDLE_TIMEOUT,
        acquire_timeout,
    }
}

fn ceil_u32(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
