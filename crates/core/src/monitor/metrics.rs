//! Samples and their aggregates

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// One observation reported for a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    #[serde(rename = "query_time_ms", with = "cadence_common::duration_millis")]
    pub query_time: Duration,
    pub cache_hit: bool,
    /// Payload size in bytes
    pub data_size: usize,
    /// Cache memory usage as a fraction of its budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
}

impl PerformanceSample {
    pub fn hit(query_time: Duration, data_size: usize) -> Self {
        Self { query_time, cache_hit: true, data_size, memory_usage: None }
    }

    pub fn miss(query_time: Duration, data_size: usize) -> Self {
        Self { query_time, cache_hit: false, data_size, memory_usage: None }
    }

    pub fn with_memory_usage(mut self, fraction: f64) -> Self {
        self.memory_usage = Some(fraction);
        self
    }
}

/// A sample stamped with the monitor clock at record time
#[derive(Debug, Clone)]
pub(crate) struct TimedSample {
    pub(crate) at: Instant,
    pub(crate) timestamp_ms: u64,
    pub(crate) sample: PerformanceSample,
}

/// Aggregate over a set of samples
///
/// All fields are zero when no samples matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub count: usize,
    pub avg_query_time_ms: f64,
    pub cache_hit_rate: f64,
    pub avg_data_size: f64,
    pub slow_queries: usize,
    /// Wall-clock millis of the newest sample included
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sample_ms: Option<u64>,
}

impl MetricsSummary {
    pub(crate) fn from_samples<'a, I>(samples: I, slow_threshold: Duration) -> Self
    where
        I: IntoIterator<Item = &'a TimedSample>,
    {
        let mut summary = Self::default();
        let mut total_ms = 0.0;
        let mut hits = 0usize;
        let mut total_size = 0usize;

        for timed in samples {
            let sample = &timed.sample;
            summary.count += 1;
            total_ms += sample.query_time.as_secs_f64() * 1000.0;
            total_size += sample.data_size;
            if sample.cache_hit {
                hits += 1;
            }
            if sample.query_time > slow_threshold {
                summary.slow_queries += 1;
            }
            summary.last_sample_ms = summary.last_sample_ms.max(Some(timed.timestamp_ms));
        }

        if summary.count > 0 {
            let count = summary.count as f64;
            summary.avg_query_time_ms = total_ms / count;
            summary.cache_hit_rate = hits as f64 / count;
            summary.avg_data_size = total_size as f64 / count;
        }
        summary
    }
}
