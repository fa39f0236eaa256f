//! Per-query-type timing aggregates

use std::time::Duration;

use serde::Serialize;

/// Running timing statistics for one query type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryStats {
    pub count: u64,
    /// Running mean, updated incrementally
    pub avg_time_ms: f64,
    /// Executions above the slow-query threshold
    pub slow_queries: u64,
}

impl QueryStats {
    /// Fold one execution into the aggregate
    pub(crate) fn record(&mut self, elapsed: Duration, slow_threshold: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.count += 1;
        self.avg_time_ms += (elapsed_ms - self.avg_time_ms) / self.count as f64;
        if elapsed > slow_threshold {
            self.slow_queries += 1;
        }
    }

    /// Share of executions that were slow
    pub fn slow_fraction(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.slow_queries as f64 / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for optimizer::stats.
    use super::*;

    /// Validates the incremental mean and slow counter.
    ///
    /// Assertions:
    /// - Confirms the mean equals the arithmetic mean of the samples.
    /// - Confirms only samples strictly above the threshold count as slow.
    #[test]
    fn test_incremental_average() {
        let threshold = Duration::from_millis(1000);
        let mut stats = QueryStats::default();
        for ms in [100, 200, 1000, 1500] {
            stats.record(Duration::from_millis(ms), threshold);
        }

        assert_eq!(stats.count, 4);
        assert!((stats.avg_time_ms - 700.0).abs() < 1e-9);
        assert_eq!(stats.slow_queries, 1);
        assert!((stats.slow_fraction() - 0.25).abs() < 1e-12);
    }

    /// Validates empty stats report no slow fraction.
    #[test]
    fn test_empty_slow_fraction() {
        assert_eq!(QueryStats::default().slow_fraction(), 0.0);
    }
}
