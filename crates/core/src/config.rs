//! Configuration for the performance layer
//!
//! `PerfConfig` is the single document the composition root consumes. Every
//! section falls back to its defaults, so a configuration file only needs the
//! values it overrides:
//!
//! ```toml
//! [cache]
//! max_size_bytes = 52428800
//! compression = "zlib"
//!
//! [optimizer]
//! batch_window_ms = 5
//! ```

use std::time::Duration;

use cadence_common::compression::CompressionKind;
use cadence_common::{duration_millis, CommonError, CommonResult};
use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfConfig {
    pub cache: StoreConfig,
    pub optimizer: OptimizerConfig,
    pub monitor: MonitorConfig,
    pub pool: PoolThresholds,
    pub logging: LoggingConfig,
}

impl PerfConfig {
    /// Validate every section
    ///
    /// # Errors
    /// Returns `CommonError::Validation` naming the first offending field.
    pub fn validate(&self) -> CommonResult<()> {
        self.cache.validate()?;
        self.optimizer.validate()?;
        self.monitor.validate()?;
        self.pool.validate()
    }
}

/// Size-bounded LRU store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Byte budget shared by all live entries (default: 100 MiB)
    pub max_size_bytes: usize,
    /// Codec applied to entries stored with `compress = true`
    pub compression: CompressionKind,
    /// Codec level, `0..=9` (default: 6)
    pub compression_level: u32,
    /// Payloads at or below this size are never compressed (default: 1 KiB)
    pub compression_threshold_bytes: usize,
    /// Interval of the background expiry sweep (default: 60s)
    #[serde(rename = "sweep_interval_ms", with = "duration_millis")]
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            compression: CompressionKind::Gzip,
            compression_level: 6,
            compression_threshold_bytes: 1024,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl StoreConfig {
    /// Store with the given byte budget and default codec settings
    pub fn with_max_size(max_size_bytes: usize) -> Self {
        Self { max_size_bytes, ..Default::default() }
    }

    fn validate(&self) -> CommonResult<()> {
        if self.max_size_bytes == 0 {
            return Err(CommonError::validation(
                "cache.max_size_bytes",
                "must be greater than 0",
            ));
        }
        if self.compression_level > 9 {
            return Err(CommonError::validation_with_value(
                "cache.compression_level",
                "must be between 0 and 9",
                self.compression_level.to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CommonError::validation(
                "cache.sweep_interval_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Query optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Delay used to collect concurrent requests into one batch (default: 10ms)
    #[serde(rename = "batch_window_ms", with = "duration_millis")]
    pub batch_window: Duration,
    /// Executions slower than this count as slow queries (default: 1000ms)
    #[serde(rename = "slow_query_threshold_ms", with = "duration_millis")]
    pub slow_query_threshold: Duration,
    /// Average time above which a query type gets an advisory (default: 500ms)
    #[serde(rename = "advisory_avg_time_ms", with = "duration_millis")]
    pub advisory_avg_time: Duration,
    /// Slow-query fraction above which a query type gets an advisory
    pub advisory_slow_fraction: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            batch_window: Duration::from_millis(10),
            slow_query_threshold: Duration::from_millis(1000),
            advisory_avg_time: Duration::from_millis(500),
            advisory_slow_fraction: 0.1,
        }
    }
}

impl OptimizerConfig {
    fn validate(&self) -> CommonResult<()> {
        if self.batch_window.is_zero() {
            return Err(CommonError::validation(
                "optimizer.batch_window_ms",
                "must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.advisory_slow_fraction) {
            return Err(CommonError::validation_with_value(
                "optimizer.advisory_slow_fraction",
                "must be within [0, 1]",
                self.advisory_slow_fraction.to_string(),
            ));
        }
        Ok(())
    }
}

/// Performance monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Samples retained per key (default: 1000)
    pub max_samples_per_key: usize,
    /// Distinct keys tracked at once; the key idle the longest is dropped
    /// first (default: 10 000)
    pub max_keys: usize,
    /// Alerts retained in the rolling log (default: 1000)
    pub max_alerts: usize,
    /// Query time that raises a warning alert (default: 1000ms)
    #[serde(rename = "slow_query_threshold_ms", with = "duration_millis")]
    pub slow_query_threshold: Duration,
    /// Query time that raises a critical alert (default: 5000ms)
    #[serde(rename = "critical_query_threshold_ms", with = "duration_millis")]
    pub critical_query_threshold: Duration,
    /// Memory fraction that raises a warning alert (default: 0.8)
    pub memory_warning_fraction: f64,
    /// Memory fraction that raises a critical alert (default: 0.95)
    pub memory_critical_fraction: f64,
    /// How long alerts stay visible (default: 1 hour)
    #[serde(rename = "alert_retention_ms", with = "duration_millis")]
    pub alert_retention: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_samples_per_key: 1000,
            max_keys: 10_000,
            max_alerts: 1000,
            slow_query_threshold: Duration::from_millis(1000),
            critical_query_threshold: Duration::from_millis(5000),
            memory_warning_fraction: 0.8,
            memory_critical_fraction: 0.95,
            alert_retention: Duration::from_secs(3600),
        }
    }
}

impl MonitorConfig {
    fn validate(&self) -> CommonResult<()> {
        if self.max_samples_per_key == 0 {
            return Err(CommonError::validation(
                "monitor.max_samples_per_key",
                "must be greater than 0",
            ));
        }
        if self.max_keys == 0 {
            return Err(CommonError::validation("monitor.max_keys", "must be greater than 0"));
        }
        if self.max_alerts == 0 {
            return Err(CommonError::validation("monitor.max_alerts", "must be greater than 0"));
        }
        for (field, value) in [
            ("monitor.memory_warning_fraction", self.memory_warning_fraction),
            ("monitor.memory_critical_fraction", self.memory_critical_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CommonError::validation_with_value(
                    field,
                    "must be within [0, 1]",
                    value.to_string(),
                ));
            }
        }
        if self.critical_query_threshold < self.slow_query_threshold {
            return Err(CommonError::validation(
                "monitor.critical_query_threshold_ms",
                "must be >= slow_query_threshold_ms",
            ));
        }
        Ok(())
    }
}

/// Thresholds used to classify connection pool health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolThresholds {
    pub warning_response_ms: f64,
    pub critical_response_ms: f64,
    pub warning_queue_depth: u32,
    pub critical_queue_depth: u32,
    pub warning_errors: u64,
    pub critical_errors: u64,
}

impl Default for PoolThresholds {
    fn default() -> Self {
        Self {
            warning_response_ms: 1000.0,
            critical_response_ms: 5000.0,
            warning_queue_depth: 10,
            critical_queue_depth: 50,
            warning_errors: 10,
            critical_errors: 100,
        }
    }
}

impl PoolThresholds {
    fn validate(&self) -> CommonResult<()> {
        if self.critical_response_ms < self.warning_response_ms
            || self.critical_queue_depth < self.warning_queue_depth
            || self.critical_errors < self.warning_errors
        {
            return Err(CommonError::validation(
                "pool",
                "critical thresholds must not be below warning thresholds",
            ));
        }
        Ok(())
    }
}

/// Log output settings consumed by the tracing subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (default: `info`)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    use super::*;

    /// Validates that the defaults pass validation.
    #[test]
    fn test_default_config_is_valid() {
        let config = PerfConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.max_size_bytes, 100 * 1024 * 1024);
        assert_eq!(config.optimizer.batch_window, Duration::from_millis(10));
        assert_eq!(config.monitor.max_samples_per_key, 1000);
    }

    /// Validates partial documents fill the remaining fields from defaults.
    ///
    /// Assertions:
    /// - Confirms overridden values are applied.
    /// - Confirms untouched sections keep their defaults.
    #[test]
    fn test_partial_document_uses_defaults() {
        let config: PerfConfig = serde_json::from_value(serde_json::json!({
            "cache": { "max_size_bytes": 2048, "compression": "zlib" },
            "optimizer": { "batch_window_ms": 25 }
        }))
        .unwrap();

        assert_eq!(config.cache.max_size_bytes, 2048);
        assert_eq!(config.cache.compression, CompressionKind::Zlib);
        assert_eq!(config.cache.compression_threshold_bytes, 1024);
        assert_eq!(config.optimizer.batch_window, Duration::from_millis(25));
        assert_eq!(config.monitor, MonitorConfig::default());
    }

    /// Validates that a zero byte budget is rejected.
    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = PerfConfig::default();
        config.cache.max_size_bytes = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache.max_size_bytes"));
    }

    /// Validates fraction bounds.
    #[test]
    fn test_fraction_out_of_range_rejected() {
        let mut config = PerfConfig::default();
        config.monitor.memory_warning_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = PerfConfig::default();
        config.optimizer.advisory_slow_fraction = -0.1;
        assert!(config.validate().is_err());
    }

    /// Validates a zero key cap is rejected.
    #[test]
    fn test_zero_monitor_keys_rejected() {
        let mut config = PerfConfig::default();
        config.monitor.max_keys = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("monitor.max_keys"));
    }

    /// Validates inverted pool thresholds are rejected.
    #[test]
    fn test_inverted_pool_thresholds_rejected() {
        let mut config = PerfConfig::default();
        config.pool.critical_queue_depth = 1;
        assert!(config.validate().is_err());
    }

    /// Validates durations serialize under their `_ms` names.
    #[test]
    fn test_durations_serialize_as_millis() {
        let value = serde_json::to_value(OptimizerConfig::default()).unwrap();
        assert_eq!(value["batch_window_ms"], 10);
        assert_eq!(value["slow_query_threshold_ms"], 1000);
    }
}
