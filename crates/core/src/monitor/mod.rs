//! Rolling performance monitor
//!
//! Keeps a bounded ring of samples per key, a bounded number of keys and a
//! bounded log of threshold alerts. Alert rules are evaluated synchronously
//! on `record`.

mod alerts;
mod metrics;

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub use alerts::{Alert, AlertKind, AlertSeverity};
use cadence_common::collections::RingBuffer;
use cadence_common::{Clock, SystemClock};
pub use metrics::{MetricsSummary, PerformanceSample};
use parking_lot::Mutex;
use tracing::{debug, warn};

use self::metrics::TimedSample;
use crate::config::MonitorConfig;

pub struct PerformanceMonitor<C: Clock = SystemClock> {
    config: MonitorConfig,
    samples: Mutex<HashMap<String, RingBuffer<TimedSample>>>,
    alerts: Mutex<RingBuffer<Alert>>,
    clock: C,
}

impl PerformanceMonitor<SystemClock> {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> PerformanceMonitor<C> {
    /// Create a monitor with a custom clock (useful for testing)
    pub fn with_clock(config: MonitorConfig, clock: C) -> Self {
        let alerts = Mutex::new(RingBuffer::new(config.max_alerts));
        Self { config, samples: Mutex::new(HashMap::new()), alerts, clock }
    }

    /// Append a sample for `key` and evaluate alert rules against it
    pub fn record(&self, key: &str, sample: PerformanceSample) {
        let at = self.clock.now();
        let timestamp_ms = self.clock.millis_since_epoch();
        let raised = self.evaluate(key, &sample, at, timestamp_ms);

        {
            let mut samples = self.samples.lock();
            if !samples.contains_key(key) && samples.len() >= self.config.max_keys {
                Self::evict_idlest(&mut samples);
            }
            samples
                .entry(key.to_string())
                .or_insert_with(|| RingBuffer::new(self.config.max_samples_per_key))
                .push(TimedSample { at, timestamp_ms, sample });
        }

        if !raised.is_empty() {
            let mut alerts = self.alerts.lock();
            for alert in raised {
                warn!(
                    key = %alert.key,
                    kind = %alert.kind,
                    severity = ?alert.severity,
                    value = alert.value,
                    threshold = alert.threshold,
                    "{}",
                    alert.message
                );
                alerts.push(alert);
            }
        }
    }

    /// Drop the key whose newest sample is the oldest
    fn evict_idlest(samples: &mut HashMap<String, RingBuffer<TimedSample>>) {
        let idlest = samples
            .iter()
            .min_by_key(|(_, ring)| ring.latest().map(|timed| timed.at))
            .map(|(key, _)| key.clone());
        if let Some(key) = idlest {
            samples.remove(&key);
            debug!(key = %key, "idle monitor key dropped");
        }
    }

    fn evaluate(
        &self,
        key: &str,
        sample: &PerformanceSample,
        at: Instant,
        timestamp_ms: u64,
    ) -> Vec<Alert> {
        let mut raised = Vec::new();
        let elapsed_ms = sample.query_time.as_secs_f64() * 1000.0;

        let slow = if sample.query_time > self.config.critical_query_threshold {
            Some((AlertSeverity::Critical, self.config.critical_query_threshold))
        } else if sample.query_time > self.config.slow_query_threshold {
            Some((AlertSeverity::Warning, self.config.slow_query_threshold))
        } else {
            None
        };
        if let Some((severity, threshold)) = slow {
            let threshold_ms = threshold.as_secs_f64() * 1000.0;
            raised.push(Alert::slow_query(key, severity, elapsed_ms, threshold_ms, at, timestamp_ms));
        }

        if let Some(usage) = sample.memory_usage {
            let memory = if usage > self.config.memory_critical_fraction {
                Some((AlertSeverity::Critical, self.config.memory_critical_fraction))
            } else if usage > self.config.memory_warning_fraction {
                Some((AlertSeverity::Warning, self.config.memory_warning_fraction))
            } else {
                None
            };
            if let Some((severity, threshold)) = memory {
                raised.push(Alert::high_memory(key, severity, usage, threshold, at, timestamp_ms));
            }
        }

        raised
    }

    /// Aggregate samples, optionally restricted to one key and to samples
    /// recorded within `window` of now
    pub fn metrics(&self, key: Option<&str>, window: Option<Duration>) -> MetricsSummary {
        let now = self.clock.now();
        let in_window = |timed: &&TimedSample| {
            window.map_or(true, |w| now.saturating_duration_since(timed.at) <= w)
        };
        let threshold = self.config.slow_query_threshold;

        let samples = self.samples.lock();
        match key {
            Some(key) => samples.get(key).map_or_else(MetricsSummary::default, |ring| {
                MetricsSummary::from_samples(ring.iter().filter(in_window), threshold)
            }),
            None => MetricsSummary::from_samples(
                samples.values().flat_map(|ring| ring.iter()).filter(in_window),
                threshold,
            ),
        }
    }

    /// Alerts raised within the retention period, oldest first
    pub fn alerts(&self, severity: Option<AlertSeverity>) -> Vec<Alert> {
        let now = self.clock.now();
        let retention = self.config.alert_retention;
        self.alerts
            .lock()
            .iter()
            .filter(|alert| now.saturating_duration_since(alert.raised_at) <= retention)
            .filter(|alert| severity.map_or(true, |s| alert.severity == s))
            .cloned()
            .collect()
    }

    /// Keys that currently have samples
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.samples.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Samples retained for `key`
    pub fn sample_count(&self, key: &str) -> usize {
        self.samples.lock().get(key).map_or(0, RingBuffer::len)
    }

    /// Drop all samples and alerts
    pub fn clear(&self) {
        self.samples.lock().clear();
        self.alerts.lock().clear();
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

impl<C: Clock> std::fmt::Debug for PerformanceMonitor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("keys", &self.samples.lock().len())
            .field("alerts", &self.alerts.lock().len())
            .finish_non_exhaustive()
    }
}
