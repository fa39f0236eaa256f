//! Threshold alerts raised by the monitor

use std::fmt;
use std::time::Instant;

use serde::Serialize;

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SlowQuery,
    HighMemory,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlowQuery => write!(f, "slow_query"),
            Self::HighMemory => write!(f, "high_memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// Advisory alert; never changes cache state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub key: String,
    pub message: String,
    /// Observed value (milliseconds or memory fraction)
    pub value: f64,
    /// Threshold that was crossed
    pub threshold: f64,
    pub timestamp_ms: u64,
    #[serde(skip)]
    pub(crate) raised_at: Instant,
}

impl Alert {
    pub(crate) fn slow_query(
        key: &str,
        severity: AlertSeverity,
        elapsed_ms: f64,
        threshold_ms: f64,
        raised_at: Instant,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            kind: AlertKind::SlowQuery,
            severity,
            key: key.to_string(),
            message: format!("Query for '{key}' took {elapsed_ms:.0}ms (threshold {threshold_ms:.0}ms)"),
            value: elapsed_ms,
            threshold: threshold_ms,
            timestamp_ms,
            raised_at,
        }
    }

    pub(crate) fn high_memory(
        key: &str,
        severity: AlertSeverity,
        usage: f64,
        threshold: f64,
        raised_at: Instant,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            kind: AlertKind::HighMemory,
            severity,
            key: key.to_string(),
            message: format!(
                "Cache memory usage at {:.1}% (threshold {:.1}%)",
                usage * 100.0,
                threshold * 100.0
            ),
            value: usage,
            threshold,
            timestamp_ms,
            raised_at,
        }
    }
}
