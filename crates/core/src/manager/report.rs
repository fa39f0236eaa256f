//! Aggregate report for operational dashboards

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::StoreStats;
use crate::monitor::{Alert, MetricsSummary};
use crate::optimizer::QueryStats;

/// Merged view of store, optimizer and monitor state
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub hit_rate: f64,
    pub cache: StoreStats,
    pub queries: BTreeMap<String, QueryStats>,
    pub performance: MetricsSummary,
    pub alerts: Vec<Alert>,
    pub suggestions: Vec<String>,
    pub pending_batches: usize,
}
