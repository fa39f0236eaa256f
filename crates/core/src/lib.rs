//! # Cadence Core
//!
//! In-process performance layer for the scheduling dashboard.
//!
//! This crate contains:
//! - A byte-bounded LRU store with TTL, tag invalidation and compression
//! - A query optimizer that batches concurrent requests per key
//! - A rolling performance monitor with threshold alerts
//! - The [`CacheManager`] façade composing the three
//! - A connection pool sizing advisor
//!
//! ## Architecture Principles
//! - Only depends on `cadence-common` for shared infrastructure
//! - The database is reached through the [`QueryExecutor`] port
//! - Time comes from an injected [`Clock`](cadence_common::Clock); no
//!   component is a global singleton

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod monitor;
pub mod optimizer;
pub mod pool;
pub mod ports;

pub use cache::{CacheConfig, Lookup, LruStore, StoreStats};
pub use config::PerfConfig;
pub use error::{PerfError, PerfResult};
pub use manager::{CacheManager, PerformanceReport, QueryOptions, QueryRequest};
pub use monitor::{Alert, AlertKind, AlertSeverity, MetricsSummary, PerformanceMonitor, PerformanceSample};
pub use optimizer::{QueryOptimizer, QueryStats};
pub use pool::{ConnectionPoolAdvisor, PoolHealth, PoolLoad, PoolMetrics, PoolRecommendation, PoolSample};
pub use ports::{QueryExecutor, Rows, Statement};
