//! # Cadence Infrastructure
//!
//! Wiring for the performance layer.
//!
//! This crate contains:
//! - Configuration loading (file, then `CADENCE_*` environment overrides)
//! - Tracing subscriber initialisation
//! - The [`PerfContext`] composition root and its background expiry sweep
//!
//! ## Architecture
//! - Depends on `cadence-common` and `cadence-core`
//! - Contains the "impure" code: environment, filesystem, global subscriber,
//!   spawned tasks

pub mod config;
pub mod context;
pub mod observability;

pub use config::{load, load_from_env, load_from_file, probe_config_paths};
pub use context::PerfContext;
pub use observability::init_tracing;
