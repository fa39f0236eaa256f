//! Configuration loading
//!
//! This module loads [`PerfConfig`](cadence_core::PerfConfig) from an
//! optional file and layers `CADENCE_*` environment variables on top.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
