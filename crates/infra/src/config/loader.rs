//! Configuration loader
//!
//! Loads [`PerfConfig`] from an optional file and environment variables.
//!
//! ## Loading Strategy
//! 1. If `CADENCE_CONFIG` names a file, parse it
//! 2. Otherwise probe the standard locations for `cadence.{toml,json}`
//! 3. Fall back to defaults when no file exists
//! 4. Apply `CADENCE_*` environment overrides on top
//! 5. Validate the result
//!
//! ## Environment Variables
//! - `CADENCE_CONFIG`: Explicit configuration file path
//! - `CADENCE_CACHE_MAX_BYTES`: Store byte budget
//! - `CADENCE_CACHE_COMPRESSION`: `none`, `gzip` or `zlib`
//! - `CADENCE_BATCH_WINDOW_MS`: Batch collection window in milliseconds
//! - `CADENCE_SLOW_QUERY_MS`: Slow query threshold (optimizer and monitor)
//! - `CADENCE_LOG_LEVEL`: Default tracing filter directive
//! - `CADENCE_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./cadence.toml` or `./cadence.json` (current working directory)
//! 2. `../cadence.toml` or `../cadence.json` (parent directory)
//! 3. `../../cadence.toml` or `../../cadence.json` (grandparent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cadence_common::compression::CompressionKind;
use cadence_common::{CommonError, CommonResult};
use cadence_core::PerfConfig;

const CONFIG_PATH_VAR: &str = "CADENCE_CONFIG";
const FILE_NAMES: [&str; 2] = ["cadence.toml", "cadence.json"];

/// Load configuration with file and environment layering
///
/// # Errors
/// Returns `CommonError` if:
/// - `CADENCE_CONFIG` names a missing or unreadable file
/// - The file format is invalid
/// - An environment override cannot be parsed
/// - The merged configuration fails validation
pub fn load() -> CommonResult<PerfConfig> {
    let explicit = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);

    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => read_file(&path)?,
        None => {
            tracing::debug!("No configuration file found, using defaults");
            PerfConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    tracing::info!(
        max_size_bytes = config.cache.max_size_bytes,
        compression = ?config.cache.compression,
        batch_window_ms = config.optimizer.batch_window.as_millis() as u64,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from defaults and environment variables only
///
/// # Errors
/// Returns `CommonError::Config` if an override cannot be parsed, or
/// `CommonError::Validation` if the result is invalid.
pub fn load_from_env() -> CommonResult<PerfConfig> {
    let mut config = PerfConfig::default();
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension). Environment overrides are not applied.
///
/// # Errors
/// Returns `CommonError` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The parsed configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> CommonResult<PerfConfig> {
    let config_path = match path {
        Some(p) => p,
        None => probe_config_paths().ok_or_else(|| {
            CommonError::config("No config file found in any of the standard locations")
        })?,
    };

    let config = read_file(&config_path)?;
    config.validate()?;
    Ok(config)
}

fn read_file(path: &Path) -> CommonResult<PerfConfig> {
    if !path.exists() {
        return Err(CommonError::config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| CommonError::persistence_op("read config", e.to_string()))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> CommonResult<PerfConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents)?),
        "json" => Ok(serde_json::from_str(contents)?),
        other => Err(CommonError::config(format!("Unsupported config format: {other}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.extend([exe_dir.to_path_buf(), exe_dir.join("..")]);
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Layer `CADENCE_*` variables over `config`
fn apply_env_overrides(config: &mut PerfConfig) -> CommonResult<()> {
    if let Some(max_bytes) = env_parse::<usize>("CADENCE_CACHE_MAX_BYTES")? {
        config.cache.max_size_bytes = max_bytes;
    }
    if let Some(kind) = env_parse::<CompressionKind>("CADENCE_CACHE_COMPRESSION")? {
        config.cache.compression = kind;
    }
    if let Some(window) = env_parse::<u64>("CADENCE_BATCH_WINDOW_MS")? {
        config.optimizer.batch_window = Duration::from_millis(window);
    }
    if let Some(slow) = env_parse::<u64>("CADENCE_SLOW_QUERY_MS")? {
        let slow = Duration::from_millis(slow);
        config.optimizer.slow_query_threshold = slow;
        config.monitor.slow_query_threshold = slow;
    }
    if let Ok(level) = std::env::var("CADENCE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("CADENCE_LOG_JSON", config.logging.json);
    Ok(())
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `CommonError::Config` naming the variable when it is set but
/// cannot be parsed.
fn env_parse<T>(key: &str) -> CommonResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CommonError::config_field(key, format!("invalid value '{raw}': {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
