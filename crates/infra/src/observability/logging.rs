//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level is used as the
//! filter directive. Output is either the human-readable `fmt` layer or JSON
//! lines for log shippers.

use cadence_core::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const FALLBACK_DIRECTIVE: &str = "info";

/// Build the filter for `config`
///
/// An unparsable configured level falls back to `info` instead of silencing
/// all output.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
    })
}

/// Install the global tracing subscriber
///
/// Returns `false` when a subscriber is already installed, which is not an
/// error: tests and embedding applications may have set one first.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let (json, human) = if config.json {
        (Some(fmt::layer().json().with_current_span(true)), None)
    } else {
        (None, Some(fmt::layer().with_target(true)))
    };

    let installed = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(json)
        .with(human)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(level = %config.level, json = config.json, "Tracing initialised");
    }
    installed
}
