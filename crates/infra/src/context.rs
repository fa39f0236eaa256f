//! Composition root for the performance layer
//!
//! [`PerfContext`] owns the single [`CacheManager`] and
//! [`ConnectionPoolAdvisor`] an application shares, plus the background task
//! that sweeps expired cache entries.
//!
//! # Lifecycle
//!
//! - `start_maintenance()` spawns the sweep loop; starting twice is an error
//! - `shutdown()` cancels the loop and awaits it with a timeout
//! - A stopped context can be started again

use std::sync::Arc;
use std::time::Duration;

use cadence_common::{Clock, CommonError, CommonResult, SystemClock};
use cadence_core::{CacheManager, ConnectionPoolAdvisor, PerfConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct Maintenance {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Application-wide performance services
pub struct PerfContext<C: Clock + Clone = SystemClock> {
    config: PerfConfig,
    manager: CacheManager<C>,
    advisor: Arc<ConnectionPoolAdvisor>,
    maintenance: Mutex<Option<Maintenance>>,
}

impl PerfContext<SystemClock> {
    /// Build the context from a validated configuration
    ///
    /// # Errors
    /// Returns `CommonError::Validation` if `config` is invalid.
    pub fn new(config: PerfConfig) -> CommonResult<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Load configuration via [`crate::config::load`] and build the context
    ///
    /// # Errors
    /// Returns any loading or validation error.
    pub fn from_env() -> CommonResult<Self> {
        Self::new(crate::config::load()?)
    }
}

impl<C: Clock + Clone> PerfContext<C> {
    /// Build the context with a custom clock for the cache and monitor
    ///
    /// # Errors
    /// Returns `CommonError::Validation` if `config` is invalid.
    pub fn with_clock(config: PerfConfig, clock: C) -> CommonResult<Self> {
        config.validate()?;
        let manager = CacheManager::with_clock(&config, clock);
        let advisor = Arc::new(ConnectionPoolAdvisor::new(config.pool.clone()));

        info!(
            max_size_bytes = config.cache.max_size_bytes,
            sweep_interval_ms = config.cache.sweep_interval.as_millis() as u64,
            "Performance context created"
        );

        Ok(Self { config, manager, advisor, maintenance: Mutex::new(None) })
    }

    pub fn config(&self) -> &PerfConfig {
        &self.config
    }

    /// Shared cache manager handle
    pub fn manager(&self) -> &CacheManager<C> {
        &self.manager
    }

    /// Shared pool advisor handle
    pub fn advisor(&self) -> Arc<ConnectionPoolAdvisor> {
        Arc::clone(&self.advisor)
    }

    /// Spawn the periodic expiry sweep
    ///
    /// # Errors
    /// Returns `CommonError::Config` if the sweep is already running.
    #[instrument(skip(self))]
    pub async fn start_maintenance(&self) -> CommonResult<()> {
        let mut guard = self.maintenance.lock().await;
        if guard.as_ref().is_some_and(|m| !m.handle.is_finished()) {
            return Err(CommonError::config("Cache maintenance already running"));
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Self::sweep_loop(
            self.manager.clone(),
            self.config.cache.sweep_interval,
            cancel.clone(),
        ));
        *guard = Some(Maintenance { cancel, handle });

        info!("Cache maintenance started");
        Ok(())
    }

    /// Whether the sweep task is alive
    pub async fn is_running(&self) -> bool {
        self.maintenance.lock().await.as_ref().is_some_and(|m| !m.handle.is_finished())
    }

    /// Cancel the sweep and wait for it to finish
    ///
    /// Calling this when nothing is running is a no-op.
    ///
    /// # Errors
    /// Returns `CommonError::Internal` if the task panicked or did not stop
    /// within the shutdown timeout.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> CommonResult<()> {
        let Some(Maintenance { cancel, handle }) = self.maintenance.lock().await.take() else {
            return Ok(());
        };

        cancel.cancel();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(())) => {
                info!("Cache maintenance stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Cache maintenance task panicked");
                Err(CommonError::internal_with_context(e.to_string(), "cache maintenance"))
            }
            Err(_) => {
                warn!("Cache maintenance did not stop within timeout");
                Err(CommonError::internal_with_context(
                    format!("did not stop within {}s", SHUTDOWN_TIMEOUT.as_secs()),
                    "cache maintenance",
                ))
            }
        }
    }

    async fn sweep_loop(manager: CacheManager<C>, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Cache maintenance cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let removed = manager.cleanup_expired();
                    if removed > 0 {
                        debug!(removed, "Expired cache entries swept");
                    }
                }
            }
        }
    }
}

impl<C: Clock + Clone> std::fmt::Debug for PerfContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfContext")
            .field("config", &self.config)
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}
