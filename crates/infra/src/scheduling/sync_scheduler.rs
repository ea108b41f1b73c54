//! Periodic reconciliation of local campaigns against the ad platform.
//!
//! Every tick runs `check_and_auto_sync` for each configured scope, one after
//! another. Scopes are independent: a failing or slow scope is logged and the
//! loop moves on. Remote calls still go through the validator's limiter, so
//! the scheduler never adds throttling of its own.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use adsync_core::sync::SyncValidator;
//! use adsync_domain::SyncScope;
//! use adsync_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
//!
//! # async fn example(validator: Arc<SyncValidator>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler = SyncScheduler::new(
//!     validator,
//!     vec![SyncScope::new("tenant-1")],
//!     SyncSchedulerConfig::default(),
//! );
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use adsync_core::sync::SyncValidator;
use adsync_domain::{AutoSyncReport, SchedulerSettings, SyncScope};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for sync scheduler
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Pause between two reconciliation passes
    pub interval: Duration,
    /// Upper bound for one scope's validate-and-fix
    pub scope_timeout: Duration,
    /// How long `stop` waits for the loop to wind down
    pub join_timeout: Duration,
    pub enabled: bool,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self::from(&SchedulerSettings::default())
    }
}

impl From<&SchedulerSettings> for SyncSchedulerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.interval_seconds.max(1)),
            scope_timeout: Duration::from_secs(300),
            join_timeout: Duration::from_secs(5),
            enabled: settings.enabled,
        }
    }
}

/// Outcome of one scope within a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRun {
    pub scope: SyncScope,
    pub report: AutoSyncReport,
}

/// Interval-driven reconciliation runner with explicit start/stop.
pub struct SyncScheduler {
    validator: Arc<SyncValidator>,
    scopes: Arc<[SyncScope]>,
    config: SyncSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    pub fn new(
        validator: Arc<SyncValidator>,
        scopes: Vec<SyncScope>,
        config: SyncSchedulerConfig,
    ) -> Self {
        Self {
            validator,
            scopes: scopes.into(),
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn scopes(&self) -> &[SyncScope] {
        &self.scopes
    }

    /// Start the background loop. The first pass runs one interval after
    /// start; call [`run_once`](Self::run_once) for an immediate pass.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is already running or disabled.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if !self.config.enabled {
            return Err(SchedulerError::Disabled);
        }
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(scopes = self.scopes.len(), interval = ?self.config.interval, "Starting sync scheduler");

        // Fresh token so the scheduler can be restarted after stop.
        self.cancellation_token = CancellationToken::new();

        let validator = Arc::clone(&self.validator);
        let scopes = Arc::clone(&self.scopes);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sync_loop(validator, scopes, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Cancel the background loop and wait for it to finish.
    ///
    /// A pass in progress is abandoned at its next await point.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is not running or the loop does not
    /// finish within the join timeout.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping sync scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Sync scheduler stopped");
        Ok(())
    }

    /// A scheduler is running while its loop task exists and has not
    /// finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Run one reconciliation pass over every scope now.
    pub async fn run_once(&self) -> Vec<ScopeRun> {
        Self::run_pass(&self.validator, &self.scopes, &self.config).await
    }

    async fn sync_loop(
        validator: Arc<SyncValidator>,
        scopes: Arc<[SyncScope]>,
        config: SyncSchedulerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Sync loop cancelled");
                    break;
                }
                () = tokio::time::sleep(config.interval) => {
                    tokio::select! {
                        () = cancel.cancelled() => {
                            debug!("Sync loop cancelled during pass");
                            break;
                        }
                        _ = Self::run_pass(&validator, &scopes, &config) => {}
                    }
                }
            }
        }
    }

    #[instrument(skip_all, fields(scopes = scopes.len()))]
    async fn run_pass(
        validator: &SyncValidator,
        scopes: &[SyncScope],
        config: &SyncSchedulerConfig,
    ) -> Vec<ScopeRun> {
        let started = Instant::now();
        let mut runs = Vec::with_capacity(scopes.len());

        for scope in scopes {
            let report = match tokio::time::timeout(
                config.scope_timeout,
                validator.check_and_auto_sync(scope),
            )
            .await
            {
                Ok(report) => report,
                Err(_) => AutoSyncReport {
                    success: false,
                    message: format!("reconciliation timed out after {:?}", config.scope_timeout),
                    sync_triggered: false,
                },
            };

            if report.success {
                debug!(scope = %scope, synced = report.sync_triggered, message = %report.message, "scope reconciled");
            } else {
                warn!(scope = %scope, message = %report.message, "scope reconciliation failed");
            }
            runs.push(ScopeRun { scope: scope.clone(), report });
        }

        let failed = runs.iter().filter(|run| !run.report.success).count();
        let synced = runs.iter().filter(|run| run.report.sync_triggered).count();
        info!(
            failed,
            synced,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "reconciliation pass completed"
        );
        runs
    }
}

/// Ensure the loop is cancelled when the scheduler is dropped
impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() && self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling");
        }
        self.cancellation_token.cancel();
    }
}
