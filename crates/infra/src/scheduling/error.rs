//! Scheduler error types

use std::time::Duration;

use adsync_domain::AdSyncError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Scheduler is disabled by configuration")]
    Disabled,

    #[error("Operation timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] tokio::task::JoinError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let mapped = match err {
            SchedulerError::AlreadyRunning
            | SchedulerError::NotRunning
            | SchedulerError::Disabled => AdSyncError::InvalidInput(err.to_string()),
            SchedulerError::Timeout { .. } => AdSyncError::Timeout(err.to_string()),
            SchedulerError::TaskJoinFailed(_) => AdSyncError::Internal(err.to_string()),
        };
        Self(mapped)
    }
}

impl From<SchedulerError> for AdSyncError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
