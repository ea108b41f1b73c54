//! Retry delay schedules.

use std::time::Duration;

use thiserror::Error;

/// Ceiling applied when a strategy does not set one.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3600);

/// How long to wait before retry number `attempt` (zero-based).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// Same delay every time.
    Fixed(Duration),
    /// `initial_delay * base^attempt`, capped at `max_delay`.
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

/// Rejected backoff parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackoffError {
    #[error("exponential base must be at least 1.0")]
    InvalidBase,
    #[error("max_delay must not be shorter than initial_delay")]
    InvertedBounds,
}

impl BackoffStrategy {
    /// Doubling schedule starting at `initial_delay`: 1x, 2x, 4x, ...
    #[must_use]
    pub const fn doubling(initial_delay: Duration) -> Self {
        Self::Exponential { initial_delay, base: 2.0, max_delay: DEFAULT_MAX_DELAY }
    }

    /// Delay to apply before retry number `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let secs = initial_delay.as_secs_f64() * base.powi(exponent);
                // powi saturates to +inf, which min() folds back into range.
                Duration::from_secs_f64(secs.min(max_delay.as_secs_f64()).max(0.0))
            }
        }
    }

    pub fn validate(&self) -> Result<(), BackoffError> {
        match *self {
            Self::Fixed(_) => Ok(()),
            Self::Exponential { base, .. } if base.is_nan() || base < 1.0 || base.is_infinite() => {
                Err(BackoffError::InvalidBase)
            }
            Self::Exponential { initial_delay, max_delay, .. } if max_delay < initial_delay => {
                Err(BackoffError::InvertedBounds)
            }
            Self::Exponential { .. } => Ok(()),
        }
    }
}
