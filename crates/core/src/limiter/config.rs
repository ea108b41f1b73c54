//! Limiter configuration.

use std::time::Duration;

use adsync_common::resilience::BackoffStrategy;
use adsync_domain::constants::HOURLY_WINDOW_SECS;
use adsync_domain::LimiterSettings;

use super::classify::RateLimitClassifier;
use super::errors::LimiterError;

/// Throttling rules applied to every account.
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterConfig {
    /// Minimum spacing between two dispatches for the same account.
    pub min_interval: Duration,
    pub max_requests_per_hour: u32,
    pub hourly_window: Duration,
    /// How long an account stays blocked after a rate-limit response.
    pub cooldown: Duration,
    pub max_retries: u32,
    /// Delay before retry `n` (1-based) of a rate-limited task.
    pub backoff: BackoffStrategy,
    pub classifier: RateLimitClassifier,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::from(&LimiterSettings::default())
    }
}

impl From<&LimiterSettings> for LimiterConfig {
    fn from(settings: &LimiterSettings) -> Self {
        Self {
            min_interval: Duration::from_millis(settings.min_interval_ms),
            max_requests_per_hour: settings.max_requests_per_hour,
            hourly_window: Duration::from_secs(HOURLY_WINDOW_SECS),
            cooldown: Duration::from_secs(settings.cooldown_secs),
            max_retries: settings.max_retries,
            backoff: BackoffStrategy::doubling(Duration::from_secs(settings.backoff_base_secs)),
            classifier: RateLimitClassifier::default_table(),
        }
    }
}

impl LimiterConfig {
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_max_requests_per_hour(mut self, max: u32) -> Self {
        self.max_requests_per_hour = max;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_classifier(mut self, classifier: RateLimitClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn validate(&self) -> Result<(), LimiterError> {
        if self.min_interval.is_zero() {
            return Err(LimiterError::Config("min_interval must be positive".into()));
        }
        if self.max_requests_per_hour == 0 {
            return Err(LimiterError::Config("max_requests_per_hour must be positive".into()));
        }
        if self.hourly_window.is_zero() {
            return Err(LimiterError::Config("hourly_window must be positive".into()));
        }
        if self.cooldown.is_zero() {
            return Err(LimiterError::Config("cooldown must be positive".into()));
        }
        self.backoff.validate().map_err(|err| LimiterError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_settings() {
        let config = LimiterConfig::default();
        assert_eq!(config.min_interval, Duration::from_secs(1));
        assert_eq!(config.max_requests_per_hour, 200);
        assert_eq!(config.cooldown, Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff.delay_for(1), Duration::from_secs(2));
        assert_eq!(config.backoff.delay_for(3), Duration::from_secs(8));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_values() {
        let zero_interval = LimiterConfig::default().with_min_interval(Duration::ZERO);
        assert!(matches!(zero_interval.validate(), Err(LimiterError::Config(_))));

        let zero_ceiling = LimiterConfig::default().with_max_requests_per_hour(0);
        assert!(matches!(zero_ceiling.validate(), Err(LimiterError::Config(_))));

        let zero_cooldown = LimiterConfig::default().with_cooldown(Duration::ZERO);
        assert!(zero_cooldown.validate().is_err());
    }

    #[test]
    fn zero_retries_is_allowed() {
        assert!(LimiterConfig::default().with_max_retries(0).validate().is_ok());
    }
}
