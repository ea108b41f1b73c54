//! Per-account throttling bookkeeping.
//!
//! All timestamps use [`tokio::time::Instant`] so the limiter can be driven
//! by a paused clock in tests.

use std::time::Duration;

use tokio::time::Instant;

/// Request accounting for one rate-limit bucket.
///
/// Owned by the account's drain loop; submissions only read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountRateState {
    pub last_request_time: Option<Instant>,
    pub request_count: u32,
    pub is_rate_limited: bool,
    pub rate_limit_reset_at: Option<Instant>,
}

impl AccountRateState {
    /// Resets the request counter once more than `window` has passed since
    /// the last dispatch.
    pub fn refresh_window(&mut self, now: Instant, window: Duration) {
        if self.window_expired(now, window) {
            self.request_count = 0;
        }
    }

    /// Time left on an active cooldown, `None` when calls may proceed.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        if !self.is_rate_limited {
            return None;
        }
        match self.rate_limit_reset_at {
            Some(reset_at) if now < reset_at => Some(reset_at - now),
            _ => None,
        }
    }

    /// Drops an elapsed cooldown and starts a fresh counting window.
    ///
    /// Returns true when a cooldown was actually cleared.
    pub fn clear_expired_cooldown(&mut self, now: Instant) -> bool {
        if !self.is_rate_limited || self.cooldown_remaining(now).is_some() {
            return false;
        }
        self.is_rate_limited = false;
        self.rate_limit_reset_at = None;
        self.request_count = 0;
        true
    }

    /// How long the next dispatch must wait to honour `min_interval`.
    pub fn interval_wait(&self, now: Instant, min_interval: Duration) -> Duration {
        self.last_request_time.map_or(Duration::ZERO, |last| {
            min_interval.saturating_sub(now.saturating_duration_since(last))
        })
    }

    /// Time until the hourly window rolls over when `max_requests` have
    /// already been sent inside it, `None` while under the ceiling.
    pub fn ceiling_remaining(
        &self,
        now: Instant,
        window: Duration,
        max_requests: u32,
    ) -> Option<Duration> {
        if self.request_count < max_requests || self.window_expired(now, window) {
            return None;
        }
        let last = self.last_request_time?;
        Some(window.saturating_sub(now.saturating_duration_since(last)))
    }

    /// Books a dispatch. Counted when the call leaves, not when it succeeds,
    /// so failed calls still space out the next one.
    pub fn record_dispatch(&mut self, now: Instant) {
        self.last_request_time = Some(now);
        self.request_count = self.request_count.saturating_add(1);
    }

    pub fn record_success(&mut self) {
        self.is_rate_limited = false;
        self.rate_limit_reset_at = None;
    }

    /// Opens (or extends) a cooldown ending `cooldown` from `now`.
    pub fn mark_rate_limited(&mut self, now: Instant, cooldown: Duration) {
        let until = now + cooldown;
        let reset_at = match self.rate_limit_reset_at {
            Some(existing) if self.is_rate_limited && existing > until => existing,
            _ => until,
        };
        self.is_rate_limited = true;
        self.rate_limit_reset_at = Some(reset_at);
    }

    fn window_expired(&self, now: Instant, window: Duration) -> bool {
        self.last_request_time.is_some_and(|last| now.saturating_duration_since(last) > window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn fresh_state_has_no_waits() {
        let state = AccountRateState::default();
        let now = Instant::now();
        assert_eq!(state.interval_wait(now, Duration::from_secs(1)), Duration::ZERO);
        assert_eq!(state.cooldown_remaining(now), None);
        assert_eq!(state.ceiling_remaining(now, HOUR, 1), None);
    }

    #[test]
    fn interval_wait_counts_down_from_last_dispatch() {
        let start = Instant::now();
        let mut state = AccountRateState::default();
        state.record_dispatch(start);

        let later = start + Duration::from_millis(400);
        assert_eq!(state.interval_wait(later, Duration::from_secs(1)), Duration::from_millis(600));
        assert_eq!(
            state.interval_wait(start + Duration::from_secs(2), Duration::from_secs(1)),
            Duration::ZERO
        );
    }

    #[test]
    fn window_resets_only_after_it_elapses() {
        let start = Instant::now();
        let mut state = AccountRateState::default();
        state.record_dispatch(start);
        state.record_dispatch(start);

        state.refresh_window(start + HOUR, HOUR);
        assert_eq!(state.request_count, 2);

        state.refresh_window(start + HOUR + Duration::from_secs(1), HOUR);
        assert_eq!(state.request_count, 0);
    }

    #[test]
    fn ceiling_reports_time_until_window_rolls() {
        let start = Instant::now();
        let mut state = AccountRateState::default();
        state.record_dispatch(start);
        state.record_dispatch(start);

        let now = start + Duration::from_secs(600);
        assert_eq!(state.ceiling_remaining(now, HOUR, 3), None);
        assert_eq!(state.ceiling_remaining(now, HOUR, 2), Some(Duration::from_secs(3000)));
        assert_eq!(state.ceiling_remaining(start + HOUR * 2, HOUR, 2), None);
    }

    #[test]
    fn cooldown_lifecycle() {
        let start = Instant::now();
        let mut state = AccountRateState::default();
        state.record_dispatch(start);
        state.mark_rate_limited(start, Duration::from_secs(60));

        let mid = start + Duration::from_secs(15);
        assert_eq!(state.cooldown_remaining(mid), Some(Duration::from_secs(45)));
        assert!(!state.clear_expired_cooldown(mid));

        let after = start + Duration::from_secs(60);
        assert_eq!(state.cooldown_remaining(after), None);
        assert!(state.clear_expired_cooldown(after));
        assert!(!state.is_rate_limited);
        assert_eq!(state.request_count, 0);
    }

    #[test]
    fn shorter_cooldown_does_not_shrink_active_one() {
        let start = Instant::now();
        let mut state = AccountRateState::default();
        state.mark_rate_limited(start, Duration::from_secs(60));
        state.mark_rate_limited(start, Duration::from_secs(5));
        assert_eq!(state.cooldown_remaining(start), Some(Duration::from_secs(60)));
    }

    #[test]
    fn success_clears_rate_limit_flag() {
        let start = Instant::now();
        let mut state = AccountRateState::default();
        state.mark_rate_limited(start, Duration::from_secs(60));
        state.record_success();
        assert_eq!(state.cooldown_remaining(start), None);
    }
}
