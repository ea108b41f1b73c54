//! Testing utilities shared by the AdSync test suites.
//!
//! - [`init_test_tracing`]: route `tracing` output through the test harness
//! - [`poll_until`]: wait for a condition on tokio's clock, so it also works
//!   under `start_paused` tests
//! - [`assert_approx_eq`]: float comparison for budget amounts

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `warn` so passing tests stay quiet.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Polls `condition` every `interval` until it returns true or `timeout`
/// elapses on tokio's clock.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }

    condition().await
}

/// Asserts `|actual - expected| <= epsilon`.
#[track_caller]
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= epsilon,
        "values not approximately equal: {actual} vs {expected} (diff: {diff})"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn poll_until_sees_condition_flip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let reached = poll_until(Duration::from_secs(5), Duration::from_millis(100), || {
            let counter = counter.clone();
            async move { counter.fetch_add(1, Ordering::SeqCst) >= 3 }
        })
        .await;

        assert!(reached);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_until_gives_up_after_timeout() {
        let reached =
            poll_until(Duration::from_secs(1), Duration::from_millis(200), || async { false })
                .await;
        assert!(!reached);
    }

    #[test]
    fn approx_eq_accepts_tolerance_boundary() {
        assert_approx_eq(100.0, 100.01, 0.010_000_1);
    }

    #[test]
    #[should_panic(expected = "not approximately equal")]
    fn approx_eq_rejects_outside_tolerance() {
        assert_approx_eq(100.0, 100.5, 0.01);
    }
}
