//! Shared test helpers for `adsync-core` integration tests.
//!
//! In-memory port implementations so validator tests can focus on
//! behaviour instead of storage or HTTP plumbing.

#![allow(dead_code)]

pub mod repositories;

use std::time::Duration;

use adsync_core::limiter::{LimiterConfig, RateLimiter, RemoteError};

/// Limiter with default throttling rules.
pub fn limiter() -> RateLimiter {
    RateLimiter::new(LimiterConfig::default()).unwrap()
}

pub fn limiter_with(config: LimiterConfig) -> RateLimiter {
    RateLimiter::new(config).unwrap()
}

/// Platform "user request limit reached" error.
pub fn throttled() -> RemoteError {
    RemoteError::api(Some(400), Some(17), Some(2_446_079), "User request limit reached")
}

pub fn invalid_parameter() -> RemoteError {
    RemoteError::api(Some(400), Some(100), None, "Invalid parameter")
}

pub const LONG_TIMEOUT: Duration = Duration::from_secs(600);
