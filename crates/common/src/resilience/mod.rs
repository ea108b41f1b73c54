//! Resilience building blocks.
//!
//! Only delay schedules live here. Retry *decisions* depend on how a caller
//! classifies its errors, so the loops that use these schedules stay with
//! their callers.

pub mod backoff;

pub use backoff::{BackoffError, BackoffStrategy, DEFAULT_MAX_DELAY};
