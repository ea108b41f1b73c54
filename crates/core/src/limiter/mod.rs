//! Rate-governed execution of remote platform calls.
//!
//! Callers hand the [`RateLimiter`] an async closure tagged with the
//! account whose quota it consumes. The limiter queues it by priority,
//! spaces dispatches per account, fails fast while an account is cooling
//! down and retries rate-limited calls with exponential backoff.

pub mod account_state;
pub mod classify;
pub mod config;
pub mod errors;
pub mod queue;
pub mod rate_limiter;

pub use account_state::AccountRateState;
pub use classify::{RateLimitClassifier, RateLimitSignature};
pub use config::LimiterConfig;
pub use errors::{AccountKey, ErrorClass, LimiterError, RemoteError, TransportKind};
pub use queue::{QueuedTask, RemoteJob, RequestQueue};
pub use rate_limiter::{AccountStatus, RateLimiter, TaskHandle, TaskSpec};
