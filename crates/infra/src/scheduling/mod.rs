//! Background scheduling for periodic reconciliation.
//!
//! The scheduler follows the runtime rules used across the crate:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on every pass and on shutdown

pub mod error;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{ScopeRun, SyncScheduler, SyncSchedulerConfig};
