//! Application constants
//!
//! Centralized defaults for the limiter, the reconciliation validator and the
//! platform client. Configuration structs fall back to these values.

// Rate limiter
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_REQUESTS_PER_HOUR: u32 = 200;
pub const DEFAULT_RATE_LIMIT_COOLDOWN_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE_SECS: u64 = 1;
pub const HOURLY_WINDOW_SECS: u64 = 3_600;

// Reconciliation
pub const DEFAULT_BUDGET_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MINOR_UNITS_PER_MAJOR: f64 = 100.0;
pub const DEFAULT_SNAPSHOT_PRIORITY: i32 = 10;
pub const DEFAULT_SNAPSHOT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TRACKED_STATUSES: [&str; 2] = ["ACTIVE", "PAUSED"];

// Ad platform
pub const DEFAULT_PLATFORM_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_PLATFORM_API_VERSION: &str = "v19.0";
pub const DEFAULT_PLATFORM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGES_PER_LISTING: usize = 50;

// Scheduler
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 900;

// Storage
pub const DEFAULT_DB_PATH: &str = "adsync.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
