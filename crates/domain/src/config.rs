//! Configuration structures
//!
//! Every section deserializes with defaults so partial JSON/TOML files are
//! valid. Durations are plain integers with the unit in the field name.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_BASE_SECS, DEFAULT_BUDGET_TOLERANCE, DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE,
    DEFAULT_MAX_REQUESTS_PER_HOUR, DEFAULT_MAX_RETRIES, DEFAULT_MINOR_UNITS_PER_MAJOR,
    DEFAULT_MIN_REQUEST_INTERVAL_MS, DEFAULT_PAGE_SIZE, DEFAULT_PLATFORM_API_VERSION,
    DEFAULT_PLATFORM_BASE_URL, DEFAULT_PLATFORM_TIMEOUT_SECS, DEFAULT_RATE_LIMIT_COOLDOWN_SECS,
    DEFAULT_SNAPSHOT_PRIORITY, DEFAULT_SNAPSHOT_TIMEOUT_SECS, DEFAULT_SYNC_INTERVAL_SECS,
    DEFAULT_TRACKED_STATUSES,
};

/// Root application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub limiter: LimiterSettings,
    pub validator: ValidatorSettings,
    pub platform: PlatformSettings,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerSettings,
    pub logging: LoggingConfig,
    pub accounts: Vec<AccountBinding>,
}

/// Outbound call throttling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterSettings {
    pub min_interval_ms: u64,
    pub max_requests_per_hour: u32,
    pub cooldown_secs: u64,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_REQUEST_INTERVAL_MS,
            max_requests_per_hour: DEFAULT_MAX_REQUESTS_PER_HOUR,
            cooldown_secs: DEFAULT_RATE_LIMIT_COOLDOWN_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
        }
    }
}

/// Reconciliation rules: which remote fields matter and how strictly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    pub budget_tolerance: f64,
    pub minor_units_per_major: f64,
    /// Remote `effective_status` values that count as "exists remotely".
    pub tracked_statuses: Vec<String>,
    pub snapshot_priority: i32,
    pub snapshot_timeout_secs: u64,
    pub repair_budget_mismatches: bool,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            budget_tolerance: DEFAULT_BUDGET_TOLERANCE,
            minor_units_per_major: DEFAULT_MINOR_UNITS_PER_MAJOR,
            tracked_statuses: DEFAULT_TRACKED_STATUSES.iter().map(|s| (*s).to_string()).collect(),
            snapshot_priority: DEFAULT_SNAPSHOT_PRIORITY,
            snapshot_timeout_secs: DEFAULT_SNAPSHOT_TIMEOUT_SECS,
            repair_budget_mismatches: true,
        }
    }
}

/// Ad platform HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    pub base_url: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
    pub page_size: u32,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PLATFORM_BASE_URL.to_string(),
            api_version: DEFAULT_PLATFORM_API_VERSION.to_string(),
            request_timeout_secs: DEFAULT_PLATFORM_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub interval_seconds: u64,
    pub enabled: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { interval_seconds: DEFAULT_SYNC_INTERVAL_SECS, enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// Maps a local sync scope to a platform ad account.
///
/// The access token is read from the environment variable named by
/// `token_env` so it never lives in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBinding {
    pub scope: String,
    pub ad_account_id: String,
    pub token_env: String,
}
