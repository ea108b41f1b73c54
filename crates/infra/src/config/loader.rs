//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Read a `.env` file if one exists (never overriding real variables)
//! 2. Attempt to load from `ADSYNC_*` environment variables
//! 3. If `ADSYNC_DB_PATH` is missing, fall back to a config file
//! 4. Probe several paths for config files (JSON or TOML)
//!
//! ## Environment Variables
//! - `ADSYNC_DB_PATH` (required for env loading): database file path
//! - `ADSYNC_DB_POOL_SIZE`: connection pool size
//! - `ADSYNC_SYNC_INTERVAL`: reconciliation interval in seconds
//! - `ADSYNC_SYNC_ENABLED`: whether the scheduler runs (true/false)
//! - `ADSYNC_MIN_INTERVAL_MS`: minimum spacing between calls per account
//! - `ADSYNC_MAX_REQUESTS_PER_HOUR`: hourly ceiling per account
//! - `ADSYNC_COOLDOWN_SECS`: cooldown after a throttling response
//! - `ADSYNC_MAX_RETRIES`: retries for throttled calls
//! - `ADSYNC_PLATFORM_BASE_URL` / `ADSYNC_PLATFORM_API_VERSION`
//! - `ADSYNC_LOG_LEVEL` / `ADSYNC_LOG_JSON`
//! - `ADSYNC_ACCOUNTS`: comma-separated `scope:ad_account_id:TOKEN_ENV`
//!   triples
//!
//! ## File Locations
//! `adsync.{json,toml}` then `config.{json,toml}` in the working directory,
//! its parent and grandparent, then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use adsync_domain::{AccountBinding, AdSyncError, AppConfig, Result};

const FILE_STEMS: [&str; 2] = ["adsync", "config"];
const FILE_EXTENSIONS: [&str; 2] = ["json", "toml"];
const PARENT_LEVELS: usize = 2;

/// Load configuration, environment first and files second.
///
/// # Errors
/// Returns `AdSyncError::Config` if neither source yields a configuration or
/// the chosen source is malformed.
pub fn load() -> Result<AppConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `ADSYNC_*` environment variables.
///
/// `ADSYNC_DB_PATH` marks the environment as configured; every other
/// variable is optional and falls back to the defaults.
///
/// # Errors
/// Returns `AdSyncError::Config` when `ADSYNC_DB_PATH` is missing or a
/// present variable cannot be parsed.
pub fn load_from_env() -> Result<AppConfig> {
    let mut config = AppConfig::default();

    config.database.path = env_var("ADSYNC_DB_PATH")?;
    if let Some(size) = env_parse("ADSYNC_DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }

    if let Some(interval) = env_parse("ADSYNC_SYNC_INTERVAL")? {
        config.scheduler.interval_seconds = interval;
    }
    config.scheduler.enabled = env_bool("ADSYNC_SYNC_ENABLED", config.scheduler.enabled);

    if let Some(ms) = env_parse("ADSYNC_MIN_INTERVAL_MS")? {
        config.limiter.min_interval_ms = ms;
    }
    if let Some(ceiling) = env_parse("ADSYNC_MAX_REQUESTS_PER_HOUR")? {
        config.limiter.max_requests_per_hour = ceiling;
    }
    if let Some(cooldown) = env_parse("ADSYNC_COOLDOWN_SECS")? {
        config.limiter.cooldown_secs = cooldown;
    }
    if let Some(retries) = env_parse("ADSYNC_MAX_RETRIES")? {
        config.limiter.max_retries = retries;
    }

    if let Ok(base_url) = std::env::var("ADSYNC_PLATFORM_BASE_URL") {
        config.platform.base_url = base_url;
    }
    if let Ok(version) = std::env::var("ADSYNC_PLATFORM_API_VERSION") {
        config.platform.api_version = version;
    }

    if let Ok(level) = std::env::var("ADSYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("ADSYNC_LOG_JSON", config.logging.json);

    if let Ok(accounts) = std::env::var("ADSYNC_ACCOUNTS") {
        config.accounts = parse_accounts(&accounts)?;
    }

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations (see
/// [`probe_config_paths`]). Format is picked from the file extension.
///
/// # Errors
/// Returns `AdSyncError::Config` if no file is found or it cannot be parsed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AdSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AdSyncError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AdSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AdSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AdSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AdSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().take(PARENT_LEVELS + 1).map(Path::to_path_buf));
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots.iter().find_map(|root| probe_dir(root))
}

fn probe_dir(dir: &Path) -> Option<PathBuf> {
    FILE_STEMS
        .iter()
        .flat_map(|stem| FILE_EXTENSIONS.iter().map(move |ext| dir.join(format!("{stem}.{ext}"))))
        .find(|candidate| candidate.is_file())
}

/// Parse `scope:ad_account_id:TOKEN_ENV` triples separated by commas.
fn parse_accounts(raw: &str) -> Result<Vec<AccountBinding>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            match parts.as_slice() {
                [scope, ad_account_id, token_env]
                    if !scope.is_empty() && !ad_account_id.is_empty() && !token_env.is_empty() =>
                {
                    Ok(AccountBinding {
                        scope: (*scope).to_string(),
                        ad_account_id: (*ad_account_id).to_string(),
                        token_env: (*token_env).to_string(),
                    })
                }
                _ => Err(AdSyncError::Config(format!(
                    "Invalid ADSYNC_ACCOUNTS entry '{entry}', expected scope:ad_account_id:TOKEN_ENV"
                ))),
            }
        })
        .collect()
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| AdSyncError::Config(format!("Missing required environment variable: {key}")))
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AdSyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive); anything else counts as false.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ENV_KEYS: &[&str] = &[
        "ADSYNC_DB_PATH",
        "ADSYNC_DB_POOL_SIZE",
        "ADSYNC_SYNC_INTERVAL",
        "ADSYNC_SYNC_ENABLED",
        "ADSYNC_MIN_INTERVAL_MS",
        "ADSYNC_MAX_REQUESTS_PER_HOUR",
        "ADSYNC_COOLDOWN_SECS",
        "ADSYNC_MAX_RETRIES",
        "ADSYNC_PLATFORM_BASE_URL",
        "ADSYNC_PLATFORM_API_VERSION",
        "ADSYNC_LOG_LEVEL",
        "ADSYNC_LOG_JSON",
        "ADSYNC_ACCOUNTS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("ADSYNC_TEST_BOOL", "YES");
        assert!(env_bool("ADSYNC_TEST_BOOL", false));
        std::env::set_var("ADSYNC_TEST_BOOL", "off");
        assert!(!env_bool("ADSYNC_TEST_BOOL", true));
        std::env::remove_var("ADSYNC_TEST_BOOL");
        assert!(env_bool("ADSYNC_TEST_BOOL", true));
    }

    #[test]
    fn test_load_from_env_overrides_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ADSYNC_DB_PATH", "/tmp/adsync-test.db");
        std::env::set_var("ADSYNC_DB_POOL_SIZE", "8");
        std::env::set_var("ADSYNC_SYNC_INTERVAL", "120");
        std::env::set_var("ADSYNC_SYNC_ENABLED", "false");
        std::env::set_var("ADSYNC_MIN_INTERVAL_MS", "250");
        std::env::set_var("ADSYNC_ACCOUNTS", "tenant-1:act_1:T1_TOKEN, tenant-2:2:T2_TOKEN");

        let config = load_from_env().expect("env config");
        clear_env();

        assert_eq!(config.database.path, "/tmp/adsync-test.db");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.scheduler.interval_seconds, 120);
        assert!(!config.scheduler.enabled);
        assert_eq!(config.limiter.min_interval_ms, 250);
        assert_eq!(config.limiter.max_retries, AppConfig::default().limiter.max_retries);
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[1].scope, "tenant-2");
        assert_eq!(config.accounts[1].token_env, "T2_TOKEN");
    }

    #[test]
    fn test_load_from_env_missing_db_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, AdSyncError::Config(ref msg) if msg.contains("ADSYNC_DB_PATH")));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ADSYNC_DB_PATH", "/tmp/adsync-test.db");
        std::env::set_var("ADSYNC_MAX_REQUESTS_PER_HOUR", "lots");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(AdSyncError::Config(_))));
    }

    #[test]
    fn malformed_account_entry_is_rejected() {
        assert!(parse_accounts("tenant-1:act_1").is_err());
        assert!(parse_accounts("tenant-1::TOKEN").is_err());
        assert!(parse_accounts(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("adsync.toml");
        std::fs::write(
            &path,
            r#"
[database]
path = "campaigns.db"

[scheduler]
interval_seconds = 60

[[accounts]]
scope = "tenant-1"
ad_account_id = "act_42"
token_env = "TENANT_1_TOKEN"
"#,
        )
        .unwrap();

        let config = load_from_file(Some(path)).expect("toml config");
        assert_eq!(config.database.path, "campaigns.db");
        assert_eq!(config.scheduler.interval_seconds, 60);
        assert_eq!(config.accounts[0].ad_account_id, "act_42");
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"validator": {"repair_budget_mismatches": false}}"#).unwrap();

        let config = load_from_file(Some(path)).expect("json config");
        assert!(!config.validator.repair_budget_mismatches);
        assert_eq!(config.platform, AppConfig::default().platform);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/adsync.json"))).unwrap_err();
        assert!(matches!(err, AdSyncError::Config(_)));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        assert!(parse_config("a: b", Path::new("adsync.yaml")).is_err());
        assert!(parse_config("{ not json", Path::new("adsync.json")).is_err());
    }

    #[test]
    fn directory_lookup_prefers_adsync_over_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        assert_eq!(probe_dir(dir.path()), Some(dir.path().join("config.toml")));

        std::fs::write(dir.path().join("adsync.json"), "{}").unwrap();
        assert_eq!(probe_dir(dir.path()), Some(dir.path().join("adsync.json")));
    }
}
