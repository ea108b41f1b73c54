//! Process-wide tracing setup.
//!
//! `RUST_LOG` wins over the configured level so operators can raise verbosity
//! for one run without touching the config file.

use adsync_domain::{AdSyncError, LoggingConfig, Result};
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`AdSyncError::Config`] when the configured level is not a valid
/// filter directive and [`AdSyncError::Internal`] when a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| AdSyncError::Internal(format!("tracing already initialised: {e}")))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| AdSyncError::Config(format!("invalid log level '{}': {e}", config.level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig { level: "adsync=verbose".to_string(), json: false };
        assert!(matches!(build_filter(&config), Err(AdSyncError::Config(_))));
    }

    #[test]
    fn accepts_directive_list() {
        let config =
            LoggingConfig { level: "info,adsync_core::limiter=debug".to_string(), json: true };
        assert!(build_filter(&config).is_ok());
    }
}
