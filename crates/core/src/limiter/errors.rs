//! Limiter and remote-call error types.

use std::fmt;
use std::time::Duration;

use adsync_domain::AdSyncError;
use thiserror::Error;

/// Identifies the rate-limit bucket a call consumes (one per ad account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AccountKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Transport-level failure category for calls that never got a platform
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Decode,
    Other,
}

/// Failure reported by a remote call.
///
/// Carries whatever the platform told us (HTTP status, `error.code`,
/// `error.error_subcode`, message) so the classifier can recognise
/// throttling without string-typed guesswork at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub code: Option<i64>,
    pub subcode: Option<i64>,
    pub message: String,
    pub transport: Option<TransportKind>,
}

impl RemoteError {
    /// Error body returned by the platform.
    pub fn api(
        status: Option<u16>,
        code: Option<i64>,
        subcode: Option<i64>,
        message: impl Into<String>,
    ) -> Self {
        Self { status, code, subcode, message: message.into(), transport: None }
    }

    /// Non-success HTTP status without a parseable error body.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::api(Some(status), None, None, message)
    }

    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self { status: None, code: None, subcode: None, message: message.into(), transport: Some(kind) }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::transport(TransportKind::Other, message)
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_subcode(mut self, subcode: i64) -> Self {
        self.subcode = Some(subcode);
        self
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP {status}: ")?;
        }
        f.write_str(&self.message)?;
        match (self.code, self.subcode) {
            (Some(code), Some(subcode)) => write!(f, " (code {code}, subcode {subcode})"),
            (Some(code), None) => write!(f, " (code {code})"),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Closed classification of remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    RateLimited,
    Timeout,
    Other,
}

/// Why a submitted task did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimiterError {
    #[error("account {account} is rate limited, retry after {}s", ceil_secs(.retry_after))]
    RateLimited { account: AccountKey, retry_after: Duration },

    #[error("task {task_id} timed out after {waited:?} in queue")]
    Timeout { task_id: String, waited: Duration },

    #[error("rate limited after {attempts} retries: {source}")]
    RetriesExhausted { attempts: u32, source: RemoteError },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("timeout must be positive")]
    InvalidTimeout,

    #[error("invalid limiter configuration: {0}")]
    Config(String),

    #[error("task {0} was dropped before completion")]
    Dropped(String),
}

impl LimiterError {
    /// Class of this failure as seen by the caller.
    ///
    /// `Remote` is reported as `Other`: the limiter only hands back remote
    /// errors it decided not to retry.
    pub const fn kind(&self) -> ErrorClass {
        match self {
            Self::RateLimited { .. } | Self::RetriesExhausted { .. } => ErrorClass::RateLimited,
            Self::Timeout { .. } => ErrorClass::Timeout,
            Self::Remote(_) | Self::InvalidTimeout | Self::Config(_) | Self::Dropped(_) => {
                ErrorClass::Other
            }
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

fn ceil_secs(duration: &Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

impl From<LimiterError> for AdSyncError {
    fn from(err: LimiterError) -> Self {
        let message = err.to_string();
        match err {
            LimiterError::RateLimited { .. } | LimiterError::RetriesExhausted { .. } => {
                Self::RateLimited(message)
            }
            LimiterError::Timeout { .. } => Self::Timeout(message),
            LimiterError::Remote(remote) if remote.transport.is_some() => Self::Network(message),
            LimiterError::Remote(_) => Self::Remote(message),
            LimiterError::InvalidTimeout => Self::InvalidInput(message),
            LimiterError::Config(_) => Self::Config(message),
            LimiterError::Dropped(_) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_rounds_retry_after_up() {
        let err = LimiterError::RateLimited {
            account: AccountKey::from("act_1"),
            retry_after: Duration::from_millis(59_200),
        };
        assert_eq!(err.to_string(), "account act_1 is rate limited, retry after 60s");
        assert_eq!(err.kind(), ErrorClass::RateLimited);
    }

    #[test]
    fn remote_error_display_includes_codes() {
        let err = RemoteError::api(Some(400), Some(17), Some(2_446_079), "User request limit reached");
        assert_eq!(
            err.to_string(),
            "HTTP 400: User request limit reached (code 17, subcode 2446079)"
        );
    }

    #[test]
    fn converts_into_domain_errors() {
        let timeout = LimiterError::Timeout { task_id: "t".into(), waited: Duration::from_secs(1) };
        assert!(matches!(AdSyncError::from(timeout), AdSyncError::Timeout(_)));

        let network = LimiterError::from(RemoteError::transport(TransportKind::Connect, "refused"));
        assert!(matches!(AdSyncError::from(network), AdSyncError::Network(_)));

        let remote = LimiterError::from(RemoteError::http(500, "boom"));
        assert_eq!(AdSyncError::from(remote).label(), "remote");
    }
}
