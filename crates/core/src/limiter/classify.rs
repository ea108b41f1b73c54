//! Rate-limit recognition for remote failures.
//!
//! The platform signals throttling through several overlapping channels:
//! bare error codes, `(code, subcode)` pairs, HTTP 429 and, occasionally,
//! only a message. Recognition is table driven so new signatures can be
//! added from configuration without touching the limiter.

use serde::{Deserialize, Serialize};

use super::errors::{ErrorClass, RemoteError, TransportKind};

/// One way the platform says "slow down".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateLimitSignature {
    CodeSubcode { code: i64, subcode: i64 },
    Code { code: i64 },
    /// Case-insensitive substring of the error message.
    MessageContains { needle: String },
}

impl RateLimitSignature {
    fn matches(&self, error: &RemoteError, message_lower: &str) -> bool {
        match self {
            Self::CodeSubcode { code, subcode } => {
                error.code == Some(*code) && error.subcode == Some(*subcode)
            }
            Self::Code { code } => error.code == Some(*code),
            Self::MessageContains { needle } => message_lower.contains(&needle.to_lowercase()),
        }
    }
}

/// Graph API throttling codes: app, user, page, custom-level and
/// ads-management limits, plus the business-use-case range.
const RATE_LIMIT_CODES: &[i64] = &[4, 17, 32, 613];
const BUSINESS_USE_CASE_CODES: std::ops::RangeInclusive<i64> = 80_000..=80_014;
const RATE_LIMIT_PAIRS: &[(i64, i64)] = &[(17, 2_446_079), (613, 1_487_742)];
const RATE_LIMIT_MESSAGES: &[&str] = &["user request limit reached", "rate limit", "too many calls"];

/// Table-driven classifier mapping a [`RemoteError`] onto an [`ErrorClass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitClassifier {
    signatures: Vec<RateLimitSignature>,
    http_429_is_rate_limit: bool,
}

impl Default for RateLimitClassifier {
    fn default() -> Self {
        Self::default_table()
    }
}

impl RateLimitClassifier {
    /// Classifier that only recognises what is added explicitly.
    pub fn empty() -> Self {
        Self { signatures: Vec::new(), http_429_is_rate_limit: false }
    }

    /// The platform's documented throttling signatures.
    pub fn default_table() -> Self {
        let pairs = RATE_LIMIT_PAIRS
            .iter()
            .map(|&(code, subcode)| RateLimitSignature::CodeSubcode { code, subcode });
        let codes = RATE_LIMIT_CODES
            .iter()
            .copied()
            .chain(BUSINESS_USE_CASE_CODES)
            .map(|code| RateLimitSignature::Code { code });
        let messages = RATE_LIMIT_MESSAGES
            .iter()
            .map(|needle| RateLimitSignature::MessageContains { needle: (*needle).to_string() });

        Self { signatures: pairs.chain(codes).chain(messages).collect(), http_429_is_rate_limit: true }
    }

    pub fn with_signature(mut self, signature: RateLimitSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn with_http_429(mut self, enabled: bool) -> Self {
        self.http_429_is_rate_limit = enabled;
        self
    }

    pub fn signatures(&self) -> &[RateLimitSignature] {
        &self.signatures
    }

    pub fn classify(&self, error: &RemoteError) -> ErrorClass {
        if self.is_rate_limit(error) {
            ErrorClass::RateLimited
        } else if error.transport == Some(TransportKind::Timeout)
            || matches!(error.status, Some(408 | 504))
        {
            ErrorClass::Timeout
        } else {
            ErrorClass::Other
        }
    }

    pub fn is_rate_limit(&self, error: &RemoteError) -> bool {
        if self.http_429_is_rate_limit && error.status == Some(429) {
            return true;
        }
        let message_lower = error.message.to_lowercase();
        self.signatures.iter().any(|signature| signature.matches(error, &message_lower))
    }
}
