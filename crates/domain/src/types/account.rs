//! Tenancy and credential types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Local partition that a validation pass covers (one advertiser account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncScope(String);

impl SyncScope {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self(account_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SyncScope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Credentials for reading one ad account on the remote platform.
///
/// The access token never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    /// Platform ad account id without the `act_` prefix.
    pub ad_account_id: String,
    pub access_token: String,
}

impl AccountCredentials {
    pub fn new(ad_account_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        let ad_account_id = ad_account_id.into();
        let ad_account_id = ad_account_id.strip_prefix("act_").unwrap_or(&ad_account_id).to_string();
        Self { ad_account_id, access_token: access_token.into() }
    }

    /// Path segment used by the platform for this account (`act_<id>`).
    pub fn account_node(&self) -> String {
        format!("act_{}", self.ad_account_id)
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("ad_account_id", &self.ad_account_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_act_prefix() {
        let creds = AccountCredentials::new("act_123", "tok");
        assert_eq!(creds.ad_account_id, "123");
        assert_eq!(creds.account_node(), "act_123");
    }

    #[test]
    fn debug_redacts_token() {
        let creds = AccountCredentials::new("42", "super-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
