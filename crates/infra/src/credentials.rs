//! Credentials provider backed by configured account bindings.

use std::collections::HashMap;

use adsync_core::sync::CredentialsProvider;
use adsync_domain::{AccountBinding, AccountCredentials, Result, SyncScope};
use async_trait::async_trait;
use tracing::warn;

/// Resolves scopes through the `accounts` section of the configuration.
///
/// Tokens are read from the environment on every lookup so a rotated token
/// is picked up without a restart. A bound scope whose token variable is
/// unset or empty resolves to `None`, the same as an unbound scope.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialsProvider {
    bindings: HashMap<String, AccountBinding>,
}

impl StaticCredentialsProvider {
    pub fn new(bindings: impl IntoIterator<Item = AccountBinding>) -> Self {
        Self { bindings: bindings.into_iter().map(|b| (b.scope.clone(), b)).collect() }
    }

    /// Scopes with a binding, sorted.
    pub fn scopes(&self) -> Vec<SyncScope> {
        let mut scopes: Vec<SyncScope> =
            self.bindings.keys().map(|s| SyncScope::new(s.as_str())).collect();
        scopes.sort();
        scopes
    }

    fn resolve(&self, scope: &SyncScope) -> Option<AccountCredentials> {
        let binding = self.bindings.get(scope.as_str())?;
        match std::env::var(&binding.token_env) {
            Ok(token) if !token.trim().is_empty() => {
                Some(AccountCredentials::new(binding.ad_account_id.as_str(), token.trim()))
            }
            _ => {
                warn!(
                    scope = %scope,
                    token_env = %binding.token_env,
                    "access token variable is not set"
                );
                None
            }
        }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentialsProvider {
    async fn credentials_for(&self, scope: &SyncScope) -> Result<Option<AccountCredentials>> {
        Ok(self.resolve(scope))
    }
}
