//! Port interfaces for campaign reconciliation

use adsync_domain::{
    AccountCredentials, CampaignUpdate, LocalAdSet, LocalCampaign, RemoteCampaign, Result,
    SyncScope,
};
use async_trait::async_trait;

use crate::limiter::RemoteError;

/// Local record store for campaigns and their ad sets.
///
/// Calls are independent; there is no transaction spanning two of them.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// All campaigns owned by `scope`, deleted ones included.
    async fn list_by_scope(&self, scope: &SyncScope) -> Result<Vec<LocalCampaign>>;

    /// Ad sets belonging to one campaign.
    async fn list_children(&self, campaign_id: &str) -> Result<Vec<LocalAdSet>>;

    /// Apply the non-empty fields of `update` to one campaign.
    async fn update_fields(&self, campaign_id: &str, update: &CampaignUpdate) -> Result<()>;

    /// Flag campaigns deleted and zero their budgets. Idempotent.
    ///
    /// Returns how many campaigns changed; ids that are unknown or already
    /// deleted do not count.
    async fn mark_deleted(&self, campaign_ids: &[String]) -> Result<usize>;
}

/// One page of a campaign listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignPage {
    pub campaigns: Vec<RemoteCampaign>,
    /// Opaque cursor for the following page, `None` on the last one.
    pub next: Option<String>,
}

/// Raw campaign listing from the ad platform, one request per page.
#[async_trait]
pub trait CampaignSource: Send + Sync {
    /// A page of the credentials' ad account campaigns whose effective
    /// status is in `statuses`. `cursor` is `None` for the first page and
    /// the previous page's `next` afterwards.
    async fn list_campaigns_page(
        &self,
        credentials: &AccountCredentials,
        statuses: &[String],
        cursor: Option<&str>,
    ) -> std::result::Result<CampaignPage, RemoteError>;
}

/// Resolves platform credentials for a local scope.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// `Ok(None)` when the scope has no linked ad account.
    async fn credentials_for(&self, scope: &SyncScope) -> Result<Option<AccountCredentials>>;
}
