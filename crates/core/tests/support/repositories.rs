//! Mock port implementations for testing
//!
//! Everything lives behind a mutex so tests can inspect the resulting state
//! after the validator has run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use adsync_core::limiter::RemoteError;
use adsync_core::sync::{CampaignPage, CampaignSource, CampaignStore, CredentialsProvider};
use adsync_domain::{
    AccountCredentials, AdSyncError, CampaignUpdate, EntityStatus, LocalAdSet, LocalCampaign,
    RemoteCampaign, Result as DomainResult, SyncScope,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

/// In-memory mock for `CampaignStore`.
#[derive(Default)]
pub struct MockCampaignStore {
    campaigns: Mutex<Vec<LocalCampaign>>,
    ad_sets: Mutex<Vec<LocalAdSet>>,
    failing_updates: Mutex<HashSet<String>>,
    fail_listing: Mutex<bool>,
    writes: AtomicUsize,
}

impl MockCampaignStore {
    pub fn new(campaigns: Vec<LocalCampaign>) -> Self {
        Self { campaigns: Mutex::new(campaigns), ..Self::default() }
    }

    pub fn with_ad_sets(self, ad_sets: Vec<LocalAdSet>) -> Self {
        *self.ad_sets.lock() = ad_sets;
        self
    }

    /// Make `update_fields` fail for one campaign id.
    pub fn fail_updates_for(&self, campaign_id: &str) {
        self.failing_updates.lock().insert(campaign_id.to_string());
    }

    pub fn fail_listing(&self) {
        *self.fail_listing.lock() = true;
    }

    pub fn campaign(&self, id: &str) -> Option<LocalCampaign> {
        self.campaigns.lock().iter().find(|c| c.id == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<LocalCampaign> {
        self.campaigns.lock().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CampaignStore for MockCampaignStore {
    async fn list_by_scope(&self, scope: &SyncScope) -> DomainResult<Vec<LocalCampaign>> {
        if *self.fail_listing.lock() {
            return Err(AdSyncError::Database("campaigns table locked".into()));
        }
        Ok(self
            .campaigns
            .lock()
            .iter()
            .filter(|c| c.account_id == scope.as_str())
            .cloned()
            .collect())
    }

    async fn list_children(&self, campaign_id: &str) -> DomainResult<Vec<LocalAdSet>> {
        Ok(self.ad_sets.lock().iter().filter(|a| a.campaign_id == campaign_id).cloned().collect())
    }

    async fn update_fields(&self, campaign_id: &str, update: &CampaignUpdate) -> DomainResult<()> {
        if self.failing_updates.lock().contains(campaign_id) {
            return Err(AdSyncError::Database(format!("update of {campaign_id} failed")));
        }
        let mut campaigns = self.campaigns.lock();
        let campaign = campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or_else(|| AdSyncError::NotFound(campaign_id.to_string()))?;
        if let Some(status) = update.status {
            campaign.status = status;
        }
        if let Some(budget) = update.budget {
            campaign.budget = Some(budget);
        }
        if let Some(budget_type) = update.budget_type {
            campaign.budget_type = Some(budget_type);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mark_deleted(&self, campaign_ids: &[String]) -> DomainResult<usize> {
        let mut touched = 0;
        for campaign in self.campaigns.lock().iter_mut() {
            if campaign_ids.contains(&campaign.id) && !campaign.status.is_deleted() {
                campaign.status = EntityStatus::Deleted;
                campaign.budget = Some(0.0);
                touched += 1;
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(touched)
    }
}

/// Scripted `CampaignSource`: queued responses first, then the fallback
/// listing split into pages.
///
/// A scripted `Ok` is served as a single last page. Fallback cursors are
/// `page-<n>`.
pub struct MockCampaignSource {
    scripted: Mutex<VecDeque<Result<Vec<RemoteCampaign>, RemoteError>>>,
    pages: Mutex<Vec<Vec<RemoteCampaign>>>,
    calls: Mutex<Vec<(Option<String>, Instant)>>,
}

impl MockCampaignSource {
    pub fn new(campaigns: Vec<RemoteCampaign>) -> Self {
        Self::paged(vec![campaigns])
    }

    pub fn paged(pages: Vec<Vec<RemoteCampaign>>) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            pages: Mutex::new(pages),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RemoteError) -> Self {
        let source = Self::new(Vec::new());
        source.push_response(Err(error));
        source
    }

    pub fn push_response(&self, response: Result<Vec<RemoteCampaign>, RemoteError>) {
        self.scripted.lock().push_back(response);
    }

    pub fn set_campaigns(&self, campaigns: Vec<RemoteCampaign>) {
        *self.pages.lock() = vec![campaigns];
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().len()
    }

    /// Cursor and start time of every page request, in order.
    pub fn requests(&self) -> Vec<(Option<String>, Instant)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CampaignSource for MockCampaignSource {
    async fn list_campaigns_page(
        &self,
        _credentials: &AccountCredentials,
        _statuses: &[String],
        cursor: Option<&str>,
    ) -> Result<CampaignPage, RemoteError> {
        self.calls.lock().push((cursor.map(str::to_owned), Instant::now()));
        if let Some(response) = self.scripted.lock().pop_front() {
            return response.map(|campaigns| CampaignPage { campaigns, next: None });
        }

        let index = cursor
            .and_then(|cursor| cursor.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let pages = self.pages.lock();
        let campaigns = pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
        Ok(CampaignPage { campaigns, next })
    }
}

/// Credentials keyed by scope.
#[derive(Default, Clone)]
pub struct MockCredentials {
    accounts: Arc<HashMap<String, AccountCredentials>>,
}

impl MockCredentials {
    pub fn with_account(mut self, scope: &str, ad_account_id: &str) -> Self {
        Arc::make_mut(&mut self.accounts)
            .insert(scope.to_string(), AccountCredentials::new(ad_account_id, "test-token"));
        self
    }
}

#[async_trait]
impl CredentialsProvider for MockCredentials {
    async fn credentials_for(&self, scope: &SyncScope) -> DomainResult<Option<AccountCredentials>> {
        Ok(self.accounts.get(scope.as_str()).cloned())
    }
}
