//! Authoritative remote campaign list, fetched through the limiter.

use std::sync::Arc;
use std::time::Duration;

use adsync_domain::{AccountCredentials, RemoteCampaign};
use tracing::debug;

use super::ports::{CampaignPage, CampaignSource};
use crate::limiter::{AccountKey, LimiterError, RateLimiter, RemoteError, TaskSpec};

/// Fetches the tracked campaigns of an ad account, one throttled call per
/// page.
#[derive(Clone)]
pub struct RemoteSnapshotFetcher {
    limiter: RateLimiter,
    source: Arc<dyn CampaignSource>,
    priority: i32,
    timeout: Duration,
    max_pages: usize,
    tracked_statuses: Arc<[String]>,
}

impl RemoteSnapshotFetcher {
    pub fn new(
        limiter: RateLimiter,
        source: Arc<dyn CampaignSource>,
        priority: i32,
        timeout: Duration,
        tracked_statuses: Vec<String>,
    ) -> Self {
        Self {
            limiter,
            source,
            priority,
            timeout,
            max_pages: adsync_domain::constants::MAX_PAGES_PER_LISTING,
            tracked_statuses: tracked_statuses.into(),
        }
    }

    /// Listings longer than this are refused rather than returned
    /// truncated.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Campaigns whose effective status is tracked.
    ///
    /// Each page request is a separate limiter task with its own queue
    /// timeout, so pages are spaced like any other call for the account.
    /// The status filter is re-applied locally because the platform treats
    /// its own filter as a hint for some listing shapes.
    pub async fn fetch_active_campaigns(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<Vec<RemoteCampaign>, LimiterError> {
        let account = AccountKey::new(credentials.account_node());
        let mut campaigns = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            if pages >= self.max_pages {
                return Err(LimiterError::Remote(RemoteError::other(format!(
                    "listing exceeded {} pages",
                    self.max_pages
                ))));
            }
            let page = self.fetch_page(&account, credentials, cursor.take()).await?;
            pages += 1;
            campaigns.extend(page.campaigns);

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let total = campaigns.len();
        let tracked: Vec<_> = campaigns
            .into_iter()
            .filter(|campaign| {
                self.tracked_statuses.iter().any(|status| status.eq_ignore_ascii_case(&campaign.status))
            })
            .collect();

        debug!(pages, total, tracked = tracked.len(), "remote snapshot fetched");
        Ok(tracked)
    }

    async fn fetch_page(
        &self,
        account: &AccountKey,
        credentials: &AccountCredentials,
        cursor: Option<String>,
    ) -> Result<CampaignPage, LimiterError> {
        let spec = TaskSpec::new(account.clone(), self.priority, self.timeout);

        let source = Arc::clone(&self.source);
        let credentials = credentials.clone();
        let statuses = Arc::clone(&self.tracked_statuses);
        let handle = self.limiter.submit(spec, move || {
            let source = Arc::clone(&source);
            let credentials = credentials.clone();
            let statuses = Arc::clone(&statuses);
            let cursor = cursor.clone();
            async move { source.list_campaigns_page(&credentials, &statuses, cursor.as_deref()).await }
        })?;

        handle.await
    }
}

impl std::fmt::Debug for RemoteSnapshotFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSnapshotFetcher")
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .field("max_pages", &self.max_pages)
            .field("tracked_statuses", &self.tracked_statuses)
            .finish_non_exhaustive()
    }
}
