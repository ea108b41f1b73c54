//! Read client for the ad platform's marketing API.

use std::time::Duration;

use adsync_core::limiter::RemoteError;
use adsync_core::sync::{CampaignPage, CampaignSource};
use adsync_domain::constants::MAX_PAGES_PER_LISTING;
use adsync_domain::{
    AccountCredentials, CampaignInsights, PlatformSettings, RemoteAdSet, RemoteCampaign, Result,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::errors::remote_error_from_body;
use super::types::{AdSetNode, CampaignNode, InsightsRow, Page};
use crate::errors::remote_error_from_http;
use crate::http::HttpClient;

const CAMPAIGN_FIELDS: &str = "id,name,status,effective_status,daily_budget,lifetime_budget";
const AD_SET_FIELDS: &str = "id,campaign_id,effective_status,daily_budget,lifetime_budget";
const INSIGHTS_FIELDS: &str = "campaign_id,spend,impressions,clicks";

/// Connection settings for [`MarketingApiClient`].
#[derive(Debug, Clone)]
pub struct MarketingApiConfig {
    /// Scheme and host, e.g. `https://graph.facebook.com`.
    pub base_url: String,
    /// Version path segment, e.g. `v19.0`.
    pub api_version: String,
    pub timeout: Duration,
    pub page_size: u32,
    /// Listings longer than this many pages are refused rather than
    /// returned truncated.
    pub max_pages: usize,
    /// Tries per HTTP request, counting the first. Extra tries after a 5xx
    /// or a dropped connection are not spaced by the limiter, so this stays
    /// at 1 when calls run through it.
    pub transport_attempts: u32,
}

impl Default for MarketingApiConfig {
    fn default() -> Self {
        Self::from(&PlatformSettings::default())
    }
}

impl From<&PlatformSettings> for MarketingApiConfig {
    fn from(settings: &PlatformSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_version: settings.api_version.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
            page_size: settings.page_size.max(1),
            max_pages: MAX_PAGES_PER_LISTING,
            transport_attempts: 1,
        }
    }
}

/// Versioned, bearer-authenticated reader for campaigns, ad sets and
/// insights.
///
/// Nothing here throttles on its own. [`campaigns_page`](Self::campaigns_page),
/// [`fetch_insights`](Self::fetch_insights) and single-page ad-set listings
/// are one request each and fit one limiter task.
#[derive(Clone)]
pub struct MarketingApiClient {
    http: HttpClient,
    config: MarketingApiConfig,
}

impl MarketingApiClient {
    pub fn new(config: MarketingApiConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.transport_attempts)
            .user_agent(concat!("adsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &MarketingApiConfig {
        &self.config
    }

    /// Campaigns of the account whose `effective_status` is in `statuses`
    /// (all campaigns when `statuses` is empty), following `paging.next`.
    ///
    /// Issues every page back to back; callers that go through the limiter
    /// page with [`campaigns_page`](Self::campaigns_page) instead.
    #[instrument(skip_all, fields(account = %credentials.account_node()))]
    pub async fn list_campaigns(
        &self,
        credentials: &AccountCredentials,
        statuses: &[String],
    ) -> std::result::Result<Vec<RemoteCampaign>, RemoteError> {
        let url = self.endpoint(&credentials.account_node(), "campaigns");
        let query = campaign_query(statuses, self.config.page_size)?;
        let nodes: Vec<CampaignNode> = self.paginate(&url, &query, credentials).await?;
        debug!(count = nodes.len(), "listed campaigns");
        Ok(nodes.into_iter().map(RemoteCampaign::from).collect())
    }

    /// One page of the campaign listing: the first page for `cursor: None`,
    /// otherwise the page behind a previous `next` cursor.
    #[instrument(
        skip_all,
        fields(account = %credentials.account_node(), first = cursor.is_none())
    )]
    pub async fn campaigns_page(
        &self,
        credentials: &AccountCredentials,
        statuses: &[String],
        cursor: Option<&str>,
    ) -> std::result::Result<CampaignPage, RemoteError> {
        let page: Page<CampaignNode> = match cursor {
            // The cursor URL already carries every query parameter.
            Some(next) => self.get_page(next, None, credentials).await?,
            None => {
                let url = self.endpoint(&credentials.account_node(), "campaigns");
                let query = campaign_query(statuses, self.config.page_size)?;
                self.get_page(&url, Some(query.as_slice()), credentials).await?
            }
        };

        let next = page.next_url().map(str::to_owned);
        let campaigns: Vec<RemoteCampaign> =
            page.data.into_iter().map(RemoteCampaign::from).collect();
        debug!(count = campaigns.len(), more = next.is_some(), "listed campaign page");
        Ok(CampaignPage { campaigns, next })
    }

    /// Ad sets (child entities) of one campaign.
    #[instrument(skip(self, credentials))]
    pub async fn list_ad_sets(
        &self,
        credentials: &AccountCredentials,
        campaign_id: &str,
    ) -> std::result::Result<Vec<RemoteAdSet>, RemoteError> {
        let query = vec![
            ("fields", AD_SET_FIELDS.to_string()),
            ("limit", self.config.page_size.to_string()),
        ];
        let url = self.endpoint(campaign_id, "adsets");
        let nodes: Vec<AdSetNode> = self.paginate(&url, &query, credentials).await?;
        Ok(nodes.into_iter().map(|node| node.into_remote(campaign_id)).collect())
    }

    /// Spend, impressions and clicks for one campaign over a date preset
    /// (`last_7d`, `yesterday`, ...). `None` when the campaign had no
    /// delivery in the window.
    #[instrument(skip(self, credentials))]
    pub async fn fetch_insights(
        &self,
        credentials: &AccountCredentials,
        campaign_id: &str,
        date_preset: &str,
    ) -> std::result::Result<Option<CampaignInsights>, RemoteError> {
        let query = vec![
            ("fields", INSIGHTS_FIELDS.to_string()),
            ("date_preset", date_preset.to_string()),
        ];
        let url = self.endpoint(campaign_id, "insights");
        let page: Page<InsightsRow> =
            self.get_page(&url, Some(query.as_slice()), credentials).await?;
        Ok(page.data.into_iter().next().map(|row| row.into_insights(campaign_id)))
    }

    fn endpoint(&self, node: &str, edge: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version.trim_matches('/'),
            node,
            edge
        )
    }

    async fn paginate<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        credentials: &AccountCredentials,
    ) -> std::result::Result<Vec<T>, RemoteError> {
        let mut items = Vec::new();
        let mut page: Page<T> = self.get_page(url, Some(query), credentials).await?;
        let mut fetched = 1;

        loop {
            let next = page.next_url().map(str::to_owned);
            items.append(&mut page.data);

            let Some(next) = next else {
                return Ok(items);
            };
            if fetched >= self.config.max_pages {
                return Err(RemoteError::other(format!(
                    "listing exceeded {} pages",
                    self.config.max_pages
                )));
            }

            // The cursor URL already carries every query parameter.
            page = self.get_page(&next, None, credentials).await?;
            fetched += 1;
        }
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: Option<&[(&str, String)]>,
        credentials: &AccountCredentials,
    ) -> std::result::Result<T, RemoteError> {
        let mut request =
            self.http.request(Method::GET, url).bearer_auth(&credentials.access_token);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote_error_from_body(status, &body));
        }

        response.json::<T>().await.map_err(|err| remote_error_from_http(&err))
    }
}

fn campaign_query(
    statuses: &[String],
    page_size: u32,
) -> std::result::Result<Vec<(&'static str, String)>, RemoteError> {
    let mut query = vec![("fields", CAMPAIGN_FIELDS.to_string()), ("limit", page_size.to_string())];
    if !statuses.is_empty() {
        let filter = serde_json::to_string(statuses)
            .map_err(|err| RemoteError::other(format!("status filter: {err}")))?;
        query.push(("effective_status", filter));
    }
    Ok(query)
}

#[async_trait]
impl CampaignSource for MarketingApiClient {
    async fn list_campaigns_page(
        &self,
        credentials: &AccountCredentials,
        statuses: &[String],
        cursor: Option<&str>,
    ) -> std::result::Result<CampaignPage, RemoteError> {
        self.campaigns_page(credentials, statuses, cursor).await
    }
}
