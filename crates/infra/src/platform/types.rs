//! Wire shapes of the marketing API.
//!
//! The platform serialises money and counters as JSON strings
//! (`"daily_budget": "1500"`), so numeric fields go through lenient
//! deserializers that accept either form.

use adsync_domain::{CampaignInsights, RemoteAdSet, RemoteCampaign};
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// One page of an edge listing.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl<T> Page<T> {
    /// Absolute URL of the next page, when the platform sent one.
    pub fn next_url(&self) -> Option<&str> {
        self.paging.as_ref().and_then(|p| p.next.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CampaignNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub effective_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub daily_budget: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lifetime_budget: Option<f64>,
}

impl From<CampaignNode> for RemoteCampaign {
    fn from(node: CampaignNode) -> Self {
        Self {
            id: node.id,
            name: node.name,
            status: node.effective_status.or(node.status).unwrap_or_default(),
            daily_budget: node.daily_budget,
            lifetime_budget: node.lifetime_budget,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdSetNode {
    pub id: String,
    #[serde(default)]
    pub campaign_id: String,
    #[serde(default)]
    pub effective_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub daily_budget: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lifetime_budget: Option<f64>,
}

impl AdSetNode {
    pub fn into_remote(self, parent: &str) -> RemoteAdSet {
        let campaign_id =
            if self.campaign_id.is_empty() { parent.to_string() } else { self.campaign_id };
        RemoteAdSet {
            id: self.id,
            campaign_id,
            status: self.effective_status.unwrap_or_default(),
            daily_budget: self.daily_budget,
            lifetime_budget: self.lifetime_budget,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsightsRow {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub spend: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub impressions: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub clicks: Option<u64>,
    #[serde(default)]
    pub date_start: String,
    #[serde(default)]
    pub date_stop: String,
}

impl InsightsRow {
    pub fn into_insights(self, campaign_id: &str) -> CampaignInsights {
        CampaignInsights {
            campaign_id: self.campaign_id.unwrap_or_else(|| campaign_id.to_string()),
            spend: self.spend.unwrap_or(0.0),
            impressions: self.impressions.unwrap_or(0),
            clicks: self.clicks.unwrap_or(0),
            date_start: self.date_start,
            date_stop: self.date_stop,
        }
    }
}

/// `{"error": {...}}` body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(n.as_f64()),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(n.as_u64()),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_budgets_accept_strings_and_numbers() {
        let page: Page<CampaignNode> = serde_json::from_str(
            r#"{
                "data": [
                    {"id": "1", "name": "A", "effective_status": "ACTIVE", "daily_budget": "1500"},
                    {"id": "2", "name": "B", "effective_status": "PAUSED", "lifetime_budget": 90000},
                    {"id": "3", "name": "C", "status": "ACTIVE", "daily_budget": ""}
                ],
                "paging": {"cursors": {"after": "x"}, "next": "https://next.page"}
            }"#,
        )
        .unwrap();

        assert_eq!(page.next_url(), Some("https://next.page"));
        let campaigns: Vec<RemoteCampaign> = page.data.into_iter().map(Into::into).collect();
        assert_eq!(campaigns[0].daily_budget, Some(1500.0));
        assert_eq!(campaigns[1].lifetime_budget, Some(90000.0));
        assert_eq!(campaigns[1].status, "PAUSED");
        assert_eq!(campaigns[2].daily_budget, None);
        assert_eq!(campaigns[2].status, "ACTIVE");
    }

    #[test]
    fn last_page_has_no_next() {
        let page: Page<CampaignNode> =
            serde_json::from_str(r#"{"data": [], "paging": {"cursors": {}}}"#).unwrap();
        assert!(page.next_url().is_none());

        let bare: Page<CampaignNode> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(bare.next_url().is_none());
    }

    #[test]
    fn insights_counters_parse_from_strings() {
        let row: InsightsRow = serde_json::from_str(
            r#"{"spend": "12.34", "impressions": "1000", "clicks": "7",
                "date_start": "2026-10-01", "date_stop": "2026-10-07"}"#,
        )
        .unwrap();

        let insights = row.into_insights("c1");
        assert_eq!(insights.campaign_id, "c1");
        assert!((insights.spend - 12.34).abs() < 1e-9);
        assert_eq!(insights.impressions, 1000);
        assert_eq!(insights.clicks, 7);
    }
}
