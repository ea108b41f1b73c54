#![allow(dead_code)]

use std::sync::Arc;

use adsync_domain::{AccountCredentials, BudgetType, LocalAdSet, LocalCampaign};
use adsync_infra::database::{DbManager, SqliteCampaignStore};
use adsync_infra::platform::{MarketingApiClient, MarketingApiConfig};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const ACCOUNT_ID: &str = "777";
pub const TOKEN: &str = "test-token";

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub store: SqliteCampaignStore,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new migrated database in a fresh temp dir.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("adsync-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");
        let manager = Arc::new(manager);

        Self { store: SqliteCampaignStore::new(manager.clone()), manager, _temp_dir: temp_dir }
    }

    /// Insert a campaign with a daily budget, failing the test on error.
    pub async fn seed_campaign(&self, id: &str, scope: &str, budget: f64) {
        let campaign =
            LocalCampaign::new(id, scope).with_name(id).with_budget(budget, BudgetType::Daily);
        self.store.upsert_campaign(&campaign).await.expect("campaign should be inserted");
    }

    pub async fn seed_ad_set(&self, ad_set: LocalAdSet) {
        self.store.upsert_ad_set(&ad_set).await.expect("ad set should be inserted");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn credentials() -> AccountCredentials {
    AccountCredentials::new(format!("act_{ACCOUNT_ID}"), TOKEN)
}

/// API client pointed at a mock server, with short timeouts.
pub fn api_client(base_url: &str) -> MarketingApiClient {
    let config = MarketingApiConfig {
        base_url: base_url.to_string(),
        api_version: "v19.0".to_string(),
        timeout: std::time::Duration::from_secs(5),
        page_size: 2,
        max_pages: 5,
        transport_attempts: 1,
    };
    MarketingApiClient::new(config).expect("client should build")
}

pub fn campaigns_path() -> String {
    format!("/v19.0/act_{ACCOUNT_ID}/campaigns")
}

/// Campaign node as the platform returns it; budgets are minor-unit strings.
pub fn campaign_node(id: &str, daily_budget_minor: Option<&str>) -> Value {
    let mut node = json!({
        "id": id,
        "name": format!("Campaign {id}"),
        "status": "ACTIVE",
        "effective_status": "ACTIVE",
    });
    if let Some(budget) = daily_budget_minor {
        node["daily_budget"] = json!(budget);
    }
    node
}

pub fn page(data: Vec<Value>, next: Option<String>) -> Value {
    match next {
        Some(next) => json!({ "data": data, "paging": { "next": next } }),
        None => json!({ "data": data }),
    }
}
