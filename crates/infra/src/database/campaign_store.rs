//! SQLite-backed implementation of the `CampaignStore` port.
//!
//! Port methods hop onto the blocking pool; each one is a single statement or
//! a single transaction, never both.

use std::sync::Arc;

use adsync_core::sync::CampaignStore;
use adsync_domain::{
    AdSyncError, BudgetType, CampaignUpdate, EntityStatus, LocalAdSet, LocalCampaign,
    Result as DomainResult, SyncScope,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{map_sql_error, DbManager};

/// SQLite repository for locally cached campaigns and ad sets.
#[derive(Clone)]
pub struct SqliteCampaignStore {
    db: Arc<DbManager>,
}

impl SqliteCampaignStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or refresh a campaign row, keeping its ad sets.
    pub async fn upsert_campaign(&self, campaign: &LocalCampaign) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let campaign = campaign.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let updated_at = campaign.updated_at.unwrap_or_else(Utc::now).to_rfc3339();
            conn.execute(
                CAMPAIGN_UPSERT_SQL,
                params![
                    &campaign.id,
                    &campaign.account_id,
                    &campaign.name,
                    campaign.status.as_str(),
                    campaign.budget,
                    campaign.budget_type.map(|t| t.as_str()),
                    updated_at,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    /// Insert or refresh an ad set row. The parent campaign must exist.
    pub async fn upsert_ad_set(&self, ad_set: &LocalAdSet) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let ad_set = ad_set.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                AD_SET_UPSERT_SQL,
                params![
                    &ad_set.id,
                    &ad_set.campaign_id,
                    ad_set.status.as_str(),
                    ad_set.daily_budget,
                    ad_set.lifetime_budget,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl CampaignStore for SqliteCampaignStore {
    async fn list_by_scope(&self, scope: &SyncScope) -> DomainResult<Vec<LocalCampaign>> {
        let db = Arc::clone(&self.db);
        let account_id = scope.as_str().to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<LocalCampaign>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(CAMPAIGNS_BY_ACCOUNT_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![&account_id], CampaignRow::from_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            rows.into_iter().map(CampaignRow::into_domain).collect()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_children(&self, campaign_id: &str) -> DomainResult<Vec<LocalAdSet>> {
        let db = Arc::clone(&self.db);
        let campaign_id = campaign_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Vec<LocalAdSet>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(AD_SETS_BY_CAMPAIGN_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![&campaign_id], AdSetRow::from_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            rows.into_iter().map(AdSetRow::into_domain).collect()
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, update), fields(campaign_id = %campaign_id))]
    async fn update_fields(&self, campaign_id: &str, update: &CampaignUpdate) -> DomainResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        let db = Arc::clone(&self.db);
        let campaign_id = campaign_id.to_string();
        let update = update.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    CAMPAIGN_UPDATE_SQL,
                    params![
                        &campaign_id,
                        update.status.map(|s| s.as_str()),
                        update.budget,
                        update.budget_type.map(|t| t.as_str()),
                        Utc::now().to_rfc3339(),
                    ],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(AdSyncError::NotFound(format!("campaign {campaign_id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip_all, fields(count = campaign_ids.len()))]
    async fn mark_deleted(&self, campaign_ids: &[String]) -> DomainResult<usize> {
        if campaign_ids.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        let ids = campaign_ids.to_vec();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let now = Utc::now().to_rfc3339();

            let mut touched = 0;
            {
                let mut stmt = tx.prepare(CAMPAIGN_MARK_DELETED_SQL).map_err(map_sql_error)?;
                for id in &ids {
                    touched += stmt.execute(params![id, &now]).map_err(map_sql_error)?;
                }
            }
            tx.commit().map_err(map_sql_error)?;

            debug!(touched, "campaigns marked deleted");
            Ok(touched)
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Raw column values; parsing into domain enums happens outside the
/// rusqlite row callback so failures surface as domain errors.
struct CampaignRow {
    id: String,
    account_id: String,
    name: String,
    status: String,
    budget: Option<f64>,
    budget_type: Option<String>,
    updated_at: Option<String>,
}

impl CampaignRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            account_id: row.get(1)?,
            name: row.get(2)?,
            status: row.get(3)?,
            budget: row.get(4)?,
            budget_type: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_domain(self) -> DomainResult<LocalCampaign> {
        let budget_type = self.budget_type.as_deref().map(str::parse::<BudgetType>).transpose()?;
        let updated_at = self
            .updated_at
            .as_deref()
            .map(DateTime::parse_from_rfc3339)
            .transpose()
            .map_err(|err| AdSyncError::Database(format!("campaign {}: updated_at: {err}", self.id)))?
            .map(|ts| ts.with_timezone(&Utc));

        Ok(LocalCampaign {
            status: self.status.parse::<EntityStatus>()?,
            id: self.id,
            account_id: self.account_id,
            name: self.name,
            budget: self.budget,
            budget_type,
            updated_at,
        })
    }
}

struct AdSetRow {
    id: String,
    campaign_id: String,
    status: String,
    daily_budget: Option<f64>,
    lifetime_budget: Option<f64>,
}

impl AdSetRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            campaign_id: row.get(1)?,
            status: row.get(2)?,
            daily_budget: row.get(3)?,
            lifetime_budget: row.get(4)?,
        })
    }

    fn into_domain(self) -> DomainResult<LocalAdSet> {
        Ok(LocalAdSet {
            status: self.status.parse::<EntityStatus>()?,
            id: self.id,
            campaign_id: self.campaign_id,
            daily_budget: self.daily_budget,
            lifetime_budget: self.lifetime_budget,
        })
    }
}

fn map_join_error(err: task::JoinError) -> AdSyncError {
    if err.is_cancelled() {
        AdSyncError::Internal("blocking task cancelled".into())
    } else {
        AdSyncError::Internal(format!("blocking task panicked: {err}"))
    }
}

const CAMPAIGN_UPSERT_SQL: &str = "INSERT INTO campaigns
        (id, account_id, name, status, budget, budget_type, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
        account_id = excluded.account_id,
        name = excluded.name,
        status = excluded.status,
        budget = excluded.budget,
        budget_type = excluded.budget_type,
        updated_at = excluded.updated_at";

const AD_SET_UPSERT_SQL: &str = "INSERT INTO ad_sets
        (id, campaign_id, status, daily_budget, lifetime_budget)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(id) DO UPDATE SET
        campaign_id = excluded.campaign_id,
        status = excluded.status,
        daily_budget = excluded.daily_budget,
        lifetime_budget = excluded.lifetime_budget";

const CAMPAIGNS_BY_ACCOUNT_SQL: &str = "SELECT id, account_id, name, status, budget,
        budget_type, updated_at
    FROM campaigns
    WHERE account_id = ?1
    ORDER BY id";

const AD_SETS_BY_CAMPAIGN_SQL: &str = "SELECT id, campaign_id, status, daily_budget,
        lifetime_budget
    FROM ad_sets
    WHERE campaign_id = ?1
    ORDER BY id";

const CAMPAIGN_UPDATE_SQL: &str = "UPDATE campaigns SET
        status = COALESCE(?2, status),
        budget = COALESCE(?3, budget),
        budget_type = COALESCE(?4, budget_type),
        updated_at = ?5
    WHERE id = ?1";

const CAMPAIGN_MARK_DELETED_SQL: &str = "UPDATE campaigns SET
        status = 'deleted',
        budget = 0,
        updated_at = ?2
    WHERE id = ?1 AND status <> 'deleted'";

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, SqliteCampaignStore) {
        let dir = TempDir::new().unwrap();
        let db = DbManager::new(dir.path().join("campaigns.db"), 2).unwrap();
        db.run_migrations().unwrap();
        (dir, SqliteCampaignStore::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn upsert_then_list_round_trips_fields() {
        let (_dir, store) = store();
        let campaign = LocalCampaign::new("c1", "acct")
            .with_name("Spring")
            .with_budget(12.5, BudgetType::Lifetime)
            .with_status(EntityStatus::Paused);
        store.upsert_campaign(&campaign).await.unwrap();
        store.upsert_campaign(&LocalCampaign::new("other", "acct-2")).await.unwrap();

        let listed = store.list_by_scope(&SyncScope::new("acct")).await.unwrap();
        assert_eq!(listed.len(), 1);
        let row = &listed[0];
        assert_eq!(row.name, "Spring");
        assert_eq!(row.status, EntityStatus::Paused);
        assert_eq!(row.budget, Some(12.5));
        assert_eq!(row.budget_type, Some(BudgetType::Lifetime));
        assert!(row.updated_at.is_some());
    }

    #[tokio::test]
    async fn upserting_a_campaign_keeps_its_ad_sets() {
        let (_dir, store) = store();
        store.upsert_campaign(&LocalCampaign::new("c1", "acct")).await.unwrap();
        store.upsert_ad_set(&LocalAdSet::new("s1", "c1").with_daily_budget(3.0)).await.unwrap();

        store.upsert_campaign(&LocalCampaign::new("c1", "acct").with_name("renamed")).await.unwrap();

        let children = store.list_children("c1").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].daily_budget, Some(3.0));
    }

    #[tokio::test]
    async fn update_fields_only_touches_given_columns() {
        let (_dir, store) = store();
        store
            .upsert_campaign(&LocalCampaign::new("c1", "acct").with_budget(5.0, BudgetType::Daily))
            .await
            .unwrap();

        store.update_fields("c1", &CampaignUpdate::budget(7.25)).await.unwrap();

        let row = store.list_by_scope(&SyncScope::new("acct")).await.unwrap().remove(0);
        assert_eq!(row.budget, Some(7.25));
        assert_eq!(row.budget_type, Some(BudgetType::Daily));
        assert_eq!(row.status, EntityStatus::Active);
    }

    #[tokio::test]
    async fn update_of_unknown_campaign_is_not_found() {
        let (_dir, store) = store();
        let err = store.update_fields("nope", &CampaignUpdate::budget(1.0)).await.unwrap_err();
        assert!(matches!(err, AdSyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn mark_deleted_is_idempotent() {
        let (_dir, store) = store();
        store
            .upsert_campaign(&LocalCampaign::new("c1", "acct").with_budget(5.0, BudgetType::Daily))
            .await
            .unwrap();
        let ids = vec!["c1".to_string(), "ghost".to_string()];

        assert_eq!(store.mark_deleted(&ids).await.unwrap(), 1);
        let first = store.list_by_scope(&SyncScope::new("acct")).await.unwrap().remove(0);
        assert_eq!(first.status, EntityStatus::Deleted);
        assert_eq!(first.budget, Some(0.0));

        // Already-deleted rows are left alone, timestamp included.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(store.mark_deleted(&ids).await.unwrap(), 0);
        let second = store.list_by_scope(&SyncScope::new("acct")).await.unwrap().remove(0);
        assert_eq!(second, first);
        assert!(second.updated_at.is_some());

        assert_eq!(store.mark_deleted(&[]).await.unwrap(), 0);
    }
}
