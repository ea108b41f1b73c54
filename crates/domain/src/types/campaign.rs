//! Campaign and ad set records.
//!
//! Local records carry budgets in major currency units (e.g. `12.50`); remote
//! records carry them exactly as the ad platform reports them, in minor units
//! (e.g. `1250`). Conversion happens during reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Lifecycle status of a locally persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    Paused,
    Archived,
    Deleted,
}

impl_status_conversions!(EntityStatus {
    Active => "active",
    Paused => "paused",
    Archived => "archived",
    Deleted => "deleted",
});

impl EntityStatus {
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Active child entities contribute to their parent's aggregate budget.
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Whether a budget is spent per day or over the whole flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetType {
    Daily,
    Lifetime,
}

impl_status_conversions!(BudgetType {
    Daily => "daily",
    Lifetime => "lifetime",
});

/// Campaign as cached in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalCampaign {
    pub id: String,
    /// Owning advertiser account (the sync scope).
    pub account_id: String,
    pub name: String,
    pub status: EntityStatus,
    pub budget: Option<f64>,
    pub budget_type: Option<BudgetType>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LocalCampaign {
    pub fn new(id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            name: String::new(),
            status: EntityStatus::Active,
            budget: None,
            budget_type: None,
            updated_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_budget(mut self, budget: f64, budget_type: BudgetType) -> Self {
        self.budget = Some(budget);
        self.budget_type = Some(budget_type);
        self
    }

    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = status;
        self
    }
}

/// Ad set (child of a campaign) as cached in the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAdSet {
    pub id: String,
    pub campaign_id: String,
    pub status: EntityStatus,
    pub daily_budget: Option<f64>,
    pub lifetime_budget: Option<f64>,
}

impl LocalAdSet {
    pub fn new(id: impl Into<String>, campaign_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            campaign_id: campaign_id.into(),
            status: EntityStatus::Active,
            daily_budget: None,
            lifetime_budget: None,
        }
    }

    pub fn with_daily_budget(mut self, budget: f64) -> Self {
        self.daily_budget = Some(budget);
        self
    }

    pub fn with_lifetime_budget(mut self, budget: f64) -> Self {
        self.lifetime_budget = Some(budget);
        self
    }

    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = status;
        self
    }

    /// Daily budget when set, otherwise the lifetime budget.
    pub fn effective_budget(&self) -> Option<f64> {
        self.daily_budget.or(self.lifetime_budget)
    }
}

/// Partial update applied to a local campaign row. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub status: Option<EntityStatus>,
    pub budget: Option<f64>,
    pub budget_type: Option<BudgetType>,
}

impl CampaignUpdate {
    pub fn budget(budget: f64) -> Self {
        Self { budget: Some(budget), ..Self::default() }
    }

    pub fn with_budget_type(mut self, budget_type: BudgetType) -> Self {
        self.budget_type = Some(budget_type);
        self
    }

    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.budget.is_none() && self.budget_type.is_none()
    }
}

/// Campaign as reported by the ad platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCampaign {
    pub id: String,
    pub name: String,
    /// Platform `effective_status`, verbatim (`ACTIVE`, `PAUSED`, ...).
    pub status: String,
    /// Campaign-level daily budget in minor currency units.
    pub daily_budget: Option<f64>,
    /// Campaign-level lifetime budget in minor currency units.
    pub lifetime_budget: Option<f64>,
}

impl RemoteCampaign {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            status: status.into(),
            daily_budget: None,
            lifetime_budget: None,
        }
    }

    pub fn with_daily_budget(mut self, minor_units: f64) -> Self {
        self.daily_budget = Some(minor_units);
        self
    }

    pub fn with_lifetime_budget(mut self, minor_units: f64) -> Self {
        self.lifetime_budget = Some(minor_units);
        self
    }
}

/// Ad set as reported by the ad platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAdSet {
    pub id: String,
    pub campaign_id: String,
    pub status: String,
    pub daily_budget: Option<f64>,
    pub lifetime_budget: Option<f64>,
}

/// Delivery metrics for one campaign over a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInsights {
    pub campaign_id: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub date_start: String,
    pub date_stop: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_platform_casing() {
        assert_eq!("ACTIVE".parse::<EntityStatus>().unwrap(), EntityStatus::Active);
        assert_eq!("Deleted".parse::<EntityStatus>().unwrap(), EntityStatus::Deleted);
        assert!("IN_PROCESS".parse::<EntityStatus>().is_err());
    }

    #[test]
    fn ad_set_prefers_daily_budget() {
        let both = LocalAdSet::new("as1", "c1").with_daily_budget(5.0).with_lifetime_budget(90.0);
        assert_eq!(both.effective_budget(), Some(5.0));

        let lifetime_only = LocalAdSet::new("as2", "c1").with_lifetime_budget(90.0);
        assert_eq!(lifetime_only.effective_budget(), Some(90.0));

        assert_eq!(LocalAdSet::new("as3", "c1").effective_budget(), None);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(CampaignUpdate::default().is_empty());
        assert!(!CampaignUpdate::budget(0.0).is_empty());
        assert!(!CampaignUpdate::default().with_status(EntityStatus::Deleted).is_empty());
    }
}
