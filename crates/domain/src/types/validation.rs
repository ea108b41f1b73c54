//! Reconciliation results.
//!
//! Everything here is computed per validation pass and returned to the
//! caller; none of it is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Comparison of one campaign id across the local store and the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignValidation {
    pub entity_id: String,
    pub exists_remote: bool,
    pub exists_local: bool,
    /// Remote budget already normalized to local (major) units.
    pub remote_budget: Option<f64>,
    pub local_budget: Option<f64>,
    pub budgets_match: bool,
}

impl CampaignValidation {
    pub const fn is_stale(&self) -> bool {
        self.exists_local && !self.exists_remote
    }

    pub const fn is_new(&self) -> bool {
        self.exists_remote && !self.exists_local
    }

    pub const fn is_budget_mismatch(&self) -> bool {
        self.exists_local && self.exists_remote && !self.budgets_match
    }
}

/// Reason a validation pass could not reach a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("cannot validate {0}: no remote credentials configured")]
    CredentialsMissing(String),

    #[error("remote snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    #[error("local store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Outcome of one validation pass for a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncValidationResult {
    pub scope: String,
    pub needs_sync: bool,
    /// Present locally, gone remotely.
    pub stale_ids: Vec<String>,
    /// Present remotely, never imported locally.
    pub new_ids: Vec<String>,
    pub budget_mismatch_ids: Vec<String>,
    pub errors: Vec<ValidationIssue>,
    pub campaigns: Vec<CampaignValidation>,
    pub checked_at: DateTime<Utc>,
}

impl SyncValidationResult {
    /// Result for a pass that could not compare anything.
    ///
    /// `needs_sync` stays false so nobody acts on missing remote truth.
    pub fn unavailable(scope: impl Into<String>, issue: ValidationIssue) -> Self {
        Self {
            scope: scope.into(),
            needs_sync: false,
            stale_ids: Vec::new(),
            new_ids: Vec::new(),
            budget_mismatch_ids: Vec::new(),
            errors: vec![issue],
            campaigns: Vec::new(),
            checked_at: Utc::now(),
        }
    }

    /// Build a result from per-campaign comparisons, deriving the id lists.
    pub fn from_validations(scope: impl Into<String>, campaigns: Vec<CampaignValidation>) -> Self {
        let stale_ids = ids_where(&campaigns, CampaignValidation::is_stale);
        let new_ids = ids_where(&campaigns, CampaignValidation::is_new);
        let budget_mismatch_ids = ids_where(&campaigns, CampaignValidation::is_budget_mismatch);
        let needs_sync =
            !stale_ids.is_empty() || !new_ids.is_empty() || !budget_mismatch_ids.is_empty();

        Self {
            scope: scope.into(),
            needs_sync,
            stale_ids,
            new_ids,
            budget_mismatch_ids,
            errors: Vec::new(),
            campaigns,
            checked_at: Utc::now(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn validation_for(&self, entity_id: &str) -> Option<&CampaignValidation> {
        self.campaigns.iter().find(|v| v.entity_id == entity_id)
    }
}

fn ids_where(
    campaigns: &[CampaignValidation],
    pred: impl Fn(&CampaignValidation) -> bool,
) -> Vec<String> {
    campaigns.iter().filter(|v| pred(*v)).map(|v| v.entity_id.clone()).collect()
}

/// What an auto-fix run changed in the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFixOutcome {
    pub success: bool,
    pub deleted: usize,
    pub budgets_repaired: usize,
    pub totals_recomputed: usize,
    /// One entry per write that failed; other writes still went through.
    pub failures: Vec<String>,
}

impl AutoFixOutcome {
    pub fn skipped() -> Self {
        Self::default()
    }
}

/// Summary returned by the validate-then-fix orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSyncReport {
    pub success: bool,
    pub message: String,
    pub sync_triggered: bool,
}
