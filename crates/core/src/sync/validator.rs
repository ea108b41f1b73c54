//! Campaign reconciliation service - core business logic

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use adsync_domain::{
    AutoFixOutcome, AutoSyncReport, CampaignUpdate, CampaignValidation, LocalCampaign,
    RemoteCampaign, SyncScope, SyncValidationResult, ValidationIssue, ValidatorSettings,
};
use tracing::{debug, info, instrument, warn};

use super::budget::{budgets_match, normalize_remote_budget};
use super::ports::{CampaignSource, CampaignStore, CredentialsProvider};
use super::snapshot::RemoteSnapshotFetcher;
use crate::limiter::RateLimiter;

/// Reconciliation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub budget_tolerance: f64,
    pub minor_units_per_major: f64,
    pub tracked_statuses: Vec<String>,
    pub snapshot_priority: i32,
    pub snapshot_timeout: Duration,
    /// Overwrite mismatched local budgets with the remote value.
    pub repair_budget_mismatches: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::from(&ValidatorSettings::default())
    }
}

impl From<&ValidatorSettings> for ValidatorConfig {
    fn from(settings: &ValidatorSettings) -> Self {
        Self {
            budget_tolerance: settings.budget_tolerance,
            minor_units_per_major: settings.minor_units_per_major,
            tracked_statuses: settings.tracked_statuses.clone(),
            snapshot_priority: settings.snapshot_priority,
            snapshot_timeout: Duration::from_secs(settings.snapshot_timeout_secs),
            repair_budget_mismatches: settings.repair_budget_mismatches,
        }
    }
}

impl ValidatorConfig {
    pub fn validate(&self) -> adsync_domain::Result<()> {
        if !(self.budget_tolerance.is_finite() && self.budget_tolerance >= 0.0) {
            return Err(adsync_domain::AdSyncError::Config(
                "budget_tolerance must be a non-negative number".into(),
            ));
        }
        if !(self.minor_units_per_major.is_finite() && self.minor_units_per_major > 0.0) {
            return Err(adsync_domain::AdSyncError::Config(
                "minor_units_per_major must be positive".into(),
            ));
        }
        if self.snapshot_timeout.is_zero() {
            return Err(adsync_domain::AdSyncError::Config(
                "snapshot_timeout must be positive".into(),
            ));
        }
        if self.tracked_statuses.is_empty() {
            return Err(adsync_domain::AdSyncError::Config(
                "tracked_statuses must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Compares local campaigns with the platform and repairs local drift.
pub struct SyncValidator {
    store: Arc<dyn CampaignStore>,
    credentials: Arc<dyn CredentialsProvider>,
    fetcher: RemoteSnapshotFetcher,
    config: ValidatorConfig,
}

impl SyncValidator {
    pub fn new(
        config: ValidatorConfig,
        limiter: RateLimiter,
        source: Arc<dyn CampaignSource>,
        store: Arc<dyn CampaignStore>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> adsync_domain::Result<Self> {
        config.validate()?;
        let fetcher = RemoteSnapshotFetcher::new(
            limiter,
            source,
            config.snapshot_priority,
            config.snapshot_timeout,
            config.tracked_statuses.clone(),
        );
        Ok(Self { store, credentials, fetcher, config })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Diffs local campaigns of `scope` against the remote snapshot.
    ///
    /// Never fails: missing credentials, store errors and snapshot failures
    /// are recorded in `errors` with `needs_sync = false`.
    #[instrument(skip_all, fields(scope = %scope))]
    pub async fn validate_sync(&self, scope: &SyncScope) -> SyncValidationResult {
        let credentials = match self.credentials.credentials_for(scope).await {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                info!("no credentials linked, skipping validation");
                return SyncValidationResult::unavailable(
                    scope.as_str(),
                    ValidationIssue::CredentialsMissing(scope.to_string()),
                );
            }
            Err(err) => {
                warn!(error = %err, "credentials lookup failed");
                return SyncValidationResult::unavailable(
                    scope.as_str(),
                    ValidationIssue::CredentialsMissing(err.to_string()),
                );
            }
        };

        let local = match self.store.list_by_scope(scope).await {
            Ok(local) => local,
            Err(err) => {
                warn!(error = %err, "local campaigns unavailable");
                return SyncValidationResult::unavailable(
                    scope.as_str(),
                    ValidationIssue::StoreUnavailable(err.to_string()),
                );
            }
        };

        let remote = match self.fetcher.fetch_active_campaigns(&credentials).await {
            Ok(remote) => remote,
            Err(err) => {
                warn!(error = %err, "remote snapshot unavailable");
                return SyncValidationResult::unavailable(
                    scope.as_str(),
                    ValidationIssue::SnapshotUnavailable(err.to_string()),
                );
            }
        };

        let campaigns = self.compare(&local, &remote);
        let result = SyncValidationResult::from_validations(scope.as_str(), campaigns);
        info!(
            needs_sync = result.needs_sync,
            stale = result.stale_ids.len(),
            new = result.new_ids.len(),
            budget_mismatches = result.budget_mismatch_ids.len(),
            "validation complete"
        );
        result
    }

    /// Per-id comparison over the union of live local and remote campaigns.
    ///
    /// Local rows already marked deleted are left out, so a stale campaign
    /// is reported once and not again after it has been fixed.
    fn compare(&self, local: &[LocalCampaign], remote: &[RemoteCampaign]) -> Vec<CampaignValidation> {
        let live: Vec<&LocalCampaign> = local.iter().filter(|c| !c.status.is_deleted()).collect();
        let local_by_id: HashMap<&str, &LocalCampaign> =
            live.iter().map(|c| (c.id.as_str(), *c)).collect();
        let remote_by_id: HashMap<&str, &RemoteCampaign> =
            remote.iter().map(|c| (c.id.as_str(), c)).collect();

        let mut seen = HashSet::new();
        let ids = live
            .iter()
            .map(|c| c.id.as_str())
            .chain(remote.iter().map(|c| c.id.as_str()))
            .filter(|id| seen.insert(*id));

        ids.map(|id| {
            let local = local_by_id.get(id);
            let remote = remote_by_id.get(id);
            let remote_budget = remote
                .and_then(|c| normalize_remote_budget(c, self.config.minor_units_per_major));
            let local_budget = local.and_then(|c| c.budget);

            CampaignValidation {
                entity_id: id.to_string(),
                exists_remote: remote.is_some(),
                exists_local: local.is_some(),
                remote_budget,
                local_budget,
                budgets_match: budgets_match(
                    remote_budget,
                    local_budget,
                    self.config.budget_tolerance,
                ),
            }
        })
        .collect()
    }

    /// Brings the local store in line with `result`.
    ///
    /// Stale campaigns are marked deleted and mismatched budgets take the
    /// remote value (when enabled). Live campaigns without a campaign-level
    /// budget on the platform get their budget recomputed from their active
    /// ad sets; a remote campaign budget is never overwritten by that sum.
    /// Campaigns the validation did not see are recomputed as well. Writes
    /// are independent: a failed
    /// write is recorded and the rest still run. A result that recorded
    /// errors is never acted on.
    #[instrument(skip_all, fields(scope = %scope))]
    pub async fn auto_fix(&self, scope: &SyncScope, result: &SyncValidationResult) -> AutoFixOutcome {
        if result.has_errors() {
            warn!(errors = result.errors.len(), "refusing to auto-fix from a failed validation");
            return AutoFixOutcome::skipped();
        }

        let mut outcome = AutoFixOutcome::default();

        if !result.stale_ids.is_empty() {
            match self.store.mark_deleted(&result.stale_ids).await {
                Ok(deleted) => outcome.deleted = deleted,
                Err(err) => {
                    warn!(error = %err, "marking stale campaigns deleted failed");
                    outcome.failures.push(format!("mark deleted: {err}"));
                }
            }
        }

        if self.config.repair_budget_mismatches {
            for id in &result.budget_mismatch_ids {
                let Some(budget) = result.validation_for(id).and_then(|v| v.remote_budget) else {
                    continue;
                };
                match self.store.update_fields(id, &CampaignUpdate::budget(budget)).await {
                    Ok(()) => outcome.budgets_repaired += 1,
                    Err(err) => {
                        warn!(campaign_id = %id, error = %err, "budget repair failed");
                        outcome.failures.push(format!("repair budget {id}: {err}"));
                    }
                }
            }
        }

        match self.store.list_by_scope(scope).await {
            Ok(campaigns) => {
                for campaign in campaigns.iter().filter(|c| !c.status.is_deleted()) {
                    let remote_budgeted = result
                        .validation_for(&campaign.id)
                        .is_some_and(|v| v.remote_budget.is_some());
                    if remote_budgeted {
                        continue;
                    }
                    match self.recompute_total(campaign).await {
                        Ok(true) => outcome.totals_recomputed += 1,
                        Ok(false) => {}
                        Err(err) => {
                            warn!(campaign_id = %campaign.id, error = %err, "budget recompute failed");
                            outcome.failures.push(format!("recompute {}: {err}", campaign.id));
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "listing campaigns for recompute failed");
                outcome.failures.push(format!("list campaigns: {err}"));
            }
        }

        outcome.success = outcome.failures.is_empty();
        info!(
            success = outcome.success,
            deleted = outcome.deleted,
            budgets_repaired = outcome.budgets_repaired,
            totals_recomputed = outcome.totals_recomputed,
            "auto-fix complete"
        );
        outcome
    }

    /// Sets a campaign's budget to the sum of its active ad sets' budgets.
    ///
    /// Returns whether a write happened. Campaigns whose ad sets carry no
    /// budget keep their own.
    async fn recompute_total(&self, campaign: &LocalCampaign) -> adsync_domain::Result<bool> {
        let children = self.store.list_children(&campaign.id).await?;
        let budgets: Vec<f64> = children
            .iter()
            .filter(|child| child.status.is_active())
            .filter_map(|child| child.effective_budget())
            .collect();

        if budgets.is_empty() {
            return Ok(false);
        }

        let total: f64 = budgets.iter().sum();
        if campaign.budget.is_some_and(|current| (current - total).abs() < f64::EPSILON) {
            return Ok(false);
        }

        debug!(campaign_id = %campaign.id, previous = ?campaign.budget, total, "recomputing budget");
        self.store.update_fields(&campaign.id, &CampaignUpdate::budget(total)).await?;
        Ok(true)
    }

    /// Validates `scope` and, when drift was found, fixes it.
    #[instrument(skip_all, fields(scope = %scope))]
    pub async fn check_and_auto_sync(&self, scope: &SyncScope) -> AutoSyncReport {
        let result = self.validate_sync(scope).await;

        if let Some(issue) = result.errors.first() {
            let message = match issue {
                ValidationIssue::CredentialsMissing(_) => issue.to_string(),
                _ => format!("validation failed: {issue}"),
            };
            return AutoSyncReport { success: false, message, sync_triggered: false };
        }

        if !result.needs_sync {
            return AutoSyncReport {
                success: true,
                message: "local campaigns are in sync".to_string(),
                sync_triggered: false,
            };
        }

        let outcome = self.auto_fix(scope, &result).await;
        let message = if outcome.success {
            format!(
                "auto-fixed: {} deleted, {} budgets repaired, {} totals recomputed",
                outcome.deleted, outcome.budgets_repaired, outcome.totals_recomputed
            )
        } else {
            format!("auto-fix incomplete: {}", outcome.failures.join("; "))
        };

        AutoSyncReport { success: outcome.success, message, sync_triggered: true }
    }
}

impl std::fmt::Debug for SyncValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncValidator")
            .field("fetcher", &self.fetcher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
