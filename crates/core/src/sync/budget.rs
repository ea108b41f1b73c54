//! Budget normalisation and comparison.

use adsync_domain::RemoteCampaign;

/// Campaign-level remote budget in local (major) currency units.
///
/// The daily budget wins over the lifetime budget. Zero or missing values
/// mean the budget lives on the ad sets instead, reported as `None`.
pub fn normalize_remote_budget(campaign: &RemoteCampaign, minor_units_per_major: f64) -> Option<f64> {
    let positive = |amount: Option<f64>| amount.filter(|value| *value > 0.0);
    positive(campaign.daily_budget)
        .or_else(|| positive(campaign.lifetime_budget))
        .map(|minor| minor / minor_units_per_major)
}

/// Whether a local budget agrees with the remote one.
///
/// A campaign without a campaign-level remote budget has nothing to
/// disagree with. A remote budget the local row lacks is a mismatch.
pub fn budgets_match(remote: Option<f64>, local: Option<f64>, tolerance: f64) -> bool {
    match (remote, local) {
        (None, _) => true,
        (Some(_), None) => false,
        // Tiny slack so a tolerance of 0.01 accepts a 0.01 difference
        // despite binary rounding.
        (Some(remote), Some(local)) => (remote - local).abs() <= tolerance + 1e-9,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_takes_precedence_over_lifetime() {
        let campaign =
            RemoteCampaign::new("1", "ACTIVE").with_daily_budget(1_000.0).with_lifetime_budget(50_000.0);
        assert_eq!(normalize_remote_budget(&campaign, 100.0), Some(10.0));
    }

    #[test]
    fn falls_back_to_lifetime_and_ignores_zero() {
        let campaign =
            RemoteCampaign::new("1", "ACTIVE").with_daily_budget(0.0).with_lifetime_budget(2_550.0);
        assert_eq!(normalize_remote_budget(&campaign, 100.0), Some(25.5));
        assert_eq!(normalize_remote_budget(&RemoteCampaign::new("2", "ACTIVE"), 100.0), None);
    }

    #[test]
    fn tolerance_boundaries() {
        assert!(budgets_match(Some(10.0), Some(9.999), 0.01));
        assert!(budgets_match(Some(10.0), Some(10.01), 0.01));
        assert!(!budgets_match(Some(10.0), Some(9.5), 0.01));
        assert!(!budgets_match(Some(10.0), Some(10.02), 0.01));
    }

    #[test]
    fn missing_sides() {
        assert!(budgets_match(None, Some(42.0), 0.01));
        assert!(budgets_match(None, None, 0.01));
        assert!(!budgets_match(Some(5.0), None, 0.01));
    }
}
