//! Descriptive statistics of the loaded and derived tables
//!
//! - [`DescriptiveStats`]: min, max, mean, median and dispersion of a column
//! - [`OneWayTable`]: exposure, claim frequency and severity per level
//! - [`DatasetSummary`]: the headline figures of a run

mod descriptive;
mod oneway;

pub use descriptive::DescriptiveStats;
pub use oneway::{Dimension, LevelSummary, OneWayTable};

use crate::policy::{ClaimEvent, NumericField, PolicyRecord};
use serde::Serialize;
use std::collections::HashSet;

/// Headline statistics of the policy and claims tables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub policies: usize,
    pub claim_events: usize,
    pub policies_with_claims: usize,
    /// Policies in force for more than one year
    pub exposure_above_one: usize,
    pub total_exposure: f64,
    /// Claims per policy-year over the whole portfolio
    pub frequency: f64,
    /// Average claim amount, if any claim exists
    pub severity: Option<f64>,
    pub exposure: Option<DescriptiveStats>,
    pub car_age: Option<DescriptiveStats>,
    pub driver_age: Option<DescriptiveStats>,
    pub density: Option<DescriptiveStats>,
    pub claim_amount: Option<DescriptiveStats>,
}

impl DatasetSummary {
    /// Figures are taken from the tables as loaded, before any row filter
    pub fn build(policies: &[PolicyRecord], claims: &[ClaimEvent]) -> Self {
        let column = |field: NumericField| DescriptiveStats::new(policies.iter().map(|p| field.value(p)));

        let total_exposure: f64 = policies.iter().map(|p| p.exposure).sum();
        let total_claim_count: u64 = policies.iter().map(|p| u64::from(p.claim_count)).sum();
        let total_amount: f64 = claims.iter().map(|c| c.claim_amount).sum();
        let claimed: HashSet<u32> = claims.iter().map(|c| c.policy_id).collect();

        Self {
            policies: policies.len(),
            claim_events: claims.len(),
            policies_with_claims: policies.iter().filter(|p| claimed.contains(&p.policy_id)).count(),
            exposure_above_one: policies.iter().filter(|p| p.exposure > 1.0).count(),
            total_exposure,
            frequency: if total_exposure > 0.0 {
                total_claim_count as f64 / total_exposure
            } else {
                0.0
            },
            severity: (!claims.is_empty()).then(|| total_amount / claims.len() as f64),
            exposure: column(NumericField::Exposure),
            car_age: column(NumericField::CarAge),
            driver_age: column(NumericField::DriverAge),
            density: column(NumericField::Density),
            claim_amount: DescriptiveStats::new(claims.iter().map(|c| c.claim_amount)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::loader::{DEFAULT_CLAIMS_PATH, DEFAULT_POLICIES_PATH};
    use crate::policy::{load_claims, load_policies};

    #[test]
    fn test_fixture_summary() {
        let policies = load_policies(DEFAULT_POLICIES_PATH).unwrap();
        let claims = load_claims(DEFAULT_CLAIMS_PATH).unwrap();
        let summary = DatasetSummary::build(&policies, &claims);

        assert_eq!(summary.policies, 24);
        assert_eq!(summary.claim_events, 9);
        assert_eq!(summary.policies_with_claims, 6);
        assert_eq!(summary.exposure_above_one, 2);
    }

    #[test]
    fn test_orphan_claims_do_not_count_as_claimed_policies() {
        let policies = load_policies(DEFAULT_POLICIES_PATH).unwrap();
        let mut claims = load_claims(DEFAULT_CLAIMS_PATH).unwrap();
        claims.push(ClaimEvent { policy_id: 999, claim_amount: 10.0 });

        let summary = DatasetSummary::build(&policies, &claims);
        assert_eq!(summary.policies_with_claims, 6);
        assert_eq!(summary.claim_events, 10);
    }
}
