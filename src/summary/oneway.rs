//! One-way tables: exposure, claims, frequency and severity per level

use crate::features::PolicyClaim;
use crate::policy::Categorical;
use serde::Serialize;
use std::collections::BTreeMap;

/// A categorical column of the policy-claim table, raw or derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Power,
    AggPower,
    AggPower2,
    Brand,
    Fuel,
    Region,
    AggRegion,
    CatDriverAge,
    CatCarAge,
    CatDensity,
}

impl Dimension {
    pub const ALL: [Dimension; 10] = [
        Dimension::Power,
        Dimension::AggPower,
        Dimension::AggPower2,
        Dimension::Brand,
        Dimension::Fuel,
        Dimension::Region,
        Dimension::AggRegion,
        Dimension::CatDriverAge,
        Dimension::CatCarAge,
        Dimension::CatDensity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Power => "power",
            Dimension::AggPower => "agg_power",
            Dimension::AggPower2 => "agg_power_2",
            Dimension::Brand => "brand",
            Dimension::Fuel => "fuel",
            Dimension::Region => "region",
            Dimension::AggRegion => "agg_region",
            Dimension::CatDriverAge => "cat_driver_age",
            Dimension::CatCarAge => "cat_car_age",
            Dimension::CatDensity => "cat_density",
        }
    }

    pub fn level<'a>(&self, row: &'a PolicyClaim) -> &'a str {
        match self {
            Dimension::Power => row.power.as_str(),
            Dimension::AggPower => row.agg_power,
            Dimension::AggPower2 => row.agg_power_2,
            Dimension::Brand => row.brand.as_str(),
            Dimension::Fuel => row.fuel.as_str(),
            Dimension::Region => row.region.as_str(),
            Dimension::AggRegion => row.agg_region,
            Dimension::CatDriverAge => &row.cat_driver_age,
            Dimension::CatCarAge => &row.cat_car_age,
            Dimension::CatDensity => &row.cat_density,
        }
    }
}

/// Totals for one level of a dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelSummary {
    pub policies: usize,
    pub exposure: f64,
    pub claims: u64,
    pub total_amount: f64,
}

impl LevelSummary {
    fn add(&mut self, row: &PolicyClaim) {
        self.policies += 1;
        self.exposure += row.exposure;
        self.claims += u64::from(row.claim_count);
        self.total_amount += row.total_claims;
    }

    /// Claims per policy-year
    pub fn frequency(&self) -> f64 {
        if self.exposure > 0.0 {
            self.claims as f64 / self.exposure
        } else {
            0.0
        }
    }

    /// Average claim amount; `None` when the level has no claims
    pub fn severity(&self) -> Option<f64> {
        (self.claims > 0).then(|| self.total_amount / self.claims as f64)
    }
}

/// Per-level totals of one dimension, ordered by label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneWayTable {
    pub dimension: Dimension,
    pub levels: BTreeMap<String, LevelSummary>,
}

impl OneWayTable {
    pub fn build(rows: &[PolicyClaim], dimension: Dimension) -> Self {
        let mut levels: BTreeMap<String, LevelSummary> = BTreeMap::new();
        for row in rows {
            let level = dimension.level(row);
            match levels.get_mut(level) {
                Some(summary) => summary.add(row),
                None => {
                    let mut summary = LevelSummary::default();
                    summary.add(row);
                    levels.insert(level.to_string(), summary);
                }
            }
        }
        Self { dimension, levels }
    }

    pub fn get(&self, level: &str) -> Option<&LevelSummary> {
        self.levels.get(level)
    }

    /// Levels whose exposure share is below `threshold`, candidates for an
    /// "other" collapse set
    pub fn thin_levels(&self, threshold: f64) -> Vec<&str> {
        let total: f64 = self.levels.values().map(|l| l.exposure).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        self.levels
            .iter()
            .filter(|(_, l)| l.exposure / total < threshold)
            .map(|(level, _)| level.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimedPolicy;
    use crate::features::{FeatureConfig, FeatureDeriver};
    use crate::policy::{Brand, Fuel, PolicyRecord, Power, Region};
    use approx::assert_relative_eq;

    fn rows() -> Vec<PolicyClaim> {
        let make = |policy_id, claim_count, exposure, power, region, total_claims| ClaimedPolicy {
            policy: PolicyRecord {
                policy_id,
                claim_count,
                exposure,
                power,
                car_age: 2.0,
                driver_age: 35.0,
                brand: Brand::Fiat,
                fuel: Fuel::Diesel,
                region,
                density: 80.0,
            },
            total_claims,
        };
        let claimed = vec![
            make(1, 0, 1.0, Power::I, Region::R11, 0.0),
            make(2, 2, 0.5, Power::J, Region::R25, 3000.0),
            make(3, 1, 0.5, Power::K, Region::R11, 500.0),
            make(4, 0, 2.0, Power::J, Region::R23, 0.0),
        ];
        FeatureDeriver::new(&FeatureConfig::default())
            .unwrap()
            .derive(claimed)
            .unwrap()
    }

    #[test]
    fn test_totals_per_level() {
        let table = OneWayTable::build(&rows(), Dimension::Power);
        let j = table.get("j").unwrap();
        assert_eq!(j.policies, 2);
        assert_relative_eq!(j.exposure, 2.5);
        assert_eq!(j.claims, 2);
        assert_relative_eq!(j.frequency(), 0.8);
        assert_eq!(j.severity(), Some(1500.0));
        assert_eq!(table.get("i").unwrap().severity(), None);
    }

    #[test]
    fn test_derived_dimension_merges_collapsed_levels() {
        let table = OneWayTable::build(&rows(), Dimension::AggPower);
        let labels: Vec<&str> = table.levels.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["j", "other"]);
        assert_eq!(table.get("other").unwrap().policies, 2);

        let regions = OneWayTable::build(&rows(), Dimension::AggRegion);
        assert_eq!(regions.get("other").unwrap().claims, 2);
    }

    #[test]
    fn test_thin_levels() {
        let table = OneWayTable::build(&rows(), Dimension::Region);
        // Exposure: R11 1.5, R23 2.0, R25 0.5 out of 4.0
        assert_eq!(table.thin_levels(0.2), vec!["R25"]);
    }
}
