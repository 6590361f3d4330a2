//! Derived columns of the policy-claim table

use super::{BinSpec, CollapseRule, CollapseSpec, Cutpoints};
use crate::claims::ClaimedPolicy;
use crate::error::{DataError, Result};
use crate::policy::{Brand, CategoricalField, Fuel, NumericField, PolicyRecord, Power, Region};
use serde::{Deserialize, Serialize};

fn default_driver_age_bins() -> BinSpec {
    BinSpec::new(&[17.0, 22.0, 26.0, 42.0, 74.0], false)
}

fn default_car_age_bins() -> BinSpec {
    BinSpec::new(&[0.0, 1.0, 4.0, 15.0], true)
}

fn default_density_bins() -> BinSpec {
    BinSpec::new(&[0.0, 40.0, 200.0, 500.0, 4500.0], true)
}

fn default_agg_power() -> CollapseSpec {
    CollapseSpec::new(&["i", "k", "l", "m", "o", "n"])
}

fn default_agg_power_2() -> CollapseSpec {
    CollapseSpec::new(&["k", "l", "m", "o", "n"])
}

fn default_agg_region() -> CollapseSpec {
    CollapseSpec::new(&["R25", "R23", "R74"])
}

/// Cutpoints and collapse sets for every derived column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_driver_age_bins")]
    pub cat_driver_age: BinSpec,

    #[serde(default = "default_car_age_bins")]
    pub cat_car_age: BinSpec,

    #[serde(default = "default_density_bins")]
    pub cat_density: BinSpec,

    #[serde(default = "default_agg_power")]
    pub agg_power: CollapseSpec,

    /// Less aggressive power grouping that keeps `i`
    #[serde(default = "default_agg_power_2")]
    pub agg_power_2: CollapseSpec,

    #[serde(default = "default_agg_region")]
    pub agg_region: CollapseSpec,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            cat_driver_age: default_driver_age_bins(),
            cat_car_age: default_car_age_bins(),
            cat_density: default_density_bins(),
            agg_power: default_agg_power(),
            agg_power_2: default_agg_power_2(),
            agg_region: default_agg_region(),
        }
    }
}

/// Final per-policy row: policy fields, claim total and derived labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyClaim {
    pub policy_id: u32,
    pub claim_count: u32,
    pub exposure: f64,
    pub power: Power,
    pub car_age: f64,
    pub driver_age: f64,
    pub brand: Brand,
    pub fuel: Fuel,
    pub region: Region,
    pub density: f64,
    pub total_claims: f64,
    pub cat_driver_age: String,
    pub cat_car_age: String,
    pub cat_density: String,
    pub agg_power: &'static str,
    pub agg_power_2: &'static str,
    pub agg_region: &'static str,
}

impl PolicyClaim {
    /// The raw policy fields of this row
    pub fn policy(&self) -> PolicyRecord {
        PolicyRecord {
            policy_id: self.policy_id,
            claim_count: self.claim_count,
            exposure: self.exposure,
            power: self.power,
            car_age: self.car_age,
            driver_age: self.driver_age,
            brand: self.brand,
            fuel: self.fuel,
            region: self.region,
            density: self.density,
        }
    }
}

/// A continuous field bound to its cutpoints
#[derive(Debug, Clone)]
struct Binning {
    field: NumericField,
    cutpoints: Cutpoints,
}

impl Binning {
    fn new(field: NumericField, spec: &BinSpec) -> Result<Self> {
        Ok(Self {
            field,
            cutpoints: spec.build(field.name())?,
        })
    }

    fn label(&self, policy: &PolicyRecord) -> Result<String> {
        let value = self.field.value(policy);
        self.cutpoints
            .label_for(value)
            .map(str::to_string)
            .ok_or(DataError::OutOfRange {
                field: self.field.name(),
                policy_id: policy.policy_id,
                value,
            })
    }
}

/// Adds binned and collapsed columns to validated policies
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    driver_age: Binning,
    car_age: Binning,
    density: Binning,
    agg_power: CollapseRule,
    agg_power_2: CollapseRule,
    agg_region: CollapseRule,
}

impl FeatureDeriver {
    pub fn new(config: &FeatureConfig) -> Result<Self> {
        Ok(Self {
            driver_age: Binning::new(NumericField::DriverAge, &config.cat_driver_age)?,
            car_age: Binning::new(NumericField::CarAge, &config.cat_car_age)?,
            density: Binning::new(NumericField::Density, &config.cat_density)?,
            agg_power: config.agg_power.build(CategoricalField::Power)?,
            agg_power_2: config.agg_power_2.build(CategoricalField::Power)?,
            agg_region: config.agg_region.build(CategoricalField::Region)?,
        })
    }

    /// Derive one row; a value outside its cutpoints aborts with `OutOfRange`
    pub fn derive_one(&self, row: ClaimedPolicy) -> Result<PolicyClaim> {
        let ClaimedPolicy { policy, total_claims } = row;

        let cat_driver_age = self.driver_age.label(&policy)?;
        let cat_car_age = self.car_age.label(&policy)?;
        let cat_density = self.density.label(&policy)?;

        Ok(PolicyClaim {
            agg_power: self.agg_power.label_for(&policy),
            agg_power_2: self.agg_power_2.label_for(&policy),
            agg_region: self.agg_region.label_for(&policy),
            policy_id: policy.policy_id,
            claim_count: policy.claim_count,
            exposure: policy.exposure,
            power: policy.power,
            car_age: policy.car_age,
            driver_age: policy.driver_age,
            brand: policy.brand,
            fuel: policy.fuel,
            region: policy.region,
            density: policy.density,
            total_claims,
            cat_driver_age,
            cat_car_age,
            cat_density,
        })
    }

    pub fn derive(&self, rows: Vec<ClaimedPolicy>) -> Result<Vec<PolicyClaim>> {
        let derived = rows
            .into_iter()
            .map(|row| self.derive_one(row))
            .collect::<Result<Vec<_>>>()?;
        log::info!("Derived features for {} policies", derived.len());
        Ok(derived)
    }
}
