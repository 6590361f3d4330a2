//! Load the raw policy and claims tables from CSV

use super::{Brand, Categorical, ClaimEvent, Fuel, PolicyRecord, Power, Region};
use crate::error::{DataError, Result};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Default location of the policy table
pub const DEFAULT_POLICIES_PATH: &str = "data/policies.csv";

/// Default location of the claims table
pub const DEFAULT_CLAIMS_PATH: &str = "data/claims.csv";

/// (output name, dataset header) for every required policy column
const POLICY_COLUMNS: &[(&str, &str)] = &[
    ("policy_id", "PolicyID"),
    ("claim_count", "ClaimNb"),
    ("exposure", "Exposure"),
    ("power", "Power"),
    ("car_age", "CarAge"),
    ("driver_age", "DriverAge"),
    ("brand", "Brand"),
    ("fuel", "Gas"),
    ("region", "Region"),
    ("density", "Density"),
];

const CLAIM_COLUMNS: &[(&str, &str)] = &[("policy_id", "PolicyID"), ("claim_amount", "ClaimAmount")];

/// Raw CSV row of the policy table
#[derive(Debug, serde::Deserialize)]
struct PolicyRow {
    #[serde(rename = "PolicyID", alias = "policy_id")]
    policy_id: u32,
    #[serde(rename = "ClaimNb", alias = "claim_count")]
    claim_count: u32,
    #[serde(rename = "Exposure", alias = "exposure")]
    exposure: f64,
    #[serde(rename = "Power", alias = "power")]
    power: String,
    #[serde(rename = "CarAge", alias = "car_age")]
    car_age: f64,
    #[serde(rename = "DriverAge", alias = "driver_age")]
    driver_age: f64,
    #[serde(rename = "Brand", alias = "brand")]
    brand: String,
    #[serde(rename = "Gas", alias = "fuel")]
    fuel: String,
    #[serde(rename = "Region", alias = "region")]
    region: String,
    #[serde(rename = "Density", alias = "density")]
    density: f64,
}

impl PolicyRow {
    fn to_record(self) -> Result<PolicyRecord> {
        let policy_id = self.policy_id;
        let check = |field: &'static str, value: f64, ok: bool| -> Result<f64> {
            if value.is_finite() && ok {
                Ok(value)
            } else {
                Err(DataError::InvalidValue { field, policy_id, value })
            }
        };

        Ok(PolicyRecord {
            policy_id,
            claim_count: self.claim_count,
            exposure: check("exposure", self.exposure, self.exposure > 0.0)?,
            power: Power::parse_level(&self.power)?,
            car_age: check("car_age", self.car_age, self.car_age >= 0.0)?,
            driver_age: check("driver_age", self.driver_age, true)?,
            brand: Brand::parse_level(&self.brand)?,
            fuel: Fuel::parse_level(&self.fuel)?,
            region: Region::parse_level(&self.region)?,
            density: check("density", self.density, self.density >= 0.0)?,
        })
    }
}

/// Raw CSV row of the claims table
#[derive(Debug, serde::Deserialize)]
struct ClaimRow {
    #[serde(rename = "PolicyID", alias = "policy_id")]
    policy_id: u32,
    #[serde(rename = "ClaimAmount", alias = "claim_amount")]
    claim_amount: f64,
}

impl ClaimRow {
    fn to_event(self) -> Result<ClaimEvent> {
        if !(self.claim_amount.is_finite() && self.claim_amount > 0.0) {
            return Err(DataError::InvalidValue {
                field: "claim_amount",
                policy_id: self.policy_id,
                value: self.claim_amount,
            });
        }
        Ok(ClaimEvent {
            policy_id: self.policy_id,
            claim_amount: self.claim_amount,
        })
    }
}

/// Fail on the first required column absent from the header row
fn require_columns(table: &'static str, headers: &StringRecord, columns: &[(&'static str, &'static str)]) -> Result<()> {
    for &(name, header) in columns {
        let present = headers.iter().any(|h| h == name || h == header);
        if !present {
            return Err(DataError::MissingColumn { table, column: name });
        }
    }
    Ok(())
}

/// Header names are matched with surrounding whitespace removed
fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.trim(Trim::Headers);
    builder
}

/// Load all policies from a CSV file
pub fn load_policies<P: AsRef<Path>>(path: P) -> Result<Vec<PolicyRecord>> {
    let reader = reader_builder().from_path(path)?;
    read_policies(reader)
}

/// Load policies from any reader (e.g., string buffer)
pub fn load_policies_from_reader<R: Read>(reader: R) -> Result<Vec<PolicyRecord>> {
    read_policies(reader_builder().from_reader(reader))
}

fn read_policies<R: Read>(mut reader: Reader<R>) -> Result<Vec<PolicyRecord>> {
    require_columns("policies", reader.headers()?, POLICY_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut policies = Vec::new();

    for result in reader.deserialize() {
        let row: PolicyRow = result?;
        let policy = row.to_record()?;
        if !seen.insert(policy.policy_id) {
            return Err(DataError::DuplicatePolicy {
                policy_id: policy.policy_id,
            });
        }
        policies.push(policy);
    }

    log::info!("Loaded {} policies", policies.len());
    Ok(policies)
}

/// Load all claim events from a CSV file
pub fn load_claims<P: AsRef<Path>>(path: P) -> Result<Vec<ClaimEvent>> {
    let reader = reader_builder().from_path(path)?;
    read_claims(reader)
}

/// Load claim events from any reader
pub fn load_claims_from_reader<R: Read>(reader: R) -> Result<Vec<ClaimEvent>> {
    read_claims(reader_builder().from_reader(reader))
}

fn read_claims<R: Read>(mut reader: Reader<R>) -> Result<Vec<ClaimEvent>> {
    require_columns("claims", reader.headers()?, CLAIM_COLUMNS)?;

    let mut claims = Vec::new();
    for result in reader.deserialize() {
        let row: ClaimRow = result?;
        claims.push(row.to_event()?);
    }

    log::info!("Loaded {} claim events", claims.len());
    Ok(claims)
}
