//! Run-scoped parameters
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! reproduces the standard run.

use crate::error::Result;
use crate::features::{FeatureConfig, PolicyClaim};
use crate::policy::loader::{DEFAULT_CLAIMS_PATH, DEFAULT_POLICIES_PATH};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Default directory for the persisted tables
pub const DEFAULT_OUTPUT_DIR: &str = "output";

fn default_policies_path() -> PathBuf {
    PathBuf::from(DEFAULT_POLICIES_PATH)
}
fn default_claims_path() -> PathBuf {
    PathBuf::from(DEFAULT_CLAIMS_PATH)
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
fn default_seed() -> u64 { 2024 }

/// Optional exclusions applied to the policy-claim table (all off by default)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyFilters {
    /// Drop policies with exposure above this many years
    #[serde(default)]
    pub max_exposure: Option<f64>,

    /// Drop policies whose total claim amount exceeds this value
    #[serde(default)]
    pub max_total_claims: Option<f64>,
}

/// Rows removed by each filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub exposure: usize,
    pub total_claims: usize,
}

impl PolicyFilters {
    pub fn is_active(&self) -> bool {
        self.max_exposure.is_some() || self.max_total_claims.is_some()
    }

    pub fn apply(&self, rows: Vec<PolicyClaim>) -> (Vec<PolicyClaim>, FilterCounts) {
        let mut counts = FilterCounts::default();
        let kept = rows
            .into_iter()
            .filter(|row| {
                if self.max_exposure.is_some_and(|max| row.exposure > max) {
                    counts.exposure += 1;
                    return false;
                }
                if self.max_total_claims.is_some_and(|max| row.total_claims > max) {
                    counts.total_claims += 1;
                    return false;
                }
                true
            })
            .collect();
        (kept, counts)
    }
}

/// Parameters of one preparation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    #[serde(default = "default_policies_path")]
    pub policies_path: PathBuf,

    #[serde(default = "default_claims_path")]
    pub claims_path: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Seed for the pairs-plot sample
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Rows of the policy-claim table to sample (no sample when unset)
    #[serde(default)]
    pub sample_size: Option<usize>,

    /// Abort instead of reporting when claims reference unknown policies
    #[serde(default)]
    pub fail_on_orphans: bool,

    /// Aggregate claims in parallel partitions
    #[serde(default)]
    pub parallel_aggregation: bool,

    #[serde(default)]
    pub filters: PolicyFilters,

    #[serde(default)]
    pub features: FeatureConfig,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            policies_path: default_policies_path(),
            claims_path: default_claims_path(),
            output_dir: default_output_dir(),
            seed: default_seed(),
            sample_size: None,
            fail_on_orphans: false,
            parallel_aggregation: false,
            filters: PolicyFilters::default(),
            features: FeatureConfig::default(),
        }
    }
}

impl RunParams {
    /// Load parameters from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
