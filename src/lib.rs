//! Motor Pricing Data - Preparation of policy and claims tables for pricing models
//!
//! This library provides:
//! - Loading and validation of the raw policy and claims tables
//! - Per-policy claims aggregation and claim-count consistency checks
//! - Derived rating factors (interval bins, long-tail "other" levels)
//! - Descriptive statistics and one-way tables
//! - CSV and Parquet persistence of the prepared tables

pub mod error;
pub mod config;
pub mod policy;
pub mod claims;
pub mod features;
pub mod summary;
pub mod sink;
pub mod pipeline;

// Re-export commonly used types
pub use error::{DataError, Result};
pub use config::{RunParams, PolicyFilters};
pub use policy::{PolicyRecord, ClaimEvent};
pub use claims::{AggregatedClaims, ValidationReport};
pub use features::{FeatureConfig, FeatureDeriver, PolicyClaim};
pub use pipeline::{Pipeline, RunReport};
