//! Error type shared by every stage of the preparation pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: &'static str, column: &'static str },

    #[error("Unknown level '{value}' for field '{field}'")]
    UnknownLevel { field: &'static str, value: String },

    #[error("Invalid value {value} for field '{field}' (policy {policy_id})")]
    InvalidValue {
        field: &'static str,
        policy_id: u32,
        value: f64,
    },

    #[error("Policy {policy_id} appears more than once in the policy table")]
    DuplicatePolicy { policy_id: u32 },

    #[error("Value {value} of '{field}' (policy {policy_id}) is outside the configured cutpoints")]
    OutOfRange {
        field: &'static str,
        policy_id: u32,
        value: f64,
    },

    #[error("Invalid cutpoints for '{field}': {reason}")]
    InvalidCutpoints { field: &'static str, reason: String },

    #[error("{count} claim rows reference unknown policies (first: {first})")]
    OrphanClaims { count: usize, first: u32 },
}

pub type Result<T> = std::result::Result<T, DataError>;
