//! Raw policy and claim tables and their loading

mod data;
pub mod loader;

pub use data::{Brand, Categorical, CategoricalField, ClaimEvent, Fuel, NumericField, PolicyRecord, Power, Region};
pub use loader::{load_claims, load_claims_from_reader, load_policies, load_policies_from_reader};
