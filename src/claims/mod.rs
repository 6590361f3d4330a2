//! Claims aggregation and policy-claims merging

mod aggregate;
mod merge;

pub use aggregate::{aggregate_claims, aggregate_claims_par, AggregatedClaims};
pub use merge::{merge_claims, ClaimedPolicy, CountMismatch, MergedPolicy, MergedTable, OrphanClaims, ValidationReport};
