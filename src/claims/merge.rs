//! Left-join aggregated claims onto policies and check claim counts

use super::AggregatedClaims;
use crate::policy::PolicyRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A policy with its joined claim aggregate, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPolicy {
    pub policy: PolicyRecord,
    /// Claim events found for the policy (0 when none)
    pub num_claim: u32,
    /// Sum of claim amounts (0 when none)
    pub total_claims: f64,
}

/// A validated policy; `num_claim` has been dropped
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedPolicy {
    pub policy: PolicyRecord,
    pub total_claims: f64,
}

/// Claim aggregate whose policy id is not in the policy table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrphanClaims {
    pub policy_id: u32,
    pub num_claim: u32,
    pub total_claims: f64,
}

/// Policy whose own claim count disagrees with its claim events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub policy_id: u32,
    pub claim_count: u32,
    pub num_claim: u32,
}

/// Advisory findings of the merge
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub mismatches: Vec<CountMismatch>,
    pub orphans: Vec<OrphanClaims>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.orphans.is_empty()
    }

    /// Claim event rows that reference unknown policies
    pub fn orphan_claim_rows(&self) -> usize {
        self.orphans.iter().map(|o| o.num_claim as usize).sum()
    }

    pub fn mismatched_ids(&self) -> Vec<u32> {
        self.mismatches.iter().map(|m| m.policy_id).collect()
    }
}

/// Result of the left join
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    /// One row per policy, in policy-table order
    pub rows: Vec<MergedPolicy>,
    /// Aggregates that matched no policy, ordered by policy id
    pub orphans: Vec<OrphanClaims>,
}

/// Left-join claim aggregates onto the policy table
///
/// Every policy is kept. Policies without an aggregate get zero claims and a
/// zero total. Aggregate order is irrelevant.
pub fn merge_claims(policies: &[PolicyRecord], aggregates: &[AggregatedClaims]) -> MergedTable {
    let by_policy: HashMap<u32, &AggregatedClaims> = aggregates.iter().map(|a| (a.policy_id, a)).collect();

    let rows = policies
        .iter()
        .map(|policy| {
            let (num_claim, total_claims) = by_policy
                .get(&policy.policy_id)
                .map_or((0, 0.0), |a| (a.num_claim, a.total_claims));
            MergedPolicy {
                policy: policy.clone(),
                num_claim,
                total_claims,
            }
        })
        .collect();

    let known: HashSet<u32> = policies.iter().map(|p| p.policy_id).collect();
    let mut orphans: Vec<OrphanClaims> = aggregates
        .iter()
        .filter(|a| !known.contains(&a.policy_id))
        .map(|a| OrphanClaims {
            policy_id: a.policy_id,
            num_claim: a.num_claim,
            total_claims: a.total_claims,
        })
        .collect();
    orphans.sort_by_key(|o| o.policy_id);

    MergedTable { rows, orphans }
}

impl MergedTable {
    /// Compare each policy's claim count with its joined claim events
    pub fn validate(&self) -> ValidationReport {
        let mismatches = self
            .rows
            .iter()
            .filter(|row| row.num_claim != row.policy.claim_count)
            .map(|row| CountMismatch {
                policy_id: row.policy.policy_id,
                claim_count: row.policy.claim_count,
                num_claim: row.num_claim,
            })
            .collect();

        ValidationReport {
            mismatches,
            orphans: self.orphans.clone(),
        }
    }

    /// Validate, then drop the `num_claim` column
    pub fn into_validated(self) -> (Vec<ClaimedPolicy>, ValidationReport) {
        let report = self.validate();
        let rows = self
            .rows
            .into_iter()
            .map(|row| ClaimedPolicy {
                policy: row.policy,
                total_claims: row.total_claims,
            })
            .collect();
        (rows, report)
    }
}
