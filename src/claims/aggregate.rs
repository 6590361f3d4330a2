//! Collapse claim events to one row per policy

use crate::policy::ClaimEvent;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Claim events per parallel partition
const CHUNK_SIZE: usize = 64 * 1024;

/// Claim count and total amount for one policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedClaims {
    pub policy_id: u32,
    pub num_claim: u32,
    pub total_claims: f64,
}

/// Running totals for one policy
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: u32,
    sum: f64,
}

impl Accumulator {
    fn add(&mut self, claim_amount: f64) {
        self.count += 1;
        self.sum += claim_amount;
    }

    fn merge(&mut self, other: Accumulator) {
        self.count += other.count;
        self.sum += other.sum;
    }
}

fn fold_claims(claims: &[ClaimEvent]) -> BTreeMap<u32, Accumulator> {
    let mut totals: BTreeMap<u32, Accumulator> = BTreeMap::new();
    for claim in claims {
        totals.entry(claim.policy_id).or_default().add(claim.claim_amount);
    }
    totals
}

fn materialize(totals: BTreeMap<u32, Accumulator>) -> Vec<AggregatedClaims> {
    totals
        .into_iter()
        .map(|(policy_id, acc)| AggregatedClaims {
            policy_id,
            num_claim: acc.count,
            total_claims: acc.sum,
        })
        .collect()
}

/// Group claims by policy, ordered by policy id
///
/// Policies without claim events do not appear in the result.
pub fn aggregate_claims(claims: &[ClaimEvent]) -> Vec<AggregatedClaims> {
    let aggregated = materialize(fold_claims(claims));
    log::debug!("Aggregated {} claims into {} policies", claims.len(), aggregated.len());
    aggregated
}

/// Partitioned variant of [`aggregate_claims`]
///
/// Partitions have a fixed size and partial totals are merged in partition
/// order, so the result does not depend on thread scheduling. Counts are
/// identical to the sequential fold; sums may differ in the last bits because
/// the additions are grouped differently.
pub fn aggregate_claims_par(claims: &[ClaimEvent]) -> Vec<AggregatedClaims> {
    let partials: Vec<BTreeMap<u32, Accumulator>> = claims.par_chunks(CHUNK_SIZE).map(fold_claims).collect();

    let mut totals: BTreeMap<u32, Accumulator> = BTreeMap::new();
    for partial in partials {
        for (policy_id, acc) in partial {
            totals.entry(policy_id).or_default().merge(acc);
        }
    }

    materialize(totals)
}
