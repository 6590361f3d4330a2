//! End-to-end preparation run
//!
//! load -> aggregate -> merge/validate -> derive -> filter -> sample -> write
//!
//! Validation findings are collected and reported at the end of the run;
//! structural problems (missing columns, unknown levels, out-of-range bin
//! inputs) abort immediately.

use crate::claims::{aggregate_claims, aggregate_claims_par, merge_claims, ValidationReport};
use crate::config::{FilterCounts, RunParams};
use crate::error::{DataError, Result};
use crate::features::{FeatureDeriver, PolicyClaim};
use crate::policy::{load_claims, load_policies, ClaimEvent, PolicyRecord};
use crate::sink::{DualSink, TableSink};
use crate::summary::DatasetSummary;
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

pub const POLICIES_TABLE: &str = "policies";
pub const CLAIMS_TABLE: &str = "claims";
pub const POLICY_CLAIMS_TABLE: &str = "policy_claims";
pub const SAMPLE_TABLE: &str = "policy_claims_sample";
pub const REPORT_FILE: &str = "run_report.json";

/// Output of the in-memory stages
#[derive(Debug, Clone)]
pub struct Prepared {
    pub policy_claims: Vec<PolicyClaim>,
    pub validation: ValidationReport,
    pub aggregated_policies: usize,
    pub filtered: FilterCounts,
    pub sample: Option<Vec<PolicyClaim>>,
}

/// Everything a run produced, written as `run_report.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub policies: usize,
    pub claim_events: usize,
    pub aggregated_policies: usize,
    pub policy_claims: usize,
    pub validation: ValidationReport,
    pub filtered: FilterCounts,
    pub sample_rows: Option<usize>,
    pub summary: DatasetSummary,
    pub outputs: Vec<PathBuf>,
}

/// Draw `size` rows with a seeded generator, keeping table order
pub fn sample_rows<T: Clone>(rows: &[T], size: usize, seed: u64) -> Vec<T> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let amount = size.min(rows.len());
    let mut indices = rand::seq::index::sample(&mut rng, rows.len(), amount).into_vec();
    indices.sort_unstable();
    indices.into_iter().map(|i| rows[i].clone()).collect()
}

fn log_validation(report: &ValidationReport) {
    for m in &report.mismatches {
        log::warn!(
            "Policy {}: claim_count {} but {} claim events",
            m.policy_id,
            m.claim_count,
            m.num_claim
        );
    }
    for o in &report.orphans {
        log::warn!("{} claim events reference unknown policy {}", o.num_claim, o.policy_id);
    }
    if report.is_clean() {
        log::info!("Claim counts consistent with claim events");
    }
}

/// A configured preparation run
#[derive(Debug, Clone)]
pub struct Pipeline {
    params: RunParams,
    deriver: FeatureDeriver,
}

impl Pipeline {
    pub fn new(params: RunParams) -> Result<Self> {
        let deriver = FeatureDeriver::new(&params.features)?;
        Ok(Self { params, deriver })
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Run every in-memory stage on already loaded tables
    pub fn prepare(&self, policies: &[PolicyRecord], claims: &[ClaimEvent]) -> Result<Prepared> {
        let aggregates = if self.params.parallel_aggregation {
            aggregate_claims_par(claims)
        } else {
            aggregate_claims(claims)
        };
        log::info!("{} policies have at least one claim event", aggregates.len());

        let (claimed, validation) = merge_claims(policies, &aggregates).into_validated();
        log_validation(&validation);

        if self.params.fail_on_orphans {
            if let Some(first) = validation.orphans.first() {
                return Err(DataError::OrphanClaims {
                    count: validation.orphan_claim_rows(),
                    first: first.policy_id,
                });
            }
        }

        let derived = self.deriver.derive(claimed)?;

        let (policy_claims, filtered) = self.params.filters.apply(derived);
        if self.params.filters.is_active() {
            log::info!(
                "Filters removed {} rows on exposure and {} on total claims",
                filtered.exposure,
                filtered.total_claims
            );
        }

        let sample = self
            .params
            .sample_size
            .map(|size| sample_rows(&policy_claims, size, self.params.seed));

        Ok(Prepared {
            policy_claims,
            validation,
            aggregated_policies: aggregates.len(),
            filtered,
            sample,
        })
    }

    /// Load, prepare and persist every table
    pub fn run(&self) -> Result<RunReport> {
        let policies = load_policies(&self.params.policies_path)?;
        let claims = load_claims(&self.params.claims_path)?;
        let prepared = self.prepare(&policies, &claims)?;

        let sink = DualSink::new(&self.params.output_dir);
        let mut outputs = sink.write(POLICIES_TABLE, &policies)?;
        outputs.extend(sink.write(CLAIMS_TABLE, &claims)?);
        outputs.extend(sink.write(POLICY_CLAIMS_TABLE, &prepared.policy_claims)?);
        if let Some(sample) = &prepared.sample {
            outputs.extend(sink.write(SAMPLE_TABLE, sample)?);
        }

        let report = RunReport {
            generated_at: Utc::now(),
            policies: policies.len(),
            claim_events: claims.len(),
            aggregated_policies: prepared.aggregated_policies,
            policy_claims: prepared.policy_claims.len(),
            summary: DatasetSummary::build(&policies, &claims),
            validation: prepared.validation,
            filtered: prepared.filtered,
            sample_rows: prepared.sample.as_ref().map(Vec::len),
            outputs,
        };

        fs::create_dir_all(&self.params.output_dir)?;
        let report_path = self.params.output_dir.join(REPORT_FILE);
        serde_json::to_writer_pretty(BufWriter::new(File::create(&report_path)?), &report)?;
        log::info!("Run report written to {}", report_path.display());

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyFilters;
    use crate::policy::loader::{DEFAULT_CLAIMS_PATH, DEFAULT_POLICIES_PATH};
    use crate::sink::Table;
    use approx::assert_relative_eq;
    use arrow::array::{Float64Array, StringArray, UInt32Array};
    use arrow::compute::concat_batches;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::path::Path;

    fn fixture() -> (Vec<PolicyRecord>, Vec<ClaimEvent>) {
        (
            load_policies(DEFAULT_POLICIES_PATH).unwrap(),
            load_claims(DEFAULT_CLAIMS_PATH).unwrap(),
        )
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("motor_pricing_run_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn row(prepared: &Prepared, policy_id: u32) -> &PolicyClaim {
        prepared
            .policy_claims
            .iter()
            .find(|r| r.policy_id == policy_id)
            .unwrap()
    }

    #[test]
    fn test_prepare_fixture() {
        let (policies, claims) = fixture();
        let prepared = Pipeline::new(RunParams::default())
            .unwrap()
            .prepare(&policies, &claims)
            .unwrap();

        assert_eq!(prepared.policy_claims.len(), 24);
        assert_eq!(prepared.aggregated_policies, 6);
        assert!(prepared.validation.is_clean());
        assert!(prepared.sample.is_none());
        assert_eq!(prepared.filtered, FilterCounts::default());

        assert_eq!(row(&prepared, 1).total_claims, 0.0);
        assert_eq!(row(&prepared, 17).total_claims, 4046.5);
        assert_relative_eq!(row(&prepared, 5).total_claims, 3438.39, epsilon = 1e-9);

        let p9 = row(&prepared, 9);
        assert_eq!(p9.agg_power, "other");
        assert_eq!(p9.agg_power_2, "i");
        assert_eq!(p9.cat_driver_age, "(22,26]");

        let p20 = row(&prepared, 20);
        assert_eq!(p20.cat_driver_age, "(17,22]");
        assert_eq!(p20.cat_car_age, "[0,1]");

        let p24 = row(&prepared, 24);
        assert_eq!(p24.cat_density, "[0,40]");
        assert_eq!(p24.cat_car_age, "(1,4]");
        assert_eq!(p24.agg_region, "other");
    }

    #[test]
    fn test_zero_fill_for_policies_without_claims() {
        let (policies, claims) = fixture();
        let prepared = Pipeline::new(RunParams::default())
            .unwrap()
            .prepare(&policies, &claims)
            .unwrap();

        let claimed: Vec<u32> = claims.iter().map(|c| c.policy_id).collect();
        for r in prepared.policy_claims.iter().filter(|r| !claimed.contains(&r.policy_id)) {
            assert_eq!(r.total_claims, 0.0);
            assert_eq!(r.claim_count, 0);
        }
    }

    #[test]
    fn test_perturbed_claim_count_is_reported_not_fatal() {
        let (mut policies, claims) = fixture();
        policies[4].claim_count = 1;
        let prepared = Pipeline::new(RunParams::default())
            .unwrap()
            .prepare(&policies, &claims)
            .unwrap();

        assert_eq!(prepared.validation.mismatched_ids(), vec![5]);
        assert_eq!(prepared.policy_claims.len(), 24);
    }

    #[test]
    fn test_orphans_reported_or_fatal() {
        let (policies, mut claims) = fixture();
        claims.push(ClaimEvent { policy_id: 999, claim_amount: 50.0 });

        let prepared = Pipeline::new(RunParams::default())
            .unwrap()
            .prepare(&policies, &claims)
            .unwrap();
        assert_eq!(prepared.validation.orphan_claim_rows(), 1);

        let strict = RunParams {
            fail_on_orphans: true,
            ..RunParams::default()
        };
        assert!(matches!(
            Pipeline::new(strict).unwrap().prepare(&policies, &claims),
            Err(DataError::OrphanClaims { count: 1, first: 999 })
        ));
    }

    #[test]
    fn test_out_of_range_aborts() {
        let (mut policies, claims) = fixture();
        policies[0].driver_age = 16.0;
        assert!(matches!(
            Pipeline::new(RunParams::default()).unwrap().prepare(&policies, &claims),
            Err(DataError::OutOfRange { field: "driver_age", policy_id: 1, .. })
        ));
    }

    #[test]
    fn test_filters() {
        let (policies, claims) = fixture();
        let params = RunParams {
            filters: PolicyFilters {
                max_exposure: Some(1.0),
                max_total_claims: Some(5000.0),
            },
            ..RunParams::default()
        };
        let prepared = Pipeline::new(params).unwrap().prepare(&policies, &claims).unwrap();

        // Policies 14 and 17 exceed one year, policy 12 has a 9844.36 claim
        assert_eq!(prepared.filtered, FilterCounts { exposure: 2, total_claims: 1 });
        assert_eq!(prepared.policy_claims.len(), 21);
    }

    #[test]
    fn test_parallel_aggregation_agrees() {
        let (policies, claims) = fixture();
        let sequential = Pipeline::new(RunParams::default()).unwrap().prepare(&policies, &claims).unwrap();
        let params = RunParams {
            parallel_aggregation: true,
            ..RunParams::default()
        };
        let parallel = Pipeline::new(params).unwrap().prepare(&policies, &claims).unwrap();

        assert_eq!(sequential.validation, parallel.validation);
        for (s, p) in sequential.policy_claims.iter().zip(&parallel.policy_claims) {
            assert_eq!(s.policy_id, p.policy_id);
            assert_relative_eq!(s.total_claims, p.total_claims, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sample_is_reproducible() {
        let (policies, claims) = fixture();
        let params = RunParams {
            sample_size: Some(5),
            seed: 7,
            ..RunParams::default()
        };
        let pipeline = Pipeline::new(params).unwrap();
        let first = pipeline.prepare(&policies, &claims).unwrap().sample.unwrap();
        let second = pipeline.prepare(&policies, &claims).unwrap().sample.unwrap();

        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].policy_id < w[1].policy_id));
    }

    #[test]
    fn test_sample_larger_than_table_takes_everything() {
        let rows: Vec<u32> = (0..4).collect();
        assert_eq!(sample_rows(&rows, 10, 1), rows);
    }

    fn run_into(dir: &Path) -> RunReport {
        let params = RunParams {
            output_dir: dir.to_path_buf(),
            ..RunParams::default()
        };
        Pipeline::new(params).unwrap().run().unwrap()
    }

    #[test]
    fn test_run_writes_tables_and_report() {
        let dir = scratch_dir("report");
        let report = run_into(&dir);

        assert_eq!(report.policies, 24);
        assert_eq!(report.claim_events, 9);
        assert_eq!(report.policy_claims, 24);
        assert_eq!(report.outputs.len(), 6);
        assert!(report.outputs.iter().all(|p| p.exists()));
        assert!(dir.join(REPORT_FILE).exists());

        assert_eq!(report.summary.policies_with_claims, 6);
        assert_eq!(report.summary.exposure_above_one, 2);
        assert_relative_eq!(report.summary.claim_amount.as_ref().unwrap().mean, 19182.16 / 9.0, epsilon = 1e-9);

        let text = fs::read_to_string(dir.join("policy_claims.csv")).unwrap();
        let header = text.lines().next().unwrap();
        let names: Vec<String> = PolicyClaim::schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(header, names.join(","));
        assert!(!header.contains("num_claim"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_filtered_run_reports_loaded_claim_figures() {
        let dir = scratch_dir("filtered");
        let params = RunParams {
            output_dir: dir.clone(),
            filters: PolicyFilters {
                max_exposure: Some(1.0),
                max_total_claims: Some(5000.0),
            },
            ..RunParams::default()
        };
        let report = Pipeline::new(params).unwrap().run().unwrap();

        assert_eq!(report.policy_claims, 21);
        assert_eq!(report.summary.policies, 24);
        // Policies 2, 5, 9, 12, 17 and 21, two of which were filtered out
        assert_eq!(report.summary.policies_with_claims, 6);
        assert_eq!(report.summary.claim_events, 9);

        fs::remove_dir_all(&dir).unwrap();
    }

    fn parquet_batch(path: &Path) -> RecordBatch {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        concat_batches(&batches[0].schema(), &batches).unwrap()
    }

    fn csv_column(path: &Path, name: &str) -> Vec<String> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let index = reader.headers().unwrap().iter().position(|h| h == name).unwrap();
        reader.records().map(|r| r.unwrap()[index].to_string()).collect()
    }

    fn string_column(batch: &RecordBatch, name: &str) -> Vec<String> {
        let column = batch.column_by_name(name).unwrap();
        let values = column.as_any().downcast_ref::<StringArray>().unwrap();
        values.iter().map(|v| v.unwrap().to_string()).collect()
    }

    #[test]
    fn test_parquet_and_csv_hold_the_same_policy_claims() {
        let dir = scratch_dir("formats");
        run_into(&dir);
        let (policies, claims) = fixture();
        let rows = Pipeline::new(RunParams::default()).unwrap().prepare(&policies, &claims).unwrap().policy_claims;

        let batch = parquet_batch(&dir.join("policy_claims.parquet"));
        let csv_path = dir.join("policy_claims.csv");
        assert_eq!(batch.num_rows(), rows.len());

        let ids = batch.column_by_name("policy_id").unwrap().as_any().downcast_ref::<UInt32Array>().unwrap();
        let expected_ids: Vec<u32> = rows.iter().map(|r| r.policy_id).collect();
        assert_eq!(ids.values().to_vec(), expected_ids);

        let totals = batch.column_by_name("total_claims").unwrap().as_any().downcast_ref::<Float64Array>().unwrap();
        let csv_totals: Vec<f64> = csv_column(&csv_path, "total_claims").iter().map(|v| v.parse().unwrap()).collect();
        for ((parquet, csv), row) in totals.values().iter().zip(&csv_totals).zip(&rows) {
            assert_eq!(*parquet, row.total_claims);
            assert_eq!(*csv, row.total_claims);
        }

        for name in ["cat_driver_age", "cat_car_age", "cat_density", "agg_power", "agg_power_2", "agg_region"] {
            assert_eq!(string_column(&batch, name), csv_column(&csv_path, name), "{} differs", name);
        }
        let expected_density: Vec<String> = rows.iter().map(|r| r.cat_density.clone()).collect();
        assert_eq!(string_column(&batch, "cat_density"), expected_density);
        let expected_power_2: Vec<String> = rows.iter().map(|r| r.agg_power_2.to_string()).collect();
        assert_eq!(string_column(&batch, "agg_power_2"), expected_power_2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let first = scratch_dir("idempotent_a");
        let second = scratch_dir("idempotent_b");
        run_into(&first);
        run_into(&second);

        for table in [POLICIES_TABLE, CLAIMS_TABLE, POLICY_CLAIMS_TABLE] {
            for ext in ["csv", "parquet"] {
                let file = format!("{}.{}", table, ext);
                let a = fs::read(first.join(&file)).unwrap();
                let b = fs::read(second.join(&file)).unwrap();
                assert_eq!(a, b, "{} differs between runs", file);
            }
        }

        fs::remove_dir_all(&first).unwrap();
        fs::remove_dir_all(&second).unwrap();
    }
}
