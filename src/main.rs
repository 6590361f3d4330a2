//! Motor pricing data preparation CLI
//!
//! Loads the policy and claims tables, derives the rating factors and writes
//! every table as CSV and Parquet.

use anyhow::{Context, Result};
use clap::Parser;
use motor_pricing_data::{Pipeline, RunParams};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Prepare policy and claims tables for pricing")]
struct Args {
    /// JSON file with run parameters (defaults apply to missing fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Policy table (CSV)
    #[arg(long)]
    policies: Option<PathBuf>,

    /// Claims table (CSV)
    #[arg(long)]
    claims: Option<PathBuf>,

    /// Output directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Seed for the sample table
    #[arg(long)]
    seed: Option<u64>,

    /// Write a sample of this many policy-claim rows
    #[arg(long)]
    sample: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut params = match &args.config {
        Some(path) => RunParams::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => RunParams::default(),
    };
    if let Some(path) = args.policies {
        params.policies_path = path;
    }
    if let Some(path) = args.claims {
        params.claims_path = path;
    }
    if let Some(dir) = args.output {
        params.output_dir = dir;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if args.sample.is_some() {
        params.sample_size = args.sample;
    }

    println!("Motor Pricing Data v{}", env!("CARGO_PKG_VERSION"));
    println!("=======================\n");
    println!("Policies: {}", params.policies_path.display());
    println!("Claims:   {}", params.claims_path.display());
    println!("Output:   {}\n", params.output_dir.display());

    let pipeline = Pipeline::new(params).context("Invalid feature configuration")?;
    let report = pipeline.run().context("Preparation run failed")?;

    println!("Loaded {} policies and {} claim events", report.policies, report.claim_events);
    println!("  Policies with claims: {}", report.aggregated_policies);
    println!("  Policy-claim rows:    {}", report.policy_claims);
    if let Some(rows) = report.sample_rows {
        println!("  Sample rows:          {}", rows);
    }
    if report.filtered.exposure + report.filtered.total_claims > 0 {
        println!(
            "  Filtered out:         {} (exposure) + {} (total claims)",
            report.filtered.exposure, report.filtered.total_claims
        );
    }

    let validation = &report.validation;
    if validation.is_clean() {
        println!("\nValidation: claim counts match claim events");
    } else {
        println!("\nValidation anomalies:");
        for m in &validation.mismatches {
            println!(
                "  Policy {:>8}: claim_count={} claim events={}",
                m.policy_id, m.claim_count, m.num_claim
            );
        }
        if !validation.orphans.is_empty() {
            println!(
                "  {} claim events reference {} unknown policies",
                validation.orphan_claim_rows(),
                validation.orphans.len()
            );
        }
    }

    println!("\nFiles written:");
    for path in &report.outputs {
        println!("  {}", path.display());
    }

    Ok(())
}
