//! Print descriptive statistics and one-way tables of the prepared data
//!
//! Usage: cargo run --bin summarize [policies.csv] [claims.csv]

use anyhow::{Context, Result};
use motor_pricing_data::policy::loader::{DEFAULT_CLAIMS_PATH, DEFAULT_POLICIES_PATH};
use motor_pricing_data::policy::{load_claims, load_policies};
use motor_pricing_data::summary::{DatasetSummary, DescriptiveStats, Dimension, OneWayTable};
use motor_pricing_data::{Pipeline, RunParams};
use std::env;

/// Exposure share below which a level is flagged as thin
const THIN_SHARE: f64 = 0.05;

fn print_stats(name: &str, stats: &Option<DescriptiveStats>) {
    match stats {
        Some(s) => println!(
            "  {:<14} {:>8} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
            name, s.count, s.min, s.median, s.mean, s.max, s.std_dev
        ),
        None => println!("  {:<14} (no data)", name),
    }
}

fn print_one_way(table: &OneWayTable) {
    println!("\n{}", table.dimension.name());
    println!(
        "  {:<36} {:>8} {:>12} {:>8} {:>10} {:>12}",
        "Level", "Policies", "Exposure", "Claims", "Frequency", "Severity"
    );
    for (level, s) in &table.levels {
        let severity = s
            .severity()
            .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
        println!(
            "  {:<36} {:>8} {:>12.2} {:>8} {:>10.4} {:>12}",
            level,
            s.policies,
            s.exposure,
            s.claims,
            s.frequency(),
            severity
        );
    }
    let thin = table.thin_levels(THIN_SHARE);
    if !thin.is_empty() {
        println!("  Thin levels (< {:.0}% of exposure): {}", THIN_SHARE * 100.0, thin.join(", "));
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let policies_path = args.next().unwrap_or_else(|| DEFAULT_POLICIES_PATH.to_string());
    let claims_path = args.next().unwrap_or_else(|| DEFAULT_CLAIMS_PATH.to_string());

    let policies = load_policies(&policies_path)
        .with_context(|| format!("Failed to load policies from {}", policies_path))?;
    let claims = load_claims(&claims_path)
        .with_context(|| format!("Failed to load claims from {}", claims_path))?;

    let pipeline = Pipeline::new(RunParams::default())?;
    let prepared = pipeline.prepare(&policies, &claims)?;
    let summary = DatasetSummary::build(&policies, &claims);

    println!("Dataset Summary:");
    println!("  Policies:             {}", summary.policies);
    println!("  Claim events:         {}", summary.claim_events);
    println!("  Policies with claims: {}", summary.policies_with_claims);
    println!("  Exposure > 1 year:    {}", summary.exposure_above_one);
    println!("  Total exposure:       {:.2}", summary.total_exposure);
    println!("  Claim frequency:      {:.4}", summary.frequency);
    match summary.severity {
        Some(severity) => println!("  Claim severity:       {:.2}", severity),
        None => println!("  Claim severity:       -"),
    }

    println!(
        "\n  {:<14} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Column", "Count", "Min", "Median", "Mean", "Max", "StdDev"
    );
    print_stats("exposure", &summary.exposure);
    print_stats("car_age", &summary.car_age);
    print_stats("driver_age", &summary.driver_age);
    print_stats("density", &summary.density);
    print_stats("claim_amount", &summary.claim_amount);

    for dimension in Dimension::ALL {
        print_one_way(&OneWayTable::build(&prepared.policy_claims, dimension));
    }

    if !prepared.validation.is_clean() {
        println!(
            "\nValidation: {} count mismatches, {} orphan claim events",
            prepared.validation.mismatches.len(),
            prepared.validation.orphan_claim_rows()
        );
    }

    Ok(())
}
