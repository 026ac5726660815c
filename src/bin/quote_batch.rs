//! Quote an entire batch of applicants against one product
//!
//! Loads applicants from data/applicants.json, quotes them in parallel, and
//! writes per-applicant results plus a summary to CSV.

use rayon::prelude::*;
use serde::Deserialize;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

use underwriting_engine::{
    ApplicantProfile, DecisionEngine, Eligibility, EngineConfig, EngineSnapshot, QuoteRequest,
};

/// One applicant in the batch file
#[derive(Debug, Deserialize)]
struct BatchApplicant {
    applicant_id: u64,
    #[serde(flatten)]
    profile: ApplicantProfile,
    request: QuoteRequest,
}

/// Flattened result row for the output CSV
#[derive(Debug)]
struct ResultRow {
    applicant_id: u64,
    eligibility: Eligibility,
    health_class: String,
    table_units: u8,
    monthly_premium: Option<f64>,
    note: String,
}

fn main() {
    env_logger::init();

    let start = Instant::now();
    println!("Loading snapshot from data/...");

    let snapshot = EngineSnapshot::load_from_dir(std::path::Path::new("data"))
        .expect("Failed to load snapshot");
    println!(
        "Loaded {} rule sets and rates for {} products in {:?}",
        snapshot.rule_sets.len(),
        snapshot.rates.len(),
        start.elapsed()
    );

    let file = File::open("data/applicants.json").expect("Failed to open applicants file");
    let applicants: Vec<BatchApplicant> =
        serde_json::from_reader(file).expect("Failed to parse applicants");
    println!("Loaded {} applicants", applicants.len());

    let engine = DecisionEngine::new(snapshot, EngineConfig::default());

    println!("Running quotes...");
    let quote_start = Instant::now();

    // Each quote is independent and the engine is immutable, so the batch
    // parallelizes with no locking
    let results: Vec<ResultRow> = applicants
        .par_iter()
        .map(|applicant| match engine.quote(&applicant.profile, &applicant.request) {
            Ok(quote) => ResultRow {
                applicant_id: applicant.applicant_id,
                eligibility: quote.decision.outcome.eligibility,
                health_class: quote
                    .decision
                    .outcome
                    .health_class
                    .map(|hc| hc.label().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                table_units: quote.decision.outcome.table_rating.units(),
                monthly_premium: quote.monthly_premium,
                note: quote.decision.outcome.reasons.join(" | "),
            },
            Err(err) => ResultRow {
                applicant_id: applicant.applicant_id,
                eligibility: Eligibility::Refer,
                health_class: "-".to_string(),
                table_units: 0,
                monthly_premium: None,
                note: err.to_string(),
            },
        })
        .collect();

    println!("Quotes complete in {:?}", quote_start.elapsed());

    // Write output
    let output_path = "quote_batch_output.csv";
    let mut file = File::create(output_path).expect("Failed to create output file");

    writeln!(
        file,
        "ApplicantID,Eligibility,HealthClass,TableUnits,MonthlyPremium,Note"
    )
    .unwrap();

    for row in &results {
        writeln!(
            file,
            "{},{:?},{},{},{},{}",
            row.applicant_id,
            row.eligibility,
            row.health_class,
            row.table_units,
            row.monthly_premium
                .map(|p| format!("{:.2}", p))
                .unwrap_or_default(),
            row.note.replace(',', ";"),
        )
        .unwrap();
    }

    println!("Output written to {}", output_path);

    // Print summary stats
    let accepted = results
        .iter()
        .filter(|r| r.eligibility == Eligibility::Accept)
        .count();
    let referred = results
        .iter()
        .filter(|r| r.eligibility == Eligibility::Refer)
        .count();
    let declined = results
        .iter()
        .filter(|r| r.eligibility == Eligibility::Decline)
        .count();
    let priced: Vec<f64> = results.iter().filter_map(|r| r.monthly_premium).collect();

    println!("\nBatch Summary:");
    println!("  Accepted: {}", accepted);
    println!("  Referred: {}", referred);
    println!("  Declined: {}", declined);
    if !priced.is_empty() {
        let total: f64 = priced.iter().sum();
        println!(
            "  Priced:   {} (avg ${:.2}/month)",
            priced.len(),
            total / priced.len() as f64
        );
    }

    println!("\nTotal time: {:?}", start.elapsed());
}
