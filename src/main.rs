//! Underwriting Engine CLI
//!
//! Quotes a single applicant against one carrier/product target from the
//! command line. Without an answers file it runs a built-in demo applicant.

use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;

use underwriting_engine::{
    ApplicantProfile, DecisionEngine, EngineConfig, EngineSnapshot, FieldValue, Gender,
    QuoteRequest, TobaccoClass,
};

#[derive(Debug, Parser)]
#[command(name = "underwriting_engine", about = "Underwriting decision engine")]
struct Args {
    /// Data directory holding catalog/, rules/, and rates/
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, default_value_t = 1)]
    carrier: u64,

    #[arg(long, default_value_t = 101)]
    product: u64,

    #[arg(long, default_value_t = 45)]
    age: u8,

    /// male or female
    #[arg(long, default_value = "male")]
    gender: String,

    /// non_tobacco, tobacco, or preferred_non_tobacco
    #[arg(long, default_value = "non_tobacco")]
    tobacco: String,

    #[arg(long, default_value_t = 100_000)]
    face_amount: u64,

    /// Term length in years; omit for permanent products
    #[arg(long)]
    term: Option<u16>,

    /// JSON file of condition answers: {"diabetes_type_2": {"a1c": 7.2}}
    #[arg(long)]
    answers: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    println!("Underwriting Engine v0.1.0");
    println!("==========================\n");

    let snapshot = EngineSnapshot::load_from_dir(&args.data_dir)
        .map_err(|e| anyhow::anyhow!("failed to load snapshot from {:?}: {}", args.data_dir, e))?;
    println!(
        "Loaded {} conditions, {} products, {} rule sets, {} rate products",
        snapshot.catalog.len(),
        snapshot.products.len(),
        snapshot.rule_sets.len(),
        snapshot.rates.len()
    );

    let gender = match args.gender.as_str() {
        "male" => Gender::Male,
        "female" => Gender::Female,
        other => anyhow::bail!("unknown gender: {}", other),
    };
    let tobacco = match args.tobacco.as_str() {
        "non_tobacco" => TobaccoClass::NonTobacco,
        "tobacco" => TobaccoClass::Tobacco,
        "preferred_non_tobacco" => TobaccoClass::PreferredNonTobacco,
        other => anyhow::bail!("unknown tobacco class: {}", other),
    };

    let mut profile = ApplicantProfile::new(args.age, gender, tobacco);
    match &args.answers {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            let answers: BTreeMap<String, BTreeMap<String, FieldValue>> =
                serde_json::from_reader(file)?;
            profile.answers = answers;
        }
        None => {
            // Demo applicant: controlled type 2 diabetic
            profile.answer("diabetes_type_2", "a1c", FieldValue::Number(7.8));
            profile.answer("diabetes_type_2", "insulin_use", FieldValue::Bool(false));
        }
    }

    println!("\nApplicant:");
    println!("  Age: {}", profile.age);
    println!("  Gender: {:?}", profile.gender);
    println!("  Tobacco: {:?}", profile.tobacco);
    for (code, answers) in &profile.answers {
        println!("  Condition: {} ({} answers)", code, answers.len());
    }

    let engine = DecisionEngine::new(snapshot, EngineConfig::default());
    let request = QuoteRequest {
        carrier_id: args.carrier,
        product_id: args.product,
        face_amount: args.face_amount,
        term_years: args.term,
    };

    println!(
        "\nQuoting carrier {} product {} at ${} face{}...\n",
        request.carrier_id,
        request.product_id,
        request.face_amount,
        request
            .term_years
            .map(|t| format!(", {} year term", t))
            .unwrap_or_default()
    );

    match engine.quote(&profile, &request) {
        Ok(quote) => {
            let outcome = &quote.decision.outcome;
            println!("Decision:");
            println!("  Eligibility:  {:?}", outcome.eligibility);
            println!(
                "  Health class: {}",
                outcome
                    .health_class
                    .map(|hc| hc.label().to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
            println!("  Table rating: {:?}", outcome.table_rating);
            if let Some(extra) = outcome.flat_extra_per_thousand {
                println!(
                    "  Flat extra:   ${:.2}/thousand for {} years",
                    extra,
                    outcome.flat_extra_years.unwrap_or(1)
                );
            }
            for reason in &outcome.reasons {
                println!("  Reason:       {}", reason);
            }
            for concern in &outcome.concerns {
                println!("  Concern:      {}", concern);
            }

            println!("\nMatched rules:");
            for finding in &quote.decision.findings {
                match &finding.source {
                    Some(source) => println!(
                        "  [{}] {} (rule set {}, {:?} scope)",
                        finding.condition_code.as_deref().unwrap_or("screen"),
                        source.rule_name,
                        source.rule_set_id,
                        source.scope
                    ),
                    None => println!(
                        "  [{}] default outcome",
                        finding.condition_code.as_deref().unwrap_or("screen")
                    ),
                }
            }

            match quote.monthly_premium {
                Some(premium) => println!("\nMonthly premium: ${:.2}", premium),
                None => println!("\nNo premium quoted (not eligible)"),
            }
        }
        Err(err) => {
            println!("Quote failed: {}", err);
        }
    }

    Ok(())
}
