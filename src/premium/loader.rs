//! Load premium rate grids from a flat CSV
//!
//! One row per cell; rows are grouped by (product, classification) and
//! written through `bulk_upsert`, so a malformed file fails without leaving a
//! partially-loaded book.

use super::{PremiumBook, RateClass, RateEntry};
use crate::applicant::{Gender, TobaccoClass};
use crate::rules::HealthClass;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;
use std::path::Path;

/// Default path to rate data
pub const DEFAULT_RATES_PATH: &str = "data/rates";

/// Raw CSV row matching premium_rates.csv columns
#[derive(Debug, serde::Deserialize)]
struct RateRow {
    #[serde(rename = "ProductID")]
    product_id: u64,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "TobaccoClass")]
    tobacco_class: String,
    #[serde(rename = "HealthClass")]
    health_class: String,
    #[serde(rename = "TermYears")]
    term_years: Option<u16>,
    #[serde(rename = "Age")]
    age: u8,
    #[serde(rename = "FaceAmount")]
    face_amount: u64,
    #[serde(rename = "MonthlyPremium")]
    monthly_premium: f64,
}

impl RateRow {
    fn to_keyed_entry(self) -> Result<(u64, RateClass, RateEntry), Box<dyn Error>> {
        let gender = match self.gender.as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            other => return Err(format!("Unknown Gender: {}", other).into()),
        };

        let tobacco = match self.tobacco_class.as_str() {
            "non_tobacco" => TobaccoClass::NonTobacco,
            "tobacco" => TobaccoClass::Tobacco,
            "preferred_non_tobacco" => TobaccoClass::PreferredNonTobacco,
            other => return Err(format!("Unknown TobaccoClass: {}", other).into()),
        };

        let health_class = match self.health_class.as_str() {
            "preferred_plus" => HealthClass::PreferredPlus,
            "preferred" => HealthClass::Preferred,
            "standard_plus" => HealthClass::StandardPlus,
            "standard" => HealthClass::Standard,
            "substandard" => HealthClass::Substandard,
            other => return Err(format!("Unknown HealthClass: {}", other).into()),
        };

        let class = RateClass {
            gender,
            tobacco,
            health_class,
            term_years: self.term_years,
        };
        let entry = RateEntry {
            age: self.age,
            face_amount: self.face_amount,
            monthly_premium: self.monthly_premium,
        };
        Ok((self.product_id, class, entry))
    }
}

/// Load the premium book from `premium_rates.csv`
pub fn load_premium_book(dir: &Path) -> Result<PremiumBook, Box<dyn Error>> {
    let file = File::open(dir.join("premium_rates.csv"))?;
    load_premium_book_from_reader(file)
}

/// Load a premium book from any reader
pub fn load_premium_book_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<PremiumBook, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    // Group rows into per-classification batches first so each batch goes
    // through the same atomic validation as rate-entry tooling
    let mut batches: BTreeMap<(u64, RateClass), Vec<RateEntry>> = BTreeMap::new();
    for result in csv_reader.deserialize() {
        let row: RateRow = result?;
        let (product_id, class, entry) = row.to_keyed_entry()?;
        batches.entry((product_id, class)).or_default().push(entry);
    }

    let mut book = PremiumBook::new();
    for ((product_id, class), entries) in batches {
        book.matrix_mut(product_id).bulk_upsert(class, &entries)?;
    }

    Ok(book)
}
