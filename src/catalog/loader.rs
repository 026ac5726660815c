//! Reference-data loaders for the condition catalog and product list
//!
//! Conditions carry a nested question schema and load from JSON; products are
//! flat and load from CSV.

use super::{ConditionCatalog, HealthCondition, ProductInfo, ProductType};
use std::error::Error;
use std::fs::File;
use std::path::Path;

/// Default path to catalog reference data
pub const DEFAULT_CATALOG_PATH: &str = "data/catalog";

/// Load the condition catalog from `conditions.json`
pub fn load_conditions(dir: &Path) -> Result<ConditionCatalog, Box<dyn Error>> {
    let file = File::open(dir.join("conditions.json"))?;
    load_conditions_from_reader(file)
}

/// Load the condition catalog from any reader (e.g. string buffer)
pub fn load_conditions_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<ConditionCatalog, Box<dyn Error>> {
    let conditions: Vec<HealthCondition> = serde_json::from_reader(reader)?;
    Ok(ConditionCatalog::from_conditions(conditions)?)
}

/// Raw CSV row matching products.csv columns
#[derive(Debug, serde::Deserialize)]
struct ProductRow {
    #[serde(rename = "ProductID")]
    product_id: u64,
    #[serde(rename = "CarrierID")]
    carrier_id: u64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ProductType")]
    product_type: String,
    #[serde(rename = "MinIssueAge")]
    min_issue_age: u8,
    #[serde(rename = "MaxIssueAge")]
    max_issue_age: u8,
    #[serde(rename = "TermOptions")]
    term_options: String,
}

impl ProductRow {
    fn to_product(self) -> Result<ProductInfo, Box<dyn Error>> {
        let product_type = match self.product_type.as_str() {
            "term_life" => ProductType::TermLife,
            "whole_life" => ProductType::WholeLife,
            "universal_life" => ProductType::UniversalLife,
            "indexed_universal_life" => ProductType::IndexedUniversalLife,
            other => return Err(format!("Unknown ProductType: {}", other).into()),
        };

        // TermOptions is a pipe-separated list, empty for permanent products
        let mut term_options = Vec::new();
        for part in self.term_options.split('|').filter(|p| !p.is_empty()) {
            term_options.push(part.trim().parse::<u16>()?);
        }

        Ok(ProductInfo {
            id: self.product_id,
            carrier_id: self.carrier_id,
            name: self.name,
            product_type,
            min_issue_age: self.min_issue_age,
            max_issue_age: self.max_issue_age,
            term_options,
        })
    }
}

/// Load all products from `products.csv`
pub fn load_products(dir: &Path) -> Result<Vec<ProductInfo>, Box<dyn Error>> {
    let file = File::open(dir.join("products.csv"))?;
    load_products_from_reader(file)
}

/// Load products from any reader
pub fn load_products_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<ProductInfo>, Box<dyn Error>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut products = Vec::new();

    for result in csv_reader.deserialize() {
        let row: ProductRow = result?;
        products.push(row.to_product()?);
    }

    Ok(products)
}
