//! Carrier product reference data

use serde::{Deserialize, Serialize};

/// Product line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    TermLife,
    WholeLife,
    UniversalLife,
    IndexedUniversalLife,
}

impl ProductType {
    /// Term products carry a term-years axis in the rate grid; permanent
    /// products store `term_years = None`.
    pub fn is_term(&self) -> bool {
        matches!(self, ProductType::TermLife)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductType::TermLife => "Term Life",
            ProductType::WholeLife => "Whole Life",
            ProductType::UniversalLife => "Universal Life",
            ProductType::IndexedUniversalLife => "Indexed Universal Life",
        }
    }
}

/// A carrier's product as configured by administrators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: u64,
    pub carrier_id: u64,
    pub name: String,
    pub product_type: ProductType,

    /// Inclusive issue-age window; feeds the age-rule generator
    pub min_issue_age: u8,
    pub max_issue_age: u8,

    /// Offered term lengths in years (empty for permanent products)
    #[serde(default)]
    pub term_options: Vec<u16>,
}

impl ProductInfo {
    /// Whether an age falls inside the issue window
    pub fn issuable_at(&self, age: u8) -> bool {
        age >= self.min_issue_age && age <= self.max_issue_age
    }

    /// Whether the requested term is offered
    ///
    /// Permanent products accept only `None`; term products accept any
    /// configured term length.
    pub fn allows_term(&self, term_years: Option<u16>) -> bool {
        match term_years {
            None => !self.product_type.is_term(),
            Some(t) => self.term_options.contains(&t),
        }
    }
}
