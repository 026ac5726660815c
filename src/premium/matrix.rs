//! Sparse premium rate storage: classification keys, grids, and atomic
//! bulk upsert

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::applicant::{Gender, TobaccoClass};
use crate::error::UnderwritingError;
use crate::rules::HealthClass;

/// Premium multiplier per table rating unit (table A adds 25%, B adds 50%, ...)
pub const TABLE_LOAD_PER_UNIT: f64 = 0.25;

/// Rate classification: one grid per combination
///
/// `term_years` is `None` for permanent products; term and permanent rates
/// never mix, and no interpolation happens across term lengths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RateClass {
    pub gender: Gender,
    pub tobacco: TobaccoClass,
    pub health_class: HealthClass,
    pub term_years: Option<u16>,
}

/// One cell of a rate grid, the bulk-upsert unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub age: u8,
    pub face_amount: u64,
    pub monthly_premium: f64,
}

/// Sparse (age, face amount) -> monthly premium grid for one classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateGrid {
    cells: BTreeMap<(u8, u64), f64>,
}

impl RateGrid {
    pub fn get(&self, age: u8, face_amount: u64) -> Option<f64> {
        self.cells.get(&(age, face_amount)).copied()
    }

    pub(crate) fn insert(&mut self, age: u8, face_amount: u64, premium: f64) {
        self.cells.insert((age, face_amount), premium);
    }

    /// Distinct populated ages, ascending
    pub fn ages(&self) -> Vec<u8> {
        let set: BTreeSet<u8> = self.cells.keys().map(|(age, _)| *age).collect();
        set.into_iter().collect()
    }

    /// Distinct populated face amounts, ascending
    pub fn faces(&self) -> Vec<u64> {
        let set: BTreeSet<u64> = self.cells.keys().map(|(_, face)| *face).collect();
        set.into_iter().collect()
    }

    /// Populated face amounts at one age, ascending
    pub fn faces_at_age(&self, age: u8) -> Vec<u64> {
        self.cells
            .keys()
            .filter(|(a, _)| *a == age)
            .map(|(_, face)| *face)
            .collect()
    }

    /// Populated ages at one face amount, ascending
    pub fn ages_at_face(&self, face_amount: u64) -> Vec<u8> {
        let set: BTreeSet<u8> = self
            .cells
            .keys()
            .filter(|(_, f)| *f == face_amount)
            .map(|(age, _)| *age)
            .collect();
        set.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// All rate grids for one product, keyed by classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumMatrix {
    product_id: u64,
    grids: BTreeMap<RateClass, RateGrid>,
}

impl PremiumMatrix {
    pub fn new(product_id: u64) -> Self {
        Self {
            product_id,
            grids: BTreeMap::new(),
        }
    }

    pub fn product_id(&self) -> u64 {
        self.product_id
    }

    pub fn grid(&self, class: &RateClass) -> Option<&RateGrid> {
        self.grids.get(class)
    }

    /// Classifications with at least one stored cell
    pub fn classes(&self) -> impl Iterator<Item = &RateClass> {
        self.grids.keys()
    }

    /// Replace/create cells for one classification, all-or-nothing
    ///
    /// The whole batch is validated before any write: every premium must be
    /// strictly positive and finite, and no (age, face) cell may repeat
    /// within the batch. A failed batch leaves the grid untouched. Returns
    /// the number of cells written.
    pub fn bulk_upsert(
        &mut self,
        class: RateClass,
        entries: &[RateEntry],
    ) -> Result<usize, UnderwritingError> {
        if entries.is_empty() {
            return Err(UnderwritingError::Validation(
                "rate batch is empty".to_string(),
            ));
        }

        let mut seen: BTreeSet<(u8, u64)> = BTreeSet::new();
        for entry in entries {
            if !entry.monthly_premium.is_finite() || entry.monthly_premium <= 0.0 {
                return Err(UnderwritingError::Validation(format!(
                    "premium must be positive: age {} face {} has {}",
                    entry.age, entry.face_amount, entry.monthly_premium
                )));
            }
            if !seen.insert((entry.age, entry.face_amount)) {
                return Err(UnderwritingError::Validation(format!(
                    "duplicate cell in batch: age {} face {}",
                    entry.age, entry.face_amount
                )));
            }
        }

        let grid = self.grids.entry(class).or_default();
        for entry in entries {
            grid.insert(entry.age, entry.face_amount, entry.monthly_premium);
        }
        Ok(entries.len())
    }

    /// Total stored cells across all classifications
    pub fn len(&self) -> usize {
        self.grids.values().map(RateGrid::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.values().all(RateGrid::is_empty)
    }
}

/// Premium matrices for all products
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PremiumBook {
    matrices: BTreeMap<u64, PremiumMatrix>,
}

impl PremiumBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, product_id: u64) -> Option<&PremiumMatrix> {
        self.matrices.get(&product_id)
    }

    /// Get or create the matrix for a product
    pub fn matrix_mut(&mut self, product_id: u64) -> &mut PremiumMatrix {
        self.matrices
            .entry(product_id)
            .or_insert_with(|| PremiumMatrix::new(product_id))
    }

    /// Lookup with interpolation; unknown products are `OutOfRange`
    pub fn lookup(
        &self,
        product_id: u64,
        class: &RateClass,
        age: u8,
        face_amount: u64,
    ) -> Result<f64, UnderwritingError> {
        let matrix = self.get(product_id).ok_or_else(|| {
            UnderwritingError::OutOfRange(format!("no rates stored for product {}", product_id))
        })?;
        matrix.lookup(class, age, face_amount)
    }

    pub fn product_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.matrices.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

/// Apply rating loads to a base monthly premium
///
/// Table rating loads the base by 25% per unit; the flat extra is an annual
/// charge per $1,000 of face amount, prorated monthly.
pub fn rated_monthly_premium(
    base_monthly: f64,
    table_units: u8,
    flat_extra_per_thousand: Option<f64>,
    face_amount: u64,
) -> f64 {
    let rated = base_monthly * (1.0 + TABLE_LOAD_PER_UNIT * table_units as f64);
    let flat_extra = flat_extra_per_thousand.unwrap_or(0.0) * (face_amount as f64 / 1000.0) / 12.0;
    rated + flat_extra
}
