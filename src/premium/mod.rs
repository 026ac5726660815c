//! Premium rate resolution: sparse age x face-amount grids per
//! classification, interpolation for missing cells, and rating loads

mod interpolate;
mod matrix;
pub mod loader;

pub use matrix::{
    rated_monthly_premium, PremiumBook, PremiumMatrix, RateClass, RateEntry, RateGrid,
    TABLE_LOAD_PER_UNIT,
};
