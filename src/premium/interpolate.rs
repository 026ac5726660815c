//! Premium grid lookup with linear and bilinear interpolation
//!
//! The grid axes (age, face amount) are ordered, finite, and sparse. Lookup
//! resolves, in order: exact cell; linear interpolation along one axis when
//! the other is exactly populated; bilinear interpolation over the four
//! surrounding populated corners. A query outside the populated range on
//! either axis, or inside it but without the cells interpolation needs,
//! fails with `OutOfRange`. Extrapolated premiums are a pricing risk this
//! module never produces.

use crate::error::UnderwritingError;
use crate::premium::matrix::{PremiumMatrix, RateClass, RateGrid};

/// Linear interpolation between (x0, y0) and (x1, y1)
fn lerp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Bracketing values in a sorted slice: `Some((lo, hi))` with
/// `lo <= target <= hi` (lo == hi on exact hit), `None` outside the range
fn bracket<T: Copy + Ord>(sorted: &[T], target: T) -> Option<(T, T)> {
    let first = *sorted.first()?;
    let last = *sorted.last()?;
    if target < first || target > last {
        return None;
    }

    match sorted.binary_search(&target) {
        Ok(_) => Some((target, target)),
        Err(idx) => Some((sorted[idx - 1], sorted[idx])),
    }
}

impl PremiumMatrix {
    /// Look up a monthly premium, interpolating missing cells
    pub fn lookup(
        &self,
        class: &RateClass,
        age: u8,
        face_amount: u64,
    ) -> Result<f64, UnderwritingError> {
        let grid = self.grid(class).ok_or_else(|| {
            UnderwritingError::OutOfRange(format!(
                "no rates stored for product {} classification {:?}/{:?}/{:?}/term {:?}",
                self.product_id(),
                class.gender,
                class.tobacco,
                class.health_class,
                class.term_years
            ))
        })?;

        grid.lookup(age, face_amount)
    }
}

impl RateGrid {
    /// Grid-level lookup; see the module docs for the resolution order
    pub fn lookup(&self, age: u8, face_amount: u64) -> Result<f64, UnderwritingError> {
        if let Some(premium) = self.get(age, face_amount) {
            return Ok(premium);
        }
        if self.is_empty() {
            return Err(UnderwritingError::OutOfRange(
                "rate grid is empty".to_string(),
            ));
        }

        let ages = self.ages();
        let faces = self.faces();

        let (age_lo, age_hi) = bracket(&ages, age).ok_or_else(|| {
            UnderwritingError::OutOfRange(format!(
                "age {} outside populated range {}..{}",
                age,
                ages.first().unwrap(),
                ages.last().unwrap()
            ))
        })?;
        let (face_lo, face_hi) = bracket(&faces, face_amount).ok_or_else(|| {
            UnderwritingError::OutOfRange(format!(
                "face amount {} outside populated range {}..{}",
                face_amount,
                faces.first().unwrap(),
                faces.last().unwrap()
            ))
        })?;

        // Age exactly populated: interpolate along face amount within that row
        if age_lo == age_hi {
            if let Some(premium) = self.lerp_face_at_age(age, face_amount) {
                return Ok(premium);
            }
        }

        // Face exactly populated: interpolate along age within that column
        if face_lo == face_hi {
            if let Some(premium) = self.lerp_age_at_face(face_amount, age) {
                return Ok(premium);
            }
        }

        // Both between: bilinear over the four surrounding corners
        let corners = [
            self.get(age_lo, face_lo),
            self.get(age_lo, face_hi),
            self.get(age_hi, face_lo),
            self.get(age_hi, face_hi),
        ];
        match corners {
            [Some(q11), Some(q12), Some(q21), Some(q22)] => {
                let face = face_amount as f64;
                let r1 = lerp(face, face_lo as f64, face_hi as f64, q11, q12);
                let r2 = lerp(face, face_lo as f64, face_hi as f64, q21, q22);
                Ok(lerp(age as f64, age_lo as f64, age_hi as f64, r1, r2))
            }
            _ => Err(UnderwritingError::OutOfRange(format!(
                "insufficient surrounding rates near age {} face {}",
                age, face_amount
            ))),
        }
    }

    /// Linear interpolation along face amount at one populated age
    fn lerp_face_at_age(&self, age: u8, face_amount: u64) -> Option<f64> {
        let row = self.faces_at_age(age);
        let (lo, hi) = bracket(&row, face_amount)?;
        let y0 = self.get(age, lo)?;
        let y1 = self.get(age, hi)?;
        Some(lerp(face_amount as f64, lo as f64, hi as f64, y0, y1))
    }

    /// Linear interpolation along age at one populated face amount
    fn lerp_age_at_face(&self, face_amount: u64, age: u8) -> Option<f64> {
        let column = self.ages_at_face(face_amount);
        let (lo, hi) = bracket(&column, age)?;
        let y0 = self.get(lo, face_amount)?;
        let y1 = self.get(hi, face_amount)?;
        Some(lerp(age as f64, lo as f64, hi as f64, y0, y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::{Gender, TobaccoClass};
    use crate::premium::matrix::RateEntry;
    use crate::rules::HealthClass;
    use approx::assert_relative_eq;

    fn class() -> RateClass {
        RateClass {
            gender: Gender::Female,
            tobacco: TobaccoClass::NonTobacco,
            health_class: HealthClass::Preferred,
            term_years: None,
        }
    }

    fn matrix_with(entries: &[RateEntry]) -> PremiumMatrix {
        let mut matrix = PremiumMatrix::new(101);
        matrix.bulk_upsert(class(), entries).unwrap();
        matrix
    }

    #[test]
    fn test_exact_match() {
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 50.0 },
        ]);
        assert_relative_eq!(matrix.lookup(&class(), 40, 100_000).unwrap(), 50.0);
    }

    #[test]
    fn test_linear_midpoint_on_age() {
        // (40, 100k) = 50 and (50, 100k) = 70 must give (45, 100k) = 60
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 50.0 },
            RateEntry { age: 50, face_amount: 100_000, monthly_premium: 70.0 },
        ]);
        assert_relative_eq!(matrix.lookup(&class(), 45, 100_000).unwrap(), 60.0);

        // Off-midpoint interpolation
        assert_relative_eq!(matrix.lookup(&class(), 42, 100_000).unwrap(), 54.0);
    }

    #[test]
    fn test_linear_interpolation_on_face() {
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 50.0 },
            RateEntry { age: 40, face_amount: 200_000, monthly_premium: 90.0 },
        ]);
        assert_relative_eq!(matrix.lookup(&class(), 40, 150_000).unwrap(), 70.0);
    }

    #[test]
    fn test_bilinear_center() {
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 40.0 },
            RateEntry { age: 40, face_amount: 200_000, monthly_premium: 80.0 },
            RateEntry { age: 50, face_amount: 100_000, monthly_premium: 60.0 },
            RateEntry { age: 50, face_amount: 200_000, monthly_premium: 120.0 },
        ]);

        // Center of the square: mean of row-wise interpolations (60 and 90)
        assert_relative_eq!(matrix.lookup(&class(), 45, 150_000).unwrap(), 75.0);
    }

    #[test]
    fn test_out_of_range_rejected_below_and_above() {
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 50.0 },
            RateEntry { age: 50, face_amount: 100_000, monthly_premium: 70.0 },
        ]);

        // Below minimum populated age: never extrapolate
        let err = matrix.lookup(&class(), 35, 100_000).unwrap_err();
        assert!(matches!(err, UnderwritingError::OutOfRange(_)));

        let err = matrix.lookup(&class(), 55, 100_000).unwrap_err();
        assert!(matches!(err, UnderwritingError::OutOfRange(_)));

        let err = matrix.lookup(&class(), 45, 250_000).unwrap_err();
        assert!(matches!(err, UnderwritingError::OutOfRange(_)));
    }

    #[test]
    fn test_sparse_hole_rejected() {
        // Three corners of a square: bilinear has insufficient data
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 40.0 },
            RateEntry { age: 40, face_amount: 200_000, monthly_premium: 80.0 },
            RateEntry { age: 50, face_amount: 100_000, monthly_premium: 60.0 },
        ]);

        let err = matrix.lookup(&class(), 45, 150_000).unwrap_err();
        assert!(matches!(
            err,
            UnderwritingError::OutOfRange(msg) if msg.contains("insufficient")
        ));
    }

    #[test]
    fn test_row_interpolation_uses_row_brackets() {
        // Age 40 has faces {100k, 300k}; 200k is populated only at age 50.
        // The age-40 row interpolates between its own populated faces.
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 40.0 },
            RateEntry { age: 40, face_amount: 300_000, monthly_premium: 100.0 },
            RateEntry { age: 50, face_amount: 200_000, monthly_premium: 90.0 },
        ]);

        assert_relative_eq!(matrix.lookup(&class(), 40, 200_000).unwrap(), 70.0);
    }

    #[test]
    fn test_unknown_classification_is_out_of_range() {
        let matrix = matrix_with(&[
            RateEntry { age: 40, face_amount: 100_000, monthly_premium: 50.0 },
        ]);
        let tobacco = RateClass {
            tobacco: TobaccoClass::Tobacco,
            ..class()
        };
        let err = matrix.lookup(&tobacco, 40, 100_000).unwrap_err();
        assert!(matches!(err, UnderwritingError::OutOfRange(_)));
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_relative_eq!(lerp(0.0, 0.0, 10.0, 100.0, 200.0), 100.0);
        assert_relative_eq!(lerp(10.0, 0.0, 10.0, 100.0, 200.0), 200.0);
        // Degenerate interval returns the left value
        assert_relative_eq!(lerp(5.0, 5.0, 5.0, 42.0, 99.0), 42.0);
    }

    #[test]
    fn test_bracket() {
        let values = vec![20u8, 30, 40];
        assert_eq!(bracket(&values, 30), Some((30, 30)));
        assert_eq!(bracket(&values, 25), Some((20, 30)));
        assert_eq!(bracket(&values, 19), None);
        assert_eq!(bracket(&values, 41), None);
        assert_eq!(bracket::<u8>(&[], 10), None);
    }
}
