//! Error taxonomy for the underwriting core
//!
//! Errors are split along who can act on them:
//! - `Configuration`: authoring mistakes, caught when a rule set is saved
//! - `InvalidState`: illegal review-workflow transitions
//! - `OutOfRange`: premium lookups the stored grid cannot price
//! - `Validation`: malformed inputs to mutation operations (rejected atomically)

use thiserror::Error;

/// Errors produced by the underwriting core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnderwritingError {
    /// Rule-set authoring problem: unresolvable field reference, bad operator
    /// arity, empty rule set submitted for review. Surfaced to the configuring
    /// user; never reaches runtime resolution.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Illegal review-workflow transition. The caller must not retry without
    /// changing state first.
    #[error("invalid state transition: {0}")]
    InvalidState(String),

    /// Premium lookup outside the populated grid. Surfaced as "rate not
    /// available" so the case routes to manual underwriting; the engine never
    /// extrapolates a premium.
    #[error("rate not available: {0}")]
    OutOfRange(String),

    /// Malformed mutation input: non-positive premium, duplicate cells in an
    /// upsert batch, missing rejection reason. No partial writes occur.
    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = UnderwritingError::OutOfRange("age 18 below minimum populated age 20".into());
        assert_eq!(
            err.to_string(),
            "rate not available: age 18 below minimum populated age 20"
        );
    }
}
