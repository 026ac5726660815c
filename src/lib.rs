//! Underwriting Engine - rule evaluation and premium rate resolution for life products
//!
//! This library provides:
//! - A compound predicate engine over structured health-condition answers
//! - Priority-ordered rule resolution with first-match semantics
//! - A review/approval workflow state machine for rule sets
//! - Coverage aggregation for configuration dashboards
//! - Sparse age x face-amount premium grids with interpolation
//! - Deterministic knockout and issue-age rule generation

pub mod applicant;
pub mod catalog;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod premium;
pub mod rules;

// Re-export commonly used types
pub use applicant::{ApplicantContext, ApplicantProfile, FieldValue, Gender, TobaccoClass};
pub use catalog::{ConditionCatalog, HealthCondition, ProductInfo};
pub use coverage::{compute_coverage, CoverageMap};
pub use engine::{Decision, DecisionEngine, EngineConfig, EngineSnapshot, Quote, QuoteRequest};
pub use error::UnderwritingError;
pub use premium::{PremiumBook, PremiumMatrix, RateClass, RateEntry};
pub use rules::{
    Eligibility, HealthClass, Outcome, Predicate, ReviewStatus, Rule, RuleScope, RuleSet,
    TableRating,
};
