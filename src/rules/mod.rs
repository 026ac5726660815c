//! Rule engine: predicate language, rule/rule-set model, review lifecycle,
//! first-match resolution, and deterministic rule generation

pub mod generator;
mod lifecycle;
mod model;
pub mod predicate;
mod resolver;
pub mod validate;

pub use lifecycle::ReviewStatus;
pub use model::{Eligibility, HealthClass, Outcome, Rule, RuleScope, RuleSet, TableRating};
pub use predicate::{CompareOp, Comparison, ComparisonValue, Predicate};
pub use resolver::{aggregate_outcomes, resolve, AggregateOutcome, MatchedRule, Resolution};
pub use validate::validate_rule_set;
