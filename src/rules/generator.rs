//! Deterministic rule generation from structured metadata
//!
//! Batch-generates knockout rule sets (from per-condition disqualifying
//! answer patterns) and issue-age rule sets (from product metadata) as a
//! convenience over manual authoring. Generated sets always land in draft:
//! they pass through the same review lifecycle as hand-authored content and
//! are never auto-approved.

use std::collections::BTreeMap;

use crate::catalog::{ConditionCatalog, ProductInfo};
use crate::error::UnderwritingError;
use crate::rules::model::{Outcome, Rule, RuleScope, RuleSet};
use crate::rules::predicate::{CompareOp, Comparison, ComparisonValue, Predicate};
use crate::rules::validate::validate_rule_set;

/// Sequential id source for generated rule sets and rules
///
/// Keeps generation deterministic: the same inputs and starting ids always
/// produce the same output.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_rule_set_id: u64,
    next_rule_id: u64,
}

impl IdAllocator {
    pub fn new(rule_set_start: u64, rule_start: u64) -> Self {
        Self {
            next_rule_set_id: rule_set_start,
            next_rule_id: rule_start,
        }
    }

    fn next_rule_set(&mut self) -> u64 {
        let id = self.next_rule_set_id;
        self.next_rule_set_id += 1;
        id
    }

    fn next_rule(&mut self) -> u64 {
        let id = self.next_rule_id;
        self.next_rule_id += 1;
        id
    }
}

/// One disqualifying answer pattern: "this condition + this answer => decline"
#[derive(Debug, Clone)]
pub struct KnockoutCriterion {
    pub condition_code: String,
    /// Bare question key within the condition's follow-up schema
    pub field: String,
    pub op: CompareOp,
    pub value: ComparisonValue,
    pub reason: String,
}

/// Knockout generation parameters for one carrier/product target
#[derive(Debug, Clone)]
pub struct KnockoutStrategy {
    pub carrier_id: u64,
    /// `None` generates carrier-wide condition sets
    pub product_id: Option<u64>,
    pub criteria: Vec<KnockoutCriterion>,
    pub priority_start: i32,
    pub priority_step: i32,
}

impl KnockoutStrategy {
    pub fn new(carrier_id: u64, product_id: Option<u64>) -> Self {
        Self {
            carrier_id,
            product_id,
            criteria: Vec::new(),
            priority_start: 10,
            priority_step: 10,
        }
    }
}

/// Generate one draft condition-scoped knockout set per condition referenced
/// by the strategy
///
/// Criteria are grouped by condition code; each becomes a decline rule in
/// priority order. Unknown condition codes or fields are configuration
/// errors; the generated sets are themselves run through
/// [`validate_rule_set`] before being returned.
pub fn generate_knockout_rule_sets(
    catalog: &ConditionCatalog,
    strategy: &KnockoutStrategy,
    ids: &mut IdAllocator,
) -> Result<Vec<RuleSet>, UnderwritingError> {
    let mut by_condition: BTreeMap<&str, Vec<&KnockoutCriterion>> = BTreeMap::new();
    for criterion in &strategy.criteria {
        by_condition
            .entry(criterion.condition_code.as_str())
            .or_default()
            .push(criterion);
    }

    let mut rule_sets = Vec::new();
    for (code, criteria) in by_condition {
        let condition = catalog.get(code).ok_or_else(|| {
            UnderwritingError::Configuration(format!("unknown condition code: {}", code))
        })?;

        let rule_set_id = ids.next_rule_set();
        let mut set = RuleSet::draft(
            rule_set_id,
            RuleScope::Condition,
            strategy.carrier_id,
            strategy.product_id,
            Some(code.to_string()),
            &format!("{} knockouts", condition.name),
        );
        set.description = Some(format!(
            "Generated knockout rules for {}",
            condition.name
        ));

        let mut priority = strategy.priority_start;
        for criterion in criteria {
            let mut outcome = Outcome::decline(&criterion.reason);
            outcome.concerns.push(condition.name.clone());

            set.rules.push(Rule {
                id: ids.next_rule(),
                rule_set_id,
                priority,
                name: format!("{}: {}", condition.name, criterion.reason),
                description: None,
                age_band_min: None,
                age_band_max: None,
                gender: None,
                predicate: Predicate::Leaf(Comparison {
                    field: format!("{}.{}", code, criterion.field),
                    op: criterion.op,
                    value: criterion.value.clone(),
                }),
                outcome,
            });
            priority += strategy.priority_step;
        }

        validate_rule_set(&set, catalog)?;
        rule_sets.push(set);
    }

    Ok(rule_sets)
}

/// Issue-age rule generation parameters
#[derive(Debug, Clone)]
pub struct AgeRuleStrategy {
    pub priority_start: i32,
    pub priority_step: i32,
}

impl Default for AgeRuleStrategy {
    fn default() -> Self {
        Self {
            priority_start: 10,
            priority_step: 10,
        }
    }
}

/// Generate one draft product-scoped set per product, declining applicants
/// outside the issue-age window
///
/// The bounds are expressed as age-band gates with an always-true predicate,
/// so the resolver's cheap pre-filter does all the work.
pub fn generate_age_rule_sets(
    products: &[ProductInfo],
    strategy: &AgeRuleStrategy,
    ids: &mut IdAllocator,
) -> Result<Vec<RuleSet>, UnderwritingError> {
    let mut rule_sets = Vec::new();

    for product in products {
        if product.min_issue_age > product.max_issue_age {
            return Err(UnderwritingError::Configuration(format!(
                "product {} has inverted issue ages {}..{}",
                product.id, product.min_issue_age, product.max_issue_age
            )));
        }

        let rule_set_id = ids.next_rule_set();
        let mut set = RuleSet::draft(
            rule_set_id,
            RuleScope::Product,
            product.carrier_id,
            Some(product.id),
            None,
            &format!("{} issue ages", product.name),
        );
        set.description = Some(format!(
            "Generated issue-age screen for {} (ages {}-{})",
            product.name, product.min_issue_age, product.max_issue_age
        ));

        let mut priority = strategy.priority_start;
        if product.min_issue_age > 0 {
            set.rules.push(Rule {
                id: ids.next_rule(),
                rule_set_id,
                priority,
                name: format!("{}: below minimum issue age", product.name),
                description: None,
                age_band_min: None,
                age_band_max: Some(product.min_issue_age - 1),
                gender: None,
                predicate: Predicate::always(),
                outcome: Outcome::decline(&format!(
                    "Below minimum issue age {}",
                    product.min_issue_age
                )),
            });
            priority += strategy.priority_step;
        }

        if product.max_issue_age < u8::MAX {
            set.rules.push(Rule {
                id: ids.next_rule(),
                rule_set_id,
                priority,
                name: format!("{}: above maximum issue age", product.name),
                description: None,
                age_band_min: Some(product.max_issue_age + 1),
                age_band_max: None,
                gender: None,
                predicate: Predicate::always(),
                outcome: Outcome::decline(&format!(
                    "Above maximum issue age {}",
                    product.max_issue_age
                )),
            });
        }

        rule_sets.push(set);
    }

    Ok(rule_sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::{ApplicantProfile, FieldValue, Gender, TobaccoClass};
    use crate::applicant::ApplicantContext;
    use crate::catalog::{ConditionCategory, FollowUpQuestion, HealthCondition, ProductType, QuestionKind};
    use crate::rules::lifecycle::ReviewStatus;
    use crate::rules::model::Eligibility;
    use crate::rules::resolver::{resolve, Resolution};

    fn catalog() -> ConditionCatalog {
        ConditionCatalog::from_conditions(vec![HealthCondition {
            code: "copd".to_string(),
            name: "COPD".to_string(),
            category: ConditionCategory::Respiratory,
            questions: vec![FollowUpQuestion {
                key: "oxygen_use".to_string(),
                label: "Uses supplemental oxygen".to_string(),
                kind: QuestionKind::Boolean,
                options: vec![],
                required: true,
                min: None,
                max: None,
            }],
        }])
        .unwrap()
    }

    fn oxygen_knockout() -> KnockoutStrategy {
        let mut strategy = KnockoutStrategy::new(1, Some(101));
        strategy.criteria.push(KnockoutCriterion {
            condition_code: "copd".to_string(),
            field: "oxygen_use".to_string(),
            op: CompareOp::Eq,
            value: ComparisonValue::Single(FieldValue::Bool(true)),
            reason: "Supplemental oxygen use".to_string(),
        });
        strategy
    }

    #[test]
    fn test_knockout_generation_lands_in_draft() {
        let mut ids = IdAllocator::new(1000, 5000);
        let sets = generate_knockout_rule_sets(&catalog(), &oxygen_knockout(), &mut ids).unwrap();

        assert_eq!(sets.len(), 1);
        let set = &sets[0];
        assert_eq!(set.review_status, ReviewStatus::Draft);
        assert!(!set.is_live());
        assert_eq!(set.scope, RuleScope::Condition);
        assert_eq!(set.condition_code.as_deref(), Some("copd"));
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].outcome.eligibility, Eligibility::Decline);

        // The generated rule actually fires
        let mut profile = ApplicantProfile::new(55, Gender::Male, TobaccoClass::Tobacco);
        profile.answer("copd", "oxygen_use", FieldValue::Bool(true));
        let ctx = ApplicantContext::from_profile(&profile);
        assert!(matches!(resolve(set, &ctx), Resolution::Matched(_)));
    }

    #[test]
    fn test_knockout_unknown_field_rejected() {
        let mut strategy = oxygen_knockout();
        strategy.criteria[0].field = "nonexistent".to_string();
        let mut ids = IdAllocator::new(1, 1);
        let err = generate_knockout_rule_sets(&catalog(), &strategy, &mut ids).unwrap_err();
        assert!(matches!(err, UnderwritingError::Configuration(_)));
    }

    #[test]
    fn test_knockout_unknown_condition_rejected() {
        let mut strategy = oxygen_knockout();
        strategy.criteria[0].condition_code = "unknown_condition".to_string();
        let mut ids = IdAllocator::new(1, 1);
        assert!(generate_knockout_rule_sets(&catalog(), &strategy, &mut ids).is_err());
    }

    #[test]
    fn test_age_rule_generation() {
        let product = ProductInfo {
            id: 101,
            carrier_id: 1,
            name: "Level Term Select".to_string(),
            product_type: ProductType::TermLife,
            min_issue_age: 20,
            max_issue_age: 70,
            term_options: vec![10, 20],
        };

        let mut ids = IdAllocator::new(1, 1);
        let sets =
            generate_age_rule_sets(&[product], &AgeRuleStrategy::default(), &mut ids).unwrap();

        assert_eq!(sets.len(), 1);
        let set = &sets[0];
        assert_eq!(set.review_status, ReviewStatus::Draft);
        assert_eq!(set.scope, RuleScope::Product);
        assert_eq!(set.rules.len(), 2);
        assert_eq!(set.rules[0].age_band_max, Some(19));
        assert_eq!(set.rules[1].age_band_min, Some(71));

        // In-window applicant sails through; out-of-window declines
        let in_window =
            ApplicantContext::from_profile(&ApplicantProfile::new(45, Gender::Female, TobaccoClass::NonTobacco));
        assert_eq!(resolve(set, &in_window), Resolution::NoMatch);

        let too_old =
            ApplicantContext::from_profile(&ApplicantProfile::new(75, Gender::Female, TobaccoClass::NonTobacco));
        match resolve(set, &too_old) {
            Resolution::Matched(m) => {
                assert_eq!(m.outcome.eligibility, Eligibility::Decline);
                assert!(m.outcome.reason.contains("maximum issue age"));
            }
            Resolution::NoMatch => panic!("expected decline"),
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut ids_a = IdAllocator::new(100, 200);
        let mut ids_b = IdAllocator::new(100, 200);
        let a = generate_knockout_rule_sets(&catalog(), &oxygen_knockout(), &mut ids_a).unwrap();
        let b = generate_knockout_rule_sets(&catalog(), &oxygen_knockout(), &mut ids_b).unwrap();

        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[0].rules[0].id, b[0].rules[0].id);
        assert_eq!(a[0].rules[0].predicate, b[0].rules[0].predicate);
    }
}
