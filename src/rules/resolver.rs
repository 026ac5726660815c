//! First-match rule resolution and worst-case outcome aggregation

use log::debug;
use serde::{Deserialize, Serialize};

use crate::applicant::ApplicantContext;
use crate::rules::model::{Eligibility, HealthClass, Outcome, RuleSet, TableRating};

/// Result of resolving one rule set against one applicant
///
/// `NoMatch` is deliberately distinct from a Decline outcome: it means "this
/// rule set has no opinion", which lets the caller fall back to a less
/// specific scope or a configured default.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched(MatchedRule),
    NoMatch,
}

/// The winning rule and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub rule_id: u64,
    pub rule_name: String,
    pub outcome: Outcome,
}

/// Resolve a rule set: first rule passing all three gates wins
///
/// Rules are visited in ascending (priority, id) order. Per rule the gates
/// are: gender filter, age band, then the predicate tree. The cheap
/// pre-filters let non-applicable rules skip predicate evaluation entirely.
/// First-match semantics are exact: once a rule matches, later rules are
/// never consulted, because the authoring UI orders rules to encode intent.
pub fn resolve(rule_set: &RuleSet, ctx: &ApplicantContext) -> Resolution {
    for rule in rule_set.ordered_rules() {
        if !rule.applies_to(ctx.age, ctx.gender) {
            continue;
        }
        if rule.predicate.evaluate(ctx) {
            debug!(
                "rule set {} matched rule {} ({})",
                rule_set.id, rule.id, rule.name
            );
            return Resolution::Matched(MatchedRule {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                outcome: rule.outcome.clone(),
            });
        }
    }

    debug!("rule set {} had no opinion", rule_set.id);
    Resolution::NoMatch
}

/// Worst-case aggregate across per-condition outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOutcome {
    pub eligibility: Eligibility,
    pub health_class: Option<HealthClass>,
    pub table_rating: TableRating,
    pub flat_extra_per_thousand: Option<f64>,
    pub flat_extra_years: Option<u8>,
    pub reasons: Vec<String>,
    pub concerns: Vec<String>,
}

/// Combine independently-resolved outcomes into one decision
///
/// Severity ordering is `Decline > Refer > Accept`. Among non-decline
/// outcomes the worst health class and the largest table rating win; among
/// flat extras the larger per-thousand amount is kept (ties keep the longer
/// duration). Reasons and concerns are unioned with order-preserving dedup.
/// Returns `None` for an empty slice; the caller supplies its configured
/// default in that case.
pub fn aggregate_outcomes(outcomes: &[&Outcome]) -> Option<AggregateOutcome> {
    if outcomes.is_empty() {
        return None;
    }

    let eligibility = outcomes
        .iter()
        .map(|o| o.eligibility)
        .fold(Eligibility::Accept, Eligibility::worse);

    let reasons = dedup_preserving_order(outcomes.iter().map(|o| o.reason.as_str()));
    let concerns =
        dedup_preserving_order(outcomes.iter().flat_map(|o| o.concerns.iter().map(|c| c.as_str())));

    if eligibility == Eligibility::Decline {
        // Rating details are meaningless on a declined case
        return Some(AggregateOutcome {
            eligibility,
            health_class: None,
            table_rating: TableRating::None,
            flat_extra_per_thousand: None,
            flat_extra_years: None,
            reasons,
            concerns,
        });
    }

    let health_class = outcomes.iter().filter_map(|o| o.health_class).max();

    let table_units = outcomes
        .iter()
        .map(|o| o.table_rating.units())
        .max()
        .unwrap_or(0);

    // Largest flat extra by per-thousand amount; equal amounts keep the
    // longer duration
    let flat_extra = outcomes
        .iter()
        .filter_map(|o| {
            o.flat_extra_per_thousand
                .map(|amount| (amount, o.flat_extra_years.unwrap_or(1)))
        })
        .fold(None::<(f64, u8)>, |best, candidate| match best {
            None => Some(candidate),
            Some(current) => {
                if candidate.0 > current.0
                    || (candidate.0 == current.0 && candidate.1 > current.1)
                {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        });

    Some(AggregateOutcome {
        eligibility,
        health_class,
        table_rating: TableRating::from_units(table_units),
        flat_extra_per_thousand: flat_extra.map(|(amount, _)| amount),
        flat_extra_years: flat_extra.map(|(_, years)| years),
        reasons,
        concerns,
    })
}

fn dedup_preserving_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    for item in items {
        if !item.is_empty() && seen.insert(item) {
            out.push(item.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applicant::{ApplicantProfile, FieldValue, Gender, TobaccoClass};
    use crate::rules::model::{Rule, RuleScope};
    use crate::rules::predicate::{CompareOp, ComparisonValue, Predicate};

    fn rule(id: u64, priority: i32, predicate: Predicate, outcome: Outcome) -> Rule {
        Rule {
            id,
            rule_set_id: 1,
            priority,
            name: format!("rule {}", id),
            description: None,
            age_band_min: None,
            age_band_max: None,
            gender: None,
            predicate,
            outcome,
        }
    }

    fn diabetes_set(rules: Vec<Rule>) -> RuleSet {
        let mut set = RuleSet::draft(
            1,
            RuleScope::Condition,
            1,
            Some(101),
            Some("diabetes_type_2".to_string()),
            "Diabetes rules",
        );
        set.rules = rules;
        set
    }

    fn diabetic(age: u8, a1c: f64) -> ApplicantContext {
        let mut profile = ApplicantProfile::new(age, Gender::Male, TobaccoClass::NonTobacco);
        profile.answer("diabetes_type_2", "a1c", FieldValue::Number(a1c));
        ApplicantContext::from_profile(&profile)
    }

    fn a1c_above(threshold: f64) -> Predicate {
        Predicate::leaf(
            "diabetes_type_2.a1c",
            CompareOp::Gt,
            ComparisonValue::Single(FieldValue::Number(threshold)),
        )
    }

    #[test]
    fn test_first_match_wins() {
        let set = diabetes_set(vec![
            rule(1, 1, a1c_above(9.0), Outcome::decline("A1C above 9")),
            rule(2, 2, a1c_above(7.0), Outcome::accept(HealthClass::Standard, "controlled")),
        ]);

        // Both rules match an A1C of 9.5; priority 1 must win
        match resolve(&set, &diabetic(50, 9.5)) {
            Resolution::Matched(m) => {
                assert_eq!(m.rule_id, 1);
                assert_eq!(m.outcome.eligibility, Eligibility::Decline);
            }
            Resolution::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_priority_tie_broken_by_id() {
        let set = diabetes_set(vec![
            rule(5, 10, a1c_above(7.0), Outcome::refer("higher id")),
            rule(3, 10, a1c_above(7.0), Outcome::refer("lower id")),
        ]);

        match resolve(&set, &diabetic(50, 8.0)) {
            Resolution::Matched(m) => assert_eq!(m.rule_id, 3),
            Resolution::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_no_match_is_not_decline() {
        // Every rule requires age >= 80; a 40-year-old gets NoMatch, never an
        // implicit decline
        let mut knockout = rule(1, 10, Predicate::always(), Outcome::decline("too old"));
        knockout.age_band_min = Some(80);
        let set = diabetes_set(vec![knockout]);

        assert_eq!(resolve(&set, &diabetic(40, 9.5)), Resolution::NoMatch);
    }

    #[test]
    fn test_gender_gate_skips_rule() {
        let mut female_only = rule(1, 10, Predicate::always(), Outcome::refer("female pathway"));
        female_only.gender = Some(Gender::Female);
        let set = diabetes_set(vec![
            female_only,
            rule(2, 20, Predicate::always(), Outcome::accept(HealthClass::Standard, "default")),
        ]);

        // Male applicant skips rule 1 entirely
        match resolve(&set, &diabetic(50, 6.0)) {
            Resolution::Matched(m) => assert_eq!(m.rule_id, 2),
            Resolution::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_scenario_a1c_thresholds() {
        // A1C 9.5 against an "A1C > 9 => decline" rule, then the same
        // condition at 6.5 against a set whose only rule requires A1C > 7
        let set = diabetes_set(vec![rule(1, 10, a1c_above(9.0), Outcome::decline("A1C above 9"))]);
        match resolve(&set, &diabetic(30, 9.5)) {
            Resolution::Matched(m) => assert_eq!(m.outcome.eligibility, Eligibility::Decline),
            Resolution::NoMatch => panic!("expected decline"),
        }

        let set = diabetes_set(vec![rule(1, 10, a1c_above(7.0), Outcome::refer("elevated A1C"))]);
        assert_eq!(resolve(&set, &diabetic(30, 6.5)), Resolution::NoMatch);
    }

    #[test]
    fn test_aggregate_worst_case() {
        let accept = Outcome::accept(HealthClass::Preferred, "well controlled");
        let mut rated = Outcome::accept(HealthClass::Substandard, "rated");
        rated.table_rating = TableRating::B;
        rated.concerns.push("recent episode".to_string());
        let refer = Outcome::refer("needs APS");

        let agg = aggregate_outcomes(&[&accept, &rated, &refer]).unwrap();
        assert_eq!(agg.eligibility, Eligibility::Refer);
        assert_eq!(agg.health_class, Some(HealthClass::Substandard));
        assert_eq!(agg.table_rating, TableRating::B);
        assert_eq!(agg.concerns, vec!["recent episode".to_string()]);
        assert_eq!(agg.reasons.len(), 3);
    }

    #[test]
    fn test_aggregate_decline_dominates() {
        let accept = Outcome::accept(HealthClass::PreferredPlus, "clean");
        let decline = Outcome::decline("knockout condition");

        let agg = aggregate_outcomes(&[&accept, &decline]).unwrap();
        assert_eq!(agg.eligibility, Eligibility::Decline);
        assert_eq!(agg.health_class, None);
        assert_eq!(agg.table_rating, TableRating::None);
    }

    #[test]
    fn test_aggregate_flat_extra_max() {
        let mut a = Outcome::accept(HealthClass::Standard, "a");
        a.flat_extra_per_thousand = Some(2.5);
        a.flat_extra_years = Some(3);
        let mut b = Outcome::accept(HealthClass::Standard, "b");
        b.flat_extra_per_thousand = Some(5.0);
        b.flat_extra_years = Some(2);

        let agg = aggregate_outcomes(&[&a, &b]).unwrap();
        assert_eq!(agg.flat_extra_per_thousand, Some(5.0));
        assert_eq!(agg.flat_extra_years, Some(2));
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert!(aggregate_outcomes(&[]).is_none());
    }

    #[test]
    fn test_aggregate_dedups_repeated_reasons() {
        let a = Outcome::refer("needs APS");
        let b = Outcome::refer("needs APS");
        let agg = aggregate_outcomes(&[&a, &b]).unwrap();
        assert_eq!(agg.reasons, vec!["needs APS".to_string()]);
    }
}
