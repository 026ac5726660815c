//! Rule and rule-set data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::applicant::Gender;
use crate::rules::lifecycle::ReviewStatus;
use crate::rules::predicate::Predicate;

/// Underwriting eligibility verdict
///
/// Variant order encodes severity: `Decline > Refer > Accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Accept,
    Refer,
    Decline,
}

impl Eligibility {
    /// The worse of two verdicts
    pub fn worse(self, other: Eligibility) -> Eligibility {
        self.max(other)
    }
}

/// Carrier health class tier
///
/// Variant order encodes rank: later variants are worse risks and price
/// higher in the rate grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthClass {
    PreferredPlus,
    Preferred,
    StandardPlus,
    Standard,
    Substandard,
}

impl HealthClass {
    pub fn label(&self) -> &'static str {
        match self {
            HealthClass::PreferredPlus => "Preferred Plus",
            HealthClass::Preferred => "Preferred",
            HealthClass::StandardPlus => "Standard Plus",
            HealthClass::Standard => "Standard",
            HealthClass::Substandard => "Substandard",
        }
    }
}

/// Substandard table rating, A (1 unit) through P (16 units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TableRating {
    None = 0,
    A = 1,
    B = 2,
    C = 3,
    D = 4,
    E = 5,
    F = 6,
    G = 7,
    H = 8,
    I = 9,
    J = 10,
    K = 11,
    L = 12,
    M = 13,
    N = 14,
    O = 15,
    P = 16,
}

impl TableRating {
    /// Rating expressed as load units (table A = 1, ..., P = 16)
    pub fn units(&self) -> u8 {
        *self as u8
    }

    /// Rating from load units, clamped to table P
    pub fn from_units(units: u8) -> TableRating {
        match units {
            0 => TableRating::None,
            1 => TableRating::A,
            2 => TableRating::B,
            3 => TableRating::C,
            4 => TableRating::D,
            5 => TableRating::E,
            6 => TableRating::F,
            7 => TableRating::G,
            8 => TableRating::H,
            9 => TableRating::I,
            10 => TableRating::J,
            11 => TableRating::K,
            12 => TableRating::L,
            13 => TableRating::M,
            14 => TableRating::N,
            15 => TableRating::O,
            _ => TableRating::P,
        }
    }

    pub fn is_rated(&self) -> bool {
        !matches!(self, TableRating::None)
    }
}

impl Default for TableRating {
    fn default() -> Self {
        TableRating::None
    }
}

/// The underwriting decision attached to a matching rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub eligibility: Eligibility,

    /// Health class assigned when the applicant is not declined
    #[serde(default)]
    pub health_class: Option<HealthClass>,

    #[serde(default)]
    pub table_rating: TableRating,

    /// Annual flat extra per $1,000 of face amount
    #[serde(default)]
    pub flat_extra_per_thousand: Option<f64>,

    /// Number of years the flat extra applies
    #[serde(default)]
    pub flat_extra_years: Option<u8>,

    /// Human-readable explanation shown to the agent
    pub reason: String,

    #[serde(default)]
    pub concerns: Vec<String>,
}

impl Outcome {
    /// A plain acceptance at the given health class
    pub fn accept(health_class: HealthClass, reason: &str) -> Self {
        Self {
            eligibility: Eligibility::Accept,
            health_class: Some(health_class),
            table_rating: TableRating::None,
            flat_extra_per_thousand: None,
            flat_extra_years: None,
            reason: reason.to_string(),
            concerns: Vec::new(),
        }
    }

    /// A referral to manual underwriting
    pub fn refer(reason: &str) -> Self {
        Self {
            eligibility: Eligibility::Refer,
            health_class: None,
            table_rating: TableRating::None,
            flat_extra_per_thousand: None,
            flat_extra_years: None,
            reason: reason.to_string(),
            concerns: Vec::new(),
        }
    }

    /// A knockout decline
    pub fn decline(reason: &str) -> Self {
        Self {
            eligibility: Eligibility::Decline,
            health_class: None,
            table_rating: TableRating::None,
            flat_extra_per_thousand: None,
            flat_extra_years: None,
            reason: reason.to_string(),
            concerns: Vec::new(),
        }
    }
}

/// Targeting scope of a rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    /// Rules for one health condition under a carrier (optionally one product)
    Condition,
    /// Product-wide screening rules (age knockouts, build limits)
    Product,
    /// Carrier-wide screening rules
    Carrier,
}

/// One underwriting rule within a rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: u64,
    pub rule_set_id: u64,

    /// Evaluation order within the set; lower evaluates first, ties broken
    /// by `id`
    pub priority: i32,

    pub name: String,
    #[serde(default)]
    pub description: Option<String>,

    /// Inclusive age band; `None` = unbounded on that side
    #[serde(default)]
    pub age_band_min: Option<u8>,
    #[serde(default)]
    pub age_band_max: Option<u8>,

    /// Gender filter; `None` = applies to any gender
    #[serde(default)]
    pub gender: Option<Gender>,

    pub predicate: Predicate,
    pub outcome: Outcome,
}

impl Rule {
    /// Fast pre-filter on age band and gender, checked before the predicate
    /// tree is evaluated at all
    pub fn applies_to(&self, age: u8, gender: Gender) -> bool {
        if let Some(min) = self.age_band_min {
            if age < min {
                return false;
            }
        }
        if let Some(max) = self.age_band_max {
            if age > max {
                return false;
            }
        }
        if let Some(required) = self.gender {
            if required != gender {
                return false;
            }
        }
        true
    }
}

/// A named, ordered group of rules scoped to a carrier, optionally narrowed
/// to a product and/or one health condition
///
/// Invariant (enforced by the persistence layer): at most one rule set may be
/// live (approved and active) per (carrier, product-or-none,
/// condition-or-none) key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: u64,
    pub scope: RuleScope,
    pub carrier_id: u64,

    /// `None` = carrier-wide (required for `RuleScope::Carrier`)
    #[serde(default)]
    pub product_id: Option<u64>,

    /// `Some` iff `scope == RuleScope::Condition`
    #[serde(default)]
    pub condition_code: Option<String>,

    pub name: String,
    #[serde(default)]
    pub description: Option<String>,

    pub review_status: ReviewStatus,

    /// Operational toggle, distinct from review status: an approved set can
    /// be deactivated without losing its approval
    pub is_active: bool,

    #[serde(default)]
    pub reviewed_by: Option<u64>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_notes: Option<String>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Create an empty draft set
    pub fn draft(
        id: u64,
        scope: RuleScope,
        carrier_id: u64,
        product_id: Option<u64>,
        condition_code: Option<String>,
        name: &str,
    ) -> Self {
        Self {
            id,
            scope,
            carrier_id,
            product_id,
            condition_code,
            name: name.to_string(),
            description: None,
            review_status: ReviewStatus::Draft,
            is_active: true,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            rules: Vec::new(),
        }
    }

    /// Whether this set participates in runtime resolution and coverage
    pub fn is_live(&self) -> bool {
        self.review_status == ReviewStatus::Approved && self.is_active
    }

    /// Rules in deterministic evaluation order: ascending priority, ties by id
    pub fn ordered_rules(&self) -> Vec<&Rule> {
        let mut ordered: Vec<&Rule> = self.rules.iter().collect();
        ordered.sort_by_key(|r| (r.priority, r.id));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::predicate::Predicate;

    #[test]
    fn test_eligibility_severity() {
        assert_eq!(
            Eligibility::Accept.worse(Eligibility::Refer),
            Eligibility::Refer
        );
        assert_eq!(
            Eligibility::Refer.worse(Eligibility::Decline),
            Eligibility::Decline
        );
        assert_eq!(
            Eligibility::Accept.worse(Eligibility::Accept),
            Eligibility::Accept
        );
    }

    #[test]
    fn test_health_class_ordering() {
        assert!(HealthClass::Substandard > HealthClass::Standard);
        assert!(HealthClass::PreferredPlus < HealthClass::Preferred);
        assert_eq!(
            HealthClass::Standard.max(HealthClass::Preferred),
            HealthClass::Standard
        );
    }

    #[test]
    fn test_table_rating_units() {
        assert_eq!(TableRating::None.units(), 0);
        assert_eq!(TableRating::A.units(), 1);
        assert_eq!(TableRating::P.units(), 16);

        assert_eq!(TableRating::from_units(0), TableRating::None);
        assert_eq!(TableRating::from_units(4), TableRating::D);
        assert_eq!(TableRating::from_units(99), TableRating::P);
    }

    fn gated_rule(age_min: Option<u8>, age_max: Option<u8>, gender: Option<Gender>) -> Rule {
        Rule {
            id: 1,
            rule_set_id: 1,
            priority: 10,
            name: "gate test".to_string(),
            description: None,
            age_band_min: age_min,
            age_band_max: age_max,
            gender,
            predicate: Predicate::always(),
            outcome: Outcome::decline("test"),
        }
    }

    #[test]
    fn test_rule_age_gender_gates() {
        let rule = gated_rule(Some(50), Some(70), Some(Gender::Male));
        assert!(rule.applies_to(50, Gender::Male));
        assert!(rule.applies_to(70, Gender::Male));
        assert!(!rule.applies_to(49, Gender::Male));
        assert!(!rule.applies_to(71, Gender::Male));
        assert!(!rule.applies_to(60, Gender::Female));

        // Unbounded sides
        let open = gated_rule(None, Some(30), None);
        assert!(open.applies_to(0, Gender::Female));
        assert!(!open.applies_to(31, Gender::Female));
    }

    #[test]
    fn test_ordered_rules_tie_break() {
        let mut set = RuleSet::draft(1, RuleScope::Carrier, 1, None, None, "ordering");
        for (id, priority) in [(3u64, 20), (1, 10), (2, 10)] {
            set.rules.push(Rule {
                id,
                rule_set_id: 1,
                priority,
                name: format!("rule {}", id),
                description: None,
                age_band_min: None,
                age_band_max: None,
                gender: None,
                predicate: Predicate::always(),
                outcome: Outcome::refer("test"),
            });
        }

        let order: Vec<u64> = set.ordered_rules().iter().map(|r| r.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
