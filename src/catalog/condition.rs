//! Health condition reference data and follow-up question schemas

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::UnderwritingError;

/// Clinical grouping for a health condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Cardiovascular,
    Metabolic,
    Cancer,
    Respiratory,
    MentalHealth,
    Gastrointestinal,
    Neurological,
    Autoimmune,
    Renal,
    Substance,
    Endocrine,
    Infectious,
}

impl ConditionCategory {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            ConditionCategory::Cardiovascular => "Cardiovascular",
            ConditionCategory::Metabolic => "Metabolic",
            ConditionCategory::Cancer => "Cancer",
            ConditionCategory::Respiratory => "Respiratory",
            ConditionCategory::MentalHealth => "Mental Health",
            ConditionCategory::Gastrointestinal => "Gastrointestinal",
            ConditionCategory::Neurological => "Neurological",
            ConditionCategory::Autoimmune => "Autoimmune",
            ConditionCategory::Renal => "Kidney",
            ConditionCategory::Substance => "Substance Use",
            ConditionCategory::Endocrine => "Endocrine",
            ConditionCategory::Infectious => "Infectious Disease",
        }
    }
}

/// Answer type of a follow-up question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free numeric entry (lab values, counts, dosages)
    Numeric,
    /// One of a fixed option list
    Choice,
    /// Yes/no
    Boolean,
    /// Calendar date (diagnosis, last episode, remission)
    Date,
}

/// One question in a condition's follow-up schema
///
/// The `key` is the stable identifier rules reference as
/// `"{condition_code}.{key}"`; the label and constraints drive the intake
/// form in the excluded UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    pub key: String,
    pub label: String,
    pub kind: QuestionKind,

    /// Allowed values for `Choice` questions
    #[serde(default)]
    pub options: Vec<String>,

    /// Whether intake requires an answer before submission
    #[serde(default)]
    pub required: bool,

    /// Lower bound for `Numeric` answers
    #[serde(default)]
    pub min: Option<f64>,

    /// Upper bound for `Numeric` answers
    #[serde(default)]
    pub max: Option<f64>,
}

/// A health condition in the catalog
///
/// Immutable reference data: created and edited by administrators, never by
/// end-user flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCondition {
    /// Unique stable identifier (e.g. `diabetes_type_2`)
    pub code: String,
    pub name: String,
    pub category: ConditionCategory,

    /// Ordered follow-up question schema
    #[serde(default)]
    pub questions: Vec<FollowUpQuestion>,
}

impl HealthCondition {
    /// Find a follow-up question by its stable key
    pub fn question(&self, key: &str) -> Option<&FollowUpQuestion> {
        self.questions.iter().find(|q| q.key == key)
    }
}

/// Immutable snapshot of the full condition catalog
///
/// Passed by reference into validation and coverage computations; callers own
/// refresh/swap strategy. Keyed by condition code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionCatalog {
    conditions: BTreeMap<String, HealthCondition>,
}

impl ConditionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate condition codes
    pub fn from_conditions(
        conditions: Vec<HealthCondition>,
    ) -> Result<Self, UnderwritingError> {
        let mut map = BTreeMap::new();
        for condition in conditions {
            if map.contains_key(&condition.code) {
                return Err(UnderwritingError::Configuration(format!(
                    "duplicate condition code: {}",
                    condition.code
                )));
            }
            map.insert(condition.code.clone(), condition);
        }
        Ok(Self { conditions: map })
    }

    pub fn get(&self, code: &str) -> Option<&HealthCondition> {
        self.conditions.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.conditions.contains_key(code)
    }

    /// Total number of conditions, the denominator for coverage percentages
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HealthCondition> {
        self.conditions.values()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(|k| k.as_str())
    }
}
