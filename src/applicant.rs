//! Applicant profile and the flattened fact map used by rule evaluation
//!
//! A profile carries the intrinsic fields (age, gender, tobacco class) plus
//! the typed answers collected from each declared condition's follow-up
//! questionnaire. Evaluation never sees the profile directly: it sees an
//! immutable [`ApplicantContext`] snapshot built once per request, so repeated
//! evaluation of the same predicate against the same context is a pure
//! function call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Intrinsic fact keys resolvable by every rule set regardless of scope
pub const INTRINSIC_FIELDS: [&str; 3] = ["applicant.age", "applicant.gender", "applicant.tobacco"];

/// Gender of the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// String form matching the stored rate and rule data
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Tobacco classification used for rate lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TobaccoClass {
    NonTobacco,
    Tobacco,
    PreferredNonTobacco,
}

impl TobaccoClass {
    /// Whether this classification counts as tobacco use for rule purposes
    pub fn is_tobacco(&self) -> bool {
        matches!(self, TobaccoClass::Tobacco)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TobaccoClass::NonTobacco => "non_tobacco",
            TobaccoClass::Tobacco => "tobacco",
            TobaccoClass::PreferredNonTobacco => "preferred_non_tobacco",
        }
    }
}

/// A typed follow-up answer (or rule literal)
///
/// Untagged serialization: booleans, numbers, ISO `YYYY-MM-DD` dates, then
/// free text. Variant order matters: `Date` must precede `Text` so date
/// strings deserialize as dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    /// Short kind name for validation messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::Date(_) => "date",
            FieldValue::Text(_) => "text",
        }
    }

    /// Whether both values carry the same kind of payload
    pub fn same_kind(&self, other: &FieldValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Ordering for relational operators: numbers against numbers, dates
    /// against dates. Text and booleans are not ordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// An applicant as submitted by the caller
///
/// `answers` maps condition code -> (question key -> typed value) for every
/// condition the applicant declared. Declaring a condition with an empty
/// answer map is valid: rules over its fields simply won't match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub age: u8,
    pub gender: Gender,
    pub tobacco: TobaccoClass,
    #[serde(default)]
    pub answers: BTreeMap<String, BTreeMap<String, FieldValue>>,
}

impl ApplicantProfile {
    /// Create a profile with no declared conditions
    pub fn new(age: u8, gender: Gender, tobacco: TobaccoClass) -> Self {
        Self {
            age,
            gender,
            tobacco,
            answers: BTreeMap::new(),
        }
    }

    /// Record an answer for a condition follow-up question
    pub fn answer(&mut self, condition_code: &str, field_key: &str, value: FieldValue) {
        self.answers
            .entry(condition_code.to_string())
            .or_default()
            .insert(field_key.to_string(), value);
    }

    /// Condition codes the applicant declared
    pub fn condition_codes(&self) -> impl Iterator<Item = &str> {
        self.answers.keys().map(|k| k.as_str())
    }
}

/// Immutable flattened fact map built from a profile
///
/// Facts are keyed `"{condition_code}.{question_key}"` for follow-up answers
/// plus the three intrinsic keys in [`INTRINSIC_FIELDS`]. A field absent from
/// the map means "answer not provided" and is handled by the predicate
/// engine, not here.
#[derive(Debug, Clone)]
pub struct ApplicantContext {
    pub age: u8,
    pub gender: Gender,
    pub tobacco: TobaccoClass,
    facts: BTreeMap<String, FieldValue>,
}

impl ApplicantContext {
    /// Flatten a profile into an evaluation context
    pub fn from_profile(profile: &ApplicantProfile) -> Self {
        let mut facts = BTreeMap::new();
        facts.insert("applicant.age".to_string(), FieldValue::Number(profile.age as f64));
        facts.insert(
            "applicant.gender".to_string(),
            FieldValue::Text(profile.gender.as_str().to_string()),
        );
        facts.insert(
            "applicant.tobacco".to_string(),
            FieldValue::Bool(profile.tobacco.is_tobacco()),
        );

        for (code, answers) in &profile.answers {
            for (key, value) in answers {
                facts.insert(format!("{}.{}", code, key), value.clone());
            }
        }

        Self {
            age: profile.age,
            gender: profile.gender,
            tobacco: profile.tobacco,
            facts,
        }
    }

    /// Look up a fact by its flattened key; `None` means not provided
    pub fn fact(&self, field: &str) -> Option<&FieldValue> {
        self.facts.get(field)
    }

    /// Number of facts in the map (intrinsics included)
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
