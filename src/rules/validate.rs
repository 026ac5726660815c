//! Save-time validation of rule sets
//!
//! Unresolvable field references, operator arity problems, and malformed age
//! bands are configuration errors: they are caught here, when the authoring
//! layer saves a rule set, and never reach runtime resolution.

use crate::applicant::FieldValue;
use crate::catalog::{ConditionCatalog, QuestionKind};
use crate::error::UnderwritingError;
use crate::rules::model::{RuleScope, RuleSet};
use crate::rules::predicate::{CompareOp, Comparison, ComparisonValue};

/// Validate a rule set against the condition catalog
///
/// Checks, in order: scope shape (which of product_id/condition_code must be
/// present), per-rule age bands, and every predicate leaf: field resolution,
/// operand arity, and operand type against the question schema. All problems
/// are collected and reported together.
pub fn validate_rule_set(
    rule_set: &RuleSet,
    catalog: &ConditionCatalog,
) -> Result<(), UnderwritingError> {
    let mut errors: Vec<String> = Vec::new();

    match rule_set.scope {
        RuleScope::Condition => {
            match rule_set.condition_code.as_deref() {
                None => errors.push("condition-scoped rule set requires a condition code".into()),
                Some(code) if !catalog.contains(code) => {
                    errors.push(format!("unknown condition code: {}", code));
                }
                Some(_) => {}
            }
        }
        RuleScope::Product => {
            if rule_set.product_id.is_none() {
                errors.push("product-scoped rule set requires a product id".into());
            }
            if rule_set.condition_code.is_some() {
                errors.push("product-scoped rule set must not name a condition".into());
            }
        }
        RuleScope::Carrier => {
            if rule_set.product_id.is_some() {
                errors.push("carrier-scoped rule set must not name a product".into());
            }
            if rule_set.condition_code.is_some() {
                errors.push("carrier-scoped rule set must not name a condition".into());
            }
        }
    }

    for rule in &rule_set.rules {
        if let (Some(min), Some(max)) = (rule.age_band_min, rule.age_band_max) {
            if min > max {
                errors.push(format!(
                    "rule '{}': age band {}..{} is inverted",
                    rule.name, min, max
                ));
            }
        }

        for leaf in rule.predicate.leaves() {
            if let Err(message) = validate_leaf(leaf, rule_set, catalog) {
                errors.push(format!("rule '{}': {}", rule.name, message));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(UnderwritingError::Configuration(errors.join("; ")))
    }
}

/// Check one predicate leaf: field resolution, arity, operand type
fn validate_leaf(
    leaf: &Comparison,
    rule_set: &RuleSet,
    catalog: &ConditionCatalog,
) -> Result<(), String> {
    let expected_kind = resolve_field_kind(&leaf.field, rule_set, catalog)?;
    validate_operands(leaf, expected_kind)
}

/// Resolve a field reference to the answer kind it must carry
///
/// Intrinsic fields resolve for every scope. Condition fields
/// (`"{code}.{key}"`) resolve only inside a condition-scoped set targeting
/// that same condition; product- and carrier-scoped rules screen on
/// intrinsics alone.
fn resolve_field_kind(
    field: &str,
    rule_set: &RuleSet,
    catalog: &ConditionCatalog,
) -> Result<QuestionKind, String> {
    match field {
        "applicant.age" => return Ok(QuestionKind::Numeric),
        "applicant.gender" => return Ok(QuestionKind::Choice),
        "applicant.tobacco" => return Ok(QuestionKind::Boolean),
        _ => {}
    }

    let (code, key) = field
        .split_once('.')
        .ok_or_else(|| format!("unresolvable field reference: {}", field))?;

    let target = rule_set
        .condition_code
        .as_deref()
        .ok_or_else(|| format!(
            "field {} references a condition, but {} rules may only use intrinsic applicant fields",
            field,
            match rule_set.scope {
                RuleScope::Product => "product-scoped",
                RuleScope::Carrier => "carrier-scoped",
                RuleScope::Condition => "condition-scoped",
            }
        ))?;

    if code != target {
        return Err(format!(
            "field {} references condition {}, but this rule set targets {}",
            field, code, target
        ));
    }

    let condition = catalog
        .get(code)
        .ok_or_else(|| format!("unknown condition code: {}", code))?;
    let question = condition
        .question(key)
        .ok_or_else(|| format!("condition {} has no follow-up question '{}'", code, key))?;

    Ok(question.kind)
}

/// Check operand arity for the operator and operand type against the schema
fn validate_operands(leaf: &Comparison, expected: QuestionKind) -> Result<(), String> {
    let check_kind = |value: &FieldValue| -> Result<(), String> {
        let matches = matches!(
            (expected, value),
            (QuestionKind::Numeric, FieldValue::Number(_))
                | (QuestionKind::Choice, FieldValue::Text(_))
                | (QuestionKind::Boolean, FieldValue::Bool(_))
                | (QuestionKind::Date, FieldValue::Date(_))
        );
        if matches {
            Ok(())
        } else {
            Err(format!(
                "field {} expects a {:?} operand, got {}",
                leaf.field,
                expected,
                value.kind_name()
            ))
        }
    };

    match leaf.op {
        CompareOp::Eq | CompareOp::Neq | CompareOp::Lt | CompareOp::Lte | CompareOp::Gt
        | CompareOp::Gte => {
            let value = leaf
                .value
                .single()
                .ok_or_else(|| format!("{:?} on {} requires a single operand", leaf.op, leaf.field))?;
            if leaf.op.is_relational()
                && !matches!(expected, QuestionKind::Numeric | QuestionKind::Date)
            {
                return Err(format!(
                    "{:?} on {} requires an ordered field (numeric or date)",
                    leaf.op, leaf.field
                ));
            }
            check_kind(value)
        }
        CompareOp::In => {
            let values = leaf
                .value
                .list()
                .filter(|values| !values.is_empty())
                .ok_or_else(|| format!("in on {} requires a non-empty value list", leaf.field))?;
            values.iter().try_for_each(check_kind)
        }
        CompareOp::Between => {
            let (min, max) = leaf.value.range().ok_or_else(|| {
                format!("between on {} requires exactly [min, max]", leaf.field)
            })?;
            if !matches!(expected, QuestionKind::Numeric | QuestionKind::Date) {
                return Err(format!(
                    "between on {} requires an ordered field (numeric or date)",
                    leaf.field
                ));
            }
            check_kind(min)?;
            check_kind(max)
        }
    }
}
