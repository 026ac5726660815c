//! Compound predicate language and its evaluator
//!
//! A predicate is a recursive boolean expression tree over the applicant fact
//! map: leaves compare one field against a literal, interior nodes combine
//! children with all/any/not. Evaluation is a pure function of
//! (predicate, context), with no clock reads and no global state, so the same
//! inputs always produce the same verdict.
//!
//! Missing-field policy: a leaf whose field is absent from the context
//! evaluates to `false` for every operator ("answer not provided" means the
//! branch does not match). Note the consequence for `Not`: a negated leaf
//! over an absent field evaluates to `true`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::applicant::{ApplicantContext, FieldValue};

/// Comparison operator for a predicate leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Membership in a value list
    In,
    /// Inclusive range check; requires a two-element list `[min, max]`
    Between,
}

impl CompareOp {
    /// Operators that need an ordered comparison (numbers or dates)
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            CompareOp::Lt | CompareOp::Lte | CompareOp::Gt | CompareOp::Gte | CompareOp::Between
        )
    }
}

/// Literal operand of a leaf: a single value, or a list for `In`/`Between`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComparisonValue {
    Single(FieldValue),
    List(Vec<FieldValue>),
}

impl ComparisonValue {
    pub fn single(&self) -> Option<&FieldValue> {
        match self {
            ComparisonValue::Single(v) => Some(v),
            ComparisonValue::List(_) => None,
        }
    }

    pub fn list(&self) -> Option<&[FieldValue]> {
        match self {
            ComparisonValue::Single(_) => None,
            ComparisonValue::List(values) => Some(values),
        }
    }

    /// The `[min, max]` pair for `Between`
    pub fn range(&self) -> Option<(&FieldValue, &FieldValue)> {
        match self.list() {
            Some([min, max]) => Some((min, max)),
            _ => None,
        }
    }
}

/// A predicate leaf: one field compared against a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Flattened fact key: `applicant.*` intrinsics or `{code}.{key}` answers
    pub field: String,
    pub op: CompareOp,
    pub value: ComparisonValue,
}

impl Comparison {
    /// Evaluate against the fact map
    ///
    /// Absent fields and type mismatches evaluate to `false`; arity problems
    /// (e.g. `Between` without a two-element list) also evaluate to `false`
    /// here because they are rejected earlier, at rule save-time.
    pub fn evaluate(&self, ctx: &ApplicantContext) -> bool {
        let actual = match ctx.fact(&self.field) {
            Some(value) => value,
            None => return false,
        };

        match self.op {
            CompareOp::Eq => self
                .value
                .single()
                .is_some_and(|expected| actual.same_kind(expected) && actual == expected),
            CompareOp::Neq => self
                .value
                .single()
                .is_some_and(|expected| actual.same_kind(expected) && actual != expected),
            CompareOp::Lt => self.relational(actual, Ordering::is_lt),
            CompareOp::Lte => self.relational(actual, Ordering::is_le),
            CompareOp::Gt => self.relational(actual, Ordering::is_gt),
            CompareOp::Gte => self.relational(actual, Ordering::is_ge),
            CompareOp::In => self
                .value
                .list()
                .is_some_and(|values| values.iter().any(|v| actual.same_kind(v) && actual == v)),
            CompareOp::Between => self.value.range().is_some_and(|(min, max)| {
                matches!(actual.compare(min), Some(ord) if ord.is_ge())
                    && matches!(actual.compare(max), Some(ord) if ord.is_le())
            }),
        }
    }

    fn relational(&self, actual: &FieldValue, accept: fn(Ordering) -> bool) -> bool {
        self.value
            .single()
            .and_then(|expected| actual.compare(expected))
            .is_some_and(accept)
    }
}

/// Recursive predicate expression tree
///
/// Serialized form is externally tagged: `{"leaf": {...}}`, `{"all": [...]}`,
/// `{"any": [...]}`, `{"not": {...}}`. An empty `all` group always matches
/// and is the canonical "no further criteria" predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Leaf(Comparison),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// A predicate that matches every context
    pub fn always() -> Self {
        Predicate::All(Vec::new())
    }

    /// Convenience constructor for a single-comparison predicate
    pub fn leaf(field: &str, op: CompareOp, value: ComparisonValue) -> Self {
        Predicate::Leaf(Comparison {
            field: field.to_string(),
            op,
            value,
        })
    }

    /// Evaluate the tree against a fact map
    ///
    /// `All` short-circuits on the first false child, `Any` on the first true
    /// child; `Not` inverts its single child.
    pub fn evaluate(&self, ctx: &ApplicantContext) -> bool {
        match self {
            Predicate::Leaf(comparison) => comparison.evaluate(ctx),
            Predicate::All(children) => children.iter().all(|child| child.evaluate(ctx)),
            Predicate::Any(children) => children.iter().any(|child| child.evaluate(ctx)),
            Predicate::Not(child) => !child.evaluate(ctx),
        }
    }

    /// All leaves in the tree, for save-time field validation
    pub fn leaves(&self) -> Vec<&Comparison> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Comparison>) {
        match self {
            Predicate::Leaf(comparison) => out.push(comparison),
            Predicate::All(children) | Predicate::Any(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            Predicate::Not(child) => child.collect_leaves(out),
        }
    }
}
