//! Coverage aggregation over live condition-scoped rule sets
//!
//! Derived state for configuration dashboards: which (carrier, product,
//! condition) triples have a live rule set, and how far along each carrier's
//! configuration is. Pure fold over already-loaded rule sets: nothing is
//! persisted, so there is no staleness to manage; recompute on demand.

use std::collections::{BTreeMap, BTreeSet};

use crate::rules::{RuleScope, RuleSet};

/// Condition codes with a live rule set, grouped by (carrier, product)
///
/// `product_id = None` entries are carrier-wide condition sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageMap {
    entries: BTreeMap<(u64, Option<u64>), BTreeSet<String>>,
}

impl CoverageMap {
    /// Conditions configured for one (carrier, product) pair
    pub fn conditions_for(&self, carrier_id: u64, product_id: Option<u64>) -> Option<&BTreeSet<String>> {
        self.entries.get(&(carrier_id, product_id))
    }

    /// All conditions configured anywhere under a carrier
    ///
    /// Set union across the carrier's products (and its carrier-wide
    /// entry), so the same condition configured per-product counts once.
    pub fn carrier_conditions(&self, carrier_id: u64) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|((carrier, _), _)| *carrier == carrier_id)
            .flat_map(|(_, codes)| codes.iter().cloned())
            .collect()
    }

    /// Iterate all (carrier, product) groups
    pub fn iter(&self) -> impl Iterator<Item = (&(u64, Option<u64>), &BTreeSet<String>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fold live condition-scoped rule sets into a coverage map
///
/// Only sets with scope=condition that are approved and active count;
/// draft, pending, rejected, and deactivated sets are invisible here exactly
/// as they are to runtime resolution.
pub fn compute_coverage<'a, I>(rule_sets: I) -> CoverageMap
where
    I: IntoIterator<Item = &'a RuleSet>,
{
    let mut entries: BTreeMap<(u64, Option<u64>), BTreeSet<String>> = BTreeMap::new();

    for set in rule_sets {
        if set.scope != RuleScope::Condition || !set.is_live() {
            continue;
        }
        let Some(code) = set.condition_code.as_ref() else {
            continue;
        };
        entries
            .entry((set.carrier_id, set.product_id))
            .or_default()
            .insert(code.clone());
    }

    CoverageMap { entries }
}

/// Percentage of the catalog configured, rounded to the nearest integer
///
/// `total_conditions` is the size of the full condition catalog, not the
/// count of conditions ever referenced.
pub fn percent_configured(configured: usize, total_conditions: usize) -> u32 {
    if total_conditions == 0 {
        return 0;
    }
    ((configured as f64 / total_conditions as f64) * 100.0).round() as u32
}
