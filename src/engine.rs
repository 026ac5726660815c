//! Decision engine: scope fallback, outcome aggregation, and quoting
//!
//! The engine owns an immutable snapshot of already-loaded configuration
//! (catalog, rule sets, rates) and serves independent, stateless requests:
//! no locking, no I/O, safe to call from parallel workers. Callers that
//! refresh configuration swap in a new snapshot between requests.
//!
//! Scope fallback per declared condition: the live condition-scoped set for
//! the target product first, then the carrier-wide condition set. A condition
//! whose sets have no opinion defers to the product/carrier-wide screening
//! verdict; if that also has no opinion the condition falls back to the
//! configured default (refer to manual underwriting). Product- and
//! carrier-wide screens always run once per request, so age/tobacco
//! knockouts apply even to applicants with no declared conditions.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use crate::applicant::{ApplicantContext, ApplicantProfile};
use crate::catalog::{loader as catalog_loader, ConditionCatalog, ProductInfo};
use crate::error::UnderwritingError;
use crate::premium::{loader as rates_loader, rated_monthly_premium, PremiumBook, RateClass};
use crate::rules::{
    aggregate_outcomes, resolve, AggregateOutcome, Eligibility, HealthClass, MatchedRule, Outcome,
    Resolution, RuleScope, RuleSet,
};

/// Immutable configuration snapshot the engine evaluates against
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub catalog: ConditionCatalog,
    pub products: Vec<ProductInfo>,
    pub rule_sets: Vec<RuleSet>,
    pub rates: PremiumBook,
}

impl EngineSnapshot {
    /// Load a snapshot from a data directory
    ///
    /// Expects `catalog/conditions.json`, `catalog/products.csv`,
    /// `rules/rule_sets.json`, and `rates/premium_rates.csv` under `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self, Box<dyn Error>> {
        let catalog = catalog_loader::load_conditions(&dir.join("catalog"))?;
        let products = catalog_loader::load_products(&dir.join("catalog"))?;
        let rates = rates_loader::load_premium_book(&dir.join("rates"))?;

        let rules_file = std::fs::File::open(dir.join("rules").join("rule_sets.json"))?;
        let rule_sets: Vec<RuleSet> = serde_json::from_reader(rules_file)?;

        // Apply the save-time gate at ingest: a stored set with unresolvable
        // field references must never reach resolution
        for set in &rule_sets {
            crate::rules::validate_rule_set(set, &catalog)?;
        }

        Ok(Self {
            catalog,
            products,
            rule_sets,
            rates,
        })
    }

    /// Find a product by id
    pub fn product(&self, product_id: u64) -> Option<&ProductInfo> {
        self.products.iter().find(|p| p.id == product_id)
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Outcome applied when no rule set anywhere has an opinion
    pub default_outcome: Outcome,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_outcome: Outcome::refer("No matching rule - manual review required"),
        }
    }
}

/// A quote request for one (carrier, product) target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub carrier_id: u64,
    pub product_id: u64,
    pub face_amount: u64,
    /// Term length for term products; `None` for permanent products
    #[serde(default)]
    pub term_years: Option<u16>,
}

/// Which rule produced a finding, and from which scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingSource {
    pub scope: RuleScope,
    pub rule_set_id: u64,
    pub rule_id: u64,
    pub rule_name: String,
}

/// One contributing verdict: a condition's resolution, the applicant-wide
/// screen, or a fallback default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionFinding {
    /// `None` for the applicant-wide product/carrier screen
    pub condition_code: Option<String>,
    pub outcome: Outcome,
    /// `None` when the finding is the configured default, not a matched rule
    pub source: Option<FindingSource>,
}

/// Aggregated underwriting decision for one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: AggregateOutcome,
    pub findings: Vec<ConditionFinding>,
}

/// A decision plus the premium it prices to (when eligible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub decision: Decision,
    /// `None` when the applicant is referred or declined
    pub monthly_premium: Option<f64>,
}

/// The underwriting decision engine
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    snapshot: EngineSnapshot,
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new(snapshot: EngineSnapshot, config: EngineConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn snapshot(&self) -> &EngineSnapshot {
        &self.snapshot
    }

    /// The live rule set for a scope key, if configured
    ///
    /// The persistence layer guarantees at most one live set per key; if
    /// that invariant is ever violated by a data bug the lowest id wins,
    /// deterministically.
    fn live_set(
        &self,
        scope: RuleScope,
        carrier_id: u64,
        product_id: Option<u64>,
        condition_code: Option<&str>,
    ) -> Option<&RuleSet> {
        self.snapshot
            .rule_sets
            .iter()
            .filter(|set| {
                set.is_live()
                    && set.scope == scope
                    && set.carrier_id == carrier_id
                    && set.product_id == product_id
                    && set.condition_code.as_deref() == condition_code
            })
            .min_by_key(|set| set.id)
    }

    /// Resolve one declared condition through its scope chain
    fn resolve_condition(
        &self,
        ctx: &ApplicantContext,
        carrier_id: u64,
        product_id: u64,
        code: &str,
    ) -> Option<ConditionFinding> {
        let candidates = [
            self.live_set(RuleScope::Condition, carrier_id, Some(product_id), Some(code)),
            self.live_set(RuleScope::Condition, carrier_id, None, Some(code)),
        ];

        for set in candidates.into_iter().flatten() {
            if let Resolution::Matched(matched) = resolve(set, ctx) {
                return Some(finding(Some(code.to_string()), set, matched));
            }
            debug!(
                "condition {} rule set {} had no opinion, falling through",
                code, set.id
            );
        }
        None
    }

    /// Applicant-wide screen: product-scoped set first, then carrier-scoped
    fn resolve_screen(
        &self,
        ctx: &ApplicantContext,
        carrier_id: u64,
        product_id: u64,
    ) -> Option<ConditionFinding> {
        let candidates = [
            self.live_set(RuleScope::Product, carrier_id, Some(product_id), None),
            self.live_set(RuleScope::Carrier, carrier_id, None, None),
        ];

        for set in candidates.into_iter().flatten() {
            if let Resolution::Matched(matched) = resolve(set, ctx) {
                return Some(finding(None, set, matched));
            }
        }
        None
    }

    /// Evaluate an applicant against one (carrier, product) target
    pub fn decide(&self, profile: &ApplicantProfile, carrier_id: u64, product_id: u64) -> Decision {
        let ctx = ApplicantContext::from_profile(profile);
        let mut findings: Vec<ConditionFinding> = Vec::new();

        let screen = self.resolve_screen(&ctx, carrier_id, product_id);
        let screened = screen.is_some();
        findings.extend(screen);

        for code in profile.condition_codes() {
            match self.resolve_condition(&ctx, carrier_id, product_id, code) {
                Some(found) => findings.push(found),
                // No opinion anywhere in the chain: the applicant-wide screen
                // covers the condition if it matched; otherwise the condition
                // is unassessed and falls back to the configured default
                None if !screened => {
                    let mut outcome = self.config.default_outcome.clone();
                    outcome.concerns.push(format!("No applicable rule for {}", code));
                    findings.push(ConditionFinding {
                        condition_code: Some(code.to_string()),
                        outcome,
                        source: None,
                    });
                }
                None => {}
            }
        }

        let outcomes: Vec<&Outcome> = findings.iter().map(|f| &f.outcome).collect();
        let outcome = aggregate_outcomes(&outcomes)
            .unwrap_or_else(|| {
                // Nothing configured for this target at all
                let default = &self.config.default_outcome;
                AggregateOutcome {
                    eligibility: default.eligibility,
                    health_class: default.health_class,
                    table_rating: default.table_rating,
                    flat_extra_per_thousand: default.flat_extra_per_thousand,
                    flat_extra_years: default.flat_extra_years,
                    reasons: vec![default.reason.clone()],
                    concerns: default.concerns.clone(),
                }
            });

        Decision { outcome, findings }
    }

    /// Decide and, when eligible, price the request
    ///
    /// Referred and declined applicants produce no premium. An eligible
    /// applicant whose rate cannot be resolved from the stored grid is a
    /// hard `OutOfRange` failure; un-priced risk is never papered over.
    pub fn quote(
        &self,
        profile: &ApplicantProfile,
        request: &QuoteRequest,
    ) -> Result<Quote, UnderwritingError> {
        if let Some(product) = self.snapshot.product(request.product_id) {
            if !product.allows_term(request.term_years) {
                return Err(UnderwritingError::OutOfRange(format!(
                    "product {} does not offer term {:?}",
                    product.name, request.term_years
                )));
            }
        }

        let decision = self.decide(profile, request.carrier_id, request.product_id);
        if decision.outcome.eligibility != Eligibility::Accept {
            return Ok(Quote {
                decision,
                monthly_premium: None,
            });
        }

        let class = RateClass {
            gender: profile.gender,
            tobacco: profile.tobacco,
            health_class: decision.outcome.health_class.unwrap_or(HealthClass::Standard),
            term_years: request.term_years,
        };

        let base = match self.snapshot.rates.lookup(
            request.product_id,
            &class,
            profile.age,
            request.face_amount,
        ) {
            Ok(base) => base,
            Err(err) => {
                warn!(
                    "rate unavailable for product {} age {} face {}: {}",
                    request.product_id, profile.age, request.face_amount, err
                );
                return Err(err);
            }
        };

        let premium = rated_monthly_premium(
            base,
            decision.outcome.table_rating.units(),
            decision.outcome.flat_extra_per_thousand,
            request.face_amount,
        );

        Ok(Quote {
            decision,
            monthly_premium: Some(premium),
        })
    }
}

fn finding(condition_code: Option<String>, set: &RuleSet, matched: MatchedRule) -> ConditionFinding {
    ConditionFinding {
        condition_code,
        outcome: matched.outcome,
        source: Some(FindingSource {
            scope: set.scope,
            rule_set_id: set.id,
            rule_id: matched.rule_id,
            rule_name: matched.rule_name,
        }),
    }
}
