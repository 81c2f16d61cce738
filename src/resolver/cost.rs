//! Per-unit cost sharing for one person's use of one service
//!
//! Units are processed one at a time (the trailing fractional unit scaled by
//! its fraction) because the per-use cost cap applies to each visit and not to
//! the aggregate count. Every draw is bounded by the ledger's availability
//! check before it is consumed, so the ledger never goes negative.

use log::trace;

use crate::config::{CategoryIndex, ChargeType, CompiledPlan, CoverageEntry, DeductibleTiming, Service};
use crate::ledger::QuotaLedger;
use crate::money::{add_cents, round_cents, sub_cents};

use super::records::{ChargeBreakdown, CoverageEntryCosts, ServiceCostRecord};

/// Counts below this are treated as fully processed
const COUNT_EPSILON: f64 = 1e-9;

/// Resolves service costs for one plan against that plan's ledger
pub struct ServiceCostResolver<'a> {
    plan: &'a CompiledPlan,
    ledger: &'a mut QuotaLedger,
}

/// Remaining cost and per-use cap of the unit being charged
struct UnitState {
    cost_left: f64,
    cap_left: f64,
    charges: ChargeBreakdown,
}

impl UnitState {
    /// Member pays `amount` out of the unit cost
    fn take(&mut self, amount: f64) {
        self.cost_left = sub_cents(self.cost_left, amount);
        if self.cap_left.is_finite() {
            self.cap_left = sub_cents(self.cap_left, amount);
        }
    }
}

struct TierOutcome {
    processed: f64,
    limit_attained: bool,
}

impl<'a> ServiceCostResolver<'a> {
    pub fn new(plan: &'a CompiledPlan, ledger: &'a mut QuotaLedger) -> Self {
        Self { plan, ledger }
    }

    /// Charge `count` units of `service` (service index `service_index`,
    /// category `category`) at `unit_cost` to household member `person`
    pub fn resolve(
        &mut self,
        person: usize,
        service_index: usize,
        service: &Service,
        category: CategoryIndex,
        unit_cost: f64,
        count: f64,
    ) -> ServiceCostRecord {
        // dollar-denominated utilization: one unit costing the stored count
        let (unit_cost, count) = if service.is_additional_services_dollars(unit_cost) {
            (round_cents(count.max(0.0)), 1.0)
        } else {
            (round_cents(unit_cost.max(0.0)), count.max(0.0))
        };

        let mut record = ServiceCostRecord::new(person, &service.id, category, unit_cost, count);
        let plan = self.plan;
        let tiers = &plan.coverage[service_index];
        let mut remaining = count;

        for (entry_index, entry) in tiers.iter().enumerate() {
            if remaining <= COUNT_EPSILON {
                break;
            }
            let is_last = entry_index + 1 == tiers.len();
            let covered = entry.covered_count(remaining, unit_cost);
            remaining = (remaining - covered).max(0.0);

            let mut costs = CoverageEntryCosts::new(entry_index);
            let outcome = self.charge_tier(person, category, entry, unit_cost, covered, &mut costs);

            let mut uncovered = (covered - outcome.processed).max(0.0);
            if entry.not_covered || is_last || outcome.limit_attained {
                uncovered += remaining;
                remaining = 0.0;
            }
            if uncovered > COUNT_EPSILON {
                costs.add_not_covered(uncovered, unit_cost);
            }
            record.push_entry(costs);

            if outcome.limit_attained {
                record.combined_limit_attained = true;
                trace!(
                    "Combined limit attained on {} for person {} in plan {}",
                    service.id,
                    person,
                    plan.plan_id
                );
                break;
            }
        }

        record
    }

    fn charge_tier(
        &mut self,
        person: usize,
        category: CategoryIndex,
        entry: &CoverageEntry,
        unit_cost: f64,
        covered: f64,
        costs: &mut CoverageEntryCosts,
    ) -> TierOutcome {
        let mut processed = 0.0;
        let mut left = covered;

        while left > COUNT_EPSILON {
            if let Some(limit_id) = &entry.combined_limit_id {
                if self.ledger.combined_available(limit_id, person) <= 0.0 {
                    return TierOutcome {
                        processed,
                        limit_attained: true,
                    };
                }
            }

            let fraction = left.min(1.0);
            let (charges, attained) = self.charge_unit(person, category, entry, unit_cost, fraction);
            costs.covered_count += fraction;
            costs.charges.add(&charges);
            processed += fraction;
            left -= fraction;

            if attained {
                return TierOutcome {
                    processed,
                    limit_attained: true,
                };
            }
        }

        TierOutcome {
            processed,
            limit_attained: false,
        }
    }

    /// Charge one unit (or a trailing fraction of one); returns the unit's
    /// breakdown and whether it exhausted the tier's combined limit
    fn charge_unit(
        &mut self,
        person: usize,
        category: CategoryIndex,
        entry: &CoverageEntry,
        unit_cost: f64,
        fraction: f64,
    ) -> (ChargeBreakdown, bool) {
        let mut unit = UnitState {
            cost_left: round_cents(unit_cost * fraction),
            cap_left: entry
                .single_use_cost_max
                .map_or(f64::INFINITY, |max| round_cents(max.max(0.0) * fraction)),
            charges: ChargeBreakdown::default(),
        };

        match entry.deductible_timing() {
            DeductibleTiming::BeforeCopay => {
                self.draw_deductible(person, category, &mut unit);
                self.draw_copay(person, category, entry, fraction, &mut unit);
            }
            DeductibleTiming::AfterCopay | DeductibleTiming::BeforeCoinsurance => {
                self.draw_copay(person, category, entry, fraction, &mut unit);
                self.draw_deductible(person, category, &mut unit);
            }
            DeductibleTiming::NotApplied => {
                self.draw_copay(person, category, entry, fraction, &mut unit);
            }
        }
        self.draw_coinsurance(person, category, entry, fraction, &mut unit);

        let attained = self.reimburse(person, entry, &mut unit);

        if let Some(premium) = entry.additional_premium {
            unit.charges.additional_premium = round_cents(premium.max(0.0) * fraction);
        }

        (unit.charges, attained)
    }

    fn draw_deductible(&mut self, person: usize, category: CategoryIndex, unit: &mut UnitState) {
        let plan = self.plan;
        let deductible_groups = &plan.deductible_groups[category];
        if !self.ledger.has_pools(deductible_groups, person, ChargeType::Deductible) {
            return;
        }
        let oop_groups = &plan.oop_groups[category];

        let capacity = self
            .ledger
            .available_for(deductible_groups, person, ChargeType::Deductible)
            .min(self.ledger.available_for(oop_groups, person, ChargeType::Deductible));
        let amount = round_cents(capacity.min(unit.cost_left).min(unit.cap_left).max(0.0));
        if amount <= 0.0 {
            return;
        }

        self.ledger
            .consume_matching(deductible_groups, person, ChargeType::Deductible, amount);
        self.ledger
            .consume_matching(oop_groups, person, ChargeType::Deductible, amount);
        unit.take(amount);
        unit.charges.deductible = add_cents(unit.charges.deductible, amount);
    }

    fn draw_copay(
        &mut self,
        person: usize,
        category: CategoryIndex,
        entry: &CoverageEntry,
        fraction: f64,
        unit: &mut UnitState,
    ) {
        let Some(copay) = entry.copay else {
            return;
        };
        let nominal = copay.max(0.0) * fraction;
        let amount = self.bounded_draw(
            person,
            category,
            ChargeType::Copay,
            nominal,
            !entry.copay_not_towards_oop_max,
            unit,
        );
        unit.charges.copay = add_cents(unit.charges.copay, amount);
    }

    fn draw_coinsurance(
        &mut self,
        person: usize,
        category: CategoryIndex,
        entry: &CoverageEntry,
        fraction: f64,
        unit: &mut UnitState,
    ) {
        let Some(rate) = entry.coinsurance else {
            return;
        };
        let mut nominal = rate.max(0.0) * unit.cost_left;
        if let Some(min) = entry.coinsurance_min_dollar {
            nominal = nominal.max(min * fraction);
        }
        if let Some(max) = entry.coinsurance_max_dollar {
            nominal = nominal.min(max * fraction);
        }
        let amount = self.bounded_draw(
            person,
            category,
            ChargeType::Coinsurance,
            nominal,
            !entry.coinsurance_not_towards_oop_max,
            unit,
        );
        unit.charges.coinsurance = add_cents(unit.charges.coinsurance, amount);
    }

    /// Clamp a copay/coinsurance amount to the cost left, the per-use cap and
    /// (when it counts towards the OOP maximum) the OOP capacity, then draw it
    fn bounded_draw(
        &mut self,
        person: usize,
        category: CategoryIndex,
        charge_type: ChargeType,
        nominal: f64,
        towards_oop_max: bool,
        unit: &mut UnitState,
    ) -> f64 {
        let plan = self.plan;
        let oop_groups = &plan.oop_groups[category];

        let mut amount = nominal.min(unit.cost_left).min(unit.cap_left);
        if towards_oop_max {
            amount = amount.min(self.ledger.available_for(oop_groups, person, charge_type));
        }
        let amount = round_cents(amount.max(0.0));
        if amount <= 0.0 {
            return 0.0;
        }

        if towards_oop_max {
            self.ledger.consume_matching(oop_groups, person, charge_type, amount);
        }
        unit.take(amount);
        amount
    }

    /// Plan pays what is left, up to the combined limit; returns true when
    /// this unit exhausted the limit
    fn reimburse(&mut self, person: usize, entry: &CoverageEntry, unit: &mut UnitState) -> bool {
        let reimbursable = unit.cost_left;
        let Some(limit_id) = &entry.combined_limit_id else {
            unit.charges.reimbursed = reimbursable;
            return false;
        };

        let available = self.ledger.combined_available(limit_id, person);
        let paid = round_cents(reimbursable.min(available).max(0.0));
        unit.charges.reimbursed = paid;
        unit.charges.expenses_not_covered = sub_cents(reimbursable, paid);

        if paid > 0.0 {
            self.ledger.consume_combined(limit_id, person, paid)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::{single_category_config, test_key};
    use crate::config::{BenefitsConfig, CompiledConfig};
    use crate::ledger::{PoolKey, PoolScope};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use serde_json::json;

    struct Fixture {
        config: BenefitsConfig,
        compiled: CompiledConfig,
        ledger: QuotaLedger,
    }

    impl Fixture {
        fn new(services: serde_json::Value, plan: serde_json::Value, household_size: usize) -> Self {
            let config = single_category_config(services, plan);
            let compiled = CompiledConfig::compile(&config).unwrap();
            let ledger = QuotaLedger::for_plan(&config.plans[0], &test_key(), household_size).unwrap();
            Self {
                config,
                compiled,
                ledger,
            }
        }

        fn resolve(&mut self, person: usize, service_id: &str, count: f64) -> ServiceCostRecord {
            let index = self
                .config
                .services
                .iter()
                .position(|s| s.id == service_id)
                .unwrap();
            let service = &self.config.services[index];
            let unit_cost = service.cost.resolve(&test_key(), "service cost").unwrap();
            let mut resolver = ServiceCostResolver::new(self.compiled.plan(0), &mut self.ledger);
            resolver.resolve(person, index, service, 0, unit_cost, count)
        }

        fn available(&self, group: &str, scope: PoolScope) -> f64 {
            self.ledger.pool(&PoolKey::new(group, scope)).unwrap().available
        }
    }

    fn deductible_plan(coverage: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "plan",
            "deductibles": [ { "id": "ded", "categories": ["medical"], "person": 200 } ],
            "outOfPocketMaximums": [ { "id": "oop", "categories": ["medical"], "person": 1000 } ],
            "premiums": { "employee": 0 },
            "coverages": { "surgery": coverage }
        })
    }

    #[test]
    fn test_single_deductible_scenario() {
        let mut fx = Fixture::new(
            json!([ { "id": "surgery", "categoryId": "medical", "cost": 500 } ]),
            deductible_plan(json!({ "deductible": "beforeCopay", "coinsurance": 0.2 })),
            1,
        );

        let record = fx.resolve(0, "surgery", 1.0);

        assert_eq!(record.totals.deductible, 200.0);
        assert_eq!(record.totals.coinsurance, 60.0);
        assert_eq!(record.totals.reimbursed, 240.0);
        assert_eq!(record.totals.expenses_not_covered, 0.0);
        assert_eq!(fx.available("ded", PoolScope::Person(0)), 0.0);
        assert_eq!(fx.available("oop", PoolScope::Person(0)), 740.0);
        assert!(fx.ledger.pool(&PoolKey::new("ded", PoolScope::Person(0))).unwrap().limit_met);
    }

    #[test]
    fn test_combined_limit_exhaustion_scenario() {
        let plan = json!({
            "id": "plan",
            "combinedLimits": [ { "id": "therapy", "personReimburseLimit": 100 } ],
            "premiums": { "employee": 0 },
            "coverages": {
                "massage": { "combinedLimitId": "therapy" },
                "chiropractic": { "combinedLimitId": "therapy" }
            }
        });
        let mut fx = Fixture::new(
            json!([
                { "id": "massage", "categoryId": "medical", "cost": 80 },
                { "id": "chiropractic", "categoryId": "medical", "cost": 50 }
            ]),
            plan,
            1,
        );

        let first = fx.resolve(0, "massage", 1.0);
        assert_eq!(first.totals.reimbursed, 80.0);
        assert!(!first.combined_limit_attained);
        assert_eq!(fx.ledger.combined_available("therapy", 0), 20.0);

        let second = fx.resolve(0, "chiropractic", 1.0);
        assert_eq!(second.totals.reimbursed, 20.0);
        assert_eq!(second.totals.expenses_not_covered, 30.0);
        assert!(second.combined_limit_attained);
    }

    #[test]
    fn test_combined_limit_stops_remaining_units() {
        let plan = json!({
            "id": "plan",
            "combinedLimits": [ { "id": "therapy", "personReimburseLimit": 100 } ],
            "premiums": { "employee": 0 },
            "coverages": {
                "massage": [ { "combinedLimitId": "therapy" }, { "copay": 10 } ]
            }
        });
        let mut fx = Fixture::new(json!([ { "id": "massage", "categoryId": "medical", "cost": 60 } ]), plan, 1);

        let record = fx.resolve(0, "massage", 4.0);

        // 60 reimbursed, then 40 of the second visit; the last two visits are
        // not covered and the second tier is never reached
        assert_eq!(record.entries.len(), 1);
        assert_eq!(record.totals.reimbursed, 100.0);
        assert_eq!(record.totals.expenses_not_covered, 140.0);
        assert_eq!(record.entries[0].covered_count, 2.0);
        assert_eq!(record.entries[0].not_covered_count, 2.0);
        assert!(record.combined_limit_attained);
    }

    #[test]
    fn test_copay_then_deductible_order() {
        let mut fx = Fixture::new(
            json!([ { "id": "surgery", "categoryId": "medical", "cost": 500 } ]),
            deductible_plan(json!({ "deductible": "afterCopay", "copay": 50, "coinsurance": 0.1 })),
            1,
        );

        let record = fx.resolve(0, "surgery", 1.0);

        assert_eq!(record.totals.copay, 50.0);
        assert_eq!(record.totals.deductible, 200.0);
        assert_eq!(record.totals.coinsurance, 25.0);
        assert_eq!(record.totals.reimbursed, 225.0);
        assert_eq!(fx.available("oop", PoolScope::Person(0)), 725.0);
    }

    #[test]
    fn test_unset_timing_draws_deductible_after_copay() {
        let mut fx = Fixture::new(
            json!([ { "id": "surgery", "categoryId": "medical", "cost": 500 } ]),
            deductible_plan(json!({ "copay": 50, "coinsurance": 0.2 })),
            1,
        );

        let record = fx.resolve(0, "surgery", 1.0);

        assert_eq!(record.totals.copay, 50.0);
        assert_eq!(record.totals.deductible, 200.0);
        assert_eq!(record.totals.coinsurance, 50.0);
        assert_eq!(record.totals.reimbursed, 200.0);
        assert_eq!(fx.available("ded", PoolScope::Person(0)), 0.0);
    }

    #[test]
    fn test_explicit_none_timing_skips_deductible() {
        let mut fx = Fixture::new(
            json!([ { "id": "surgery", "categoryId": "medical", "cost": 500 } ]),
            deductible_plan(json!({ "deductible": "none", "copay": 50, "coinsurance": 0.2 })),
            1,
        );

        let record = fx.resolve(0, "surgery", 1.0);

        assert_eq!(record.totals.deductible, 0.0);
        assert_eq!(record.totals.coinsurance, 90.0);
        assert_eq!(fx.available("ded", PoolScope::Person(0)), 200.0);
    }

    #[test]
    fn test_coinsurance_min_dollar_clamp() {
        let plan = json!({
            "id": "plan",
            "premiums": { "employee": 0 },
            "coverages": { "visit": { "coinsurance": 0.1, "coinsuranceMinDollar": 25 } }
        });
        let mut fx = Fixture::new(json!([ { "id": "visit", "categoryId": "medical", "cost": 100 } ]), plan, 1);

        let record = fx.resolve(0, "visit", 1.5);

        // 25 for the full visit, 12.50 for the half visit
        assert_eq!(record.totals.coinsurance, 37.5);
        assert_eq!(record.totals.reimbursed, 112.5);
    }

    #[test]
    fn test_coinsurance_max_dollar_clamp() {
        let plan = json!({
            "id": "plan",
            "premiums": { "employee": 0 },
            "coverages": { "scan": { "coinsurance": 0.5, "coinsuranceMaxDollar": 30 } }
        });
        let mut fx = Fixture::new(json!([ { "id": "scan", "categoryId": "medical", "cost": 200 } ]), plan, 1);

        let record = fx.resolve(0, "scan", 2.0);

        assert_eq!(record.totals.coinsurance, 60.0);
        assert_eq!(record.totals.reimbursed, 340.0);
    }

    #[test]
    fn test_family_combined_limit_shared_across_members() {
        let plan = json!({
            "id": "plan",
            "combinedLimits": [
                { "id": "therapy", "personReimburseLimit": 100, "familyReimburseLimit": 150 }
            ],
            "premiums": { "employee": 0 },
            "coverages": { "massage": { "combinedLimitId": "therapy" } }
        });
        let mut fx = Fixture::new(json!([ { "id": "massage", "categoryId": "medical", "cost": 80 } ]), plan, 2);

        let first = fx.resolve(0, "massage", 2.0);
        assert_eq!(first.totals.reimbursed, 100.0);
        assert_eq!(first.totals.expenses_not_covered, 60.0);
        assert!(first.combined_limit_attained);
        assert_eq!(fx.ledger.combined_available("therapy", 1), 50.0);

        // the second member's own limit is untouched but the family limit binds
        let second = fx.resolve(1, "massage", 1.0);
        assert_eq!(second.totals.reimbursed, 50.0);
        assert_eq!(second.totals.expenses_not_covered, 30.0);
        assert!(second.combined_limit_attained);
        assert_eq!(fx.ledger.combined_available("therapy", 0), 0.0);
    }

    #[test]
    fn test_oop_max_caps_cost_sharing() {
        let plan = json!({
            "id": "plan",
            "outOfPocketMaximums": [ { "id": "oop", "categories": ["medical"], "person": 100 } ],
            "premiums": { "employee": 0 },
            "coverages": { "visit": { "copay": 40 } }
        });
        let mut fx = Fixture::new(json!([ { "id": "visit", "categoryId": "medical", "cost": 150 } ]), plan, 1);

        let record = fx.resolve(0, "visit", 4.0);

        assert_eq!(record.totals.copay, 100.0);
        assert_eq!(record.totals.reimbursed, 500.0);
        assert_eq!(fx.available("oop", PoolScope::Person(0)), 0.0);
        assert!(fx.ledger.pool(&PoolKey::new("oop", PoolScope::Person(0))).unwrap().limit_met);
    }

    #[test]
    fn test_copay_not_towards_oop_max_bypasses_pool() {
        let plan = json!({
            "id": "plan",
            "outOfPocketMaximums": [ { "id": "oop", "categories": ["medical"], "person": 100 } ],
            "premiums": { "employee": 0 },
            "coverages": { "visit": { "copay": 40, "copayNotTowardsOOPMax": true } }
        });
        let mut fx = Fixture::new(json!([ { "id": "visit", "categoryId": "medical", "cost": 150 } ]), plan, 1);

        let record = fx.resolve(0, "visit", 4.0);

        assert_eq!(record.totals.copay, 160.0);
        assert_eq!(fx.available("oop", PoolScope::Person(0)), 100.0);
    }

    #[test]
    fn test_family_pool_shared_across_members() {
        let plan = json!({
            "id": "plan",
            "deductibles": [ { "id": "ded", "categories": ["medical"], "person": 300, "family": 400 } ],
            "premiums": { "employee": 0 },
            "coverages": { "surgery": { "deductible": "beforeCoinsurance" } }
        });
        let mut fx = Fixture::new(json!([ { "id": "surgery", "categoryId": "medical", "cost": 500 } ]), plan, 2);

        let first = fx.resolve(0, "surgery", 1.0);
        let second = fx.resolve(1, "surgery", 1.0);

        assert_eq!(first.totals.deductible, 300.0);
        assert_eq!(second.totals.deductible, 100.0);
        assert_eq!(fx.available("ded", PoolScope::Family), 0.0);
        assert_eq!(fx.available("ded", PoolScope::Person(1)), 200.0);
    }

    #[test]
    fn test_single_use_cap_applies_per_visit() {
        let plan = json!({
            "id": "plan",
            "premiums": { "employee": 0 },
            "coverages": { "visit": { "coinsurance": 0.5, "singleUseCostMax": 30 } }
        });
        let mut fx = Fixture::new(json!([ { "id": "visit", "categoryId": "medical", "cost": 100 } ]), plan, 1);

        let record = fx.resolve(0, "visit", 3.0);

        assert_eq!(record.totals.coinsurance, 90.0);
        assert_eq!(record.totals.reimbursed, 210.0);
    }

    #[test]
    fn test_fractional_unit_scales_copay() {
        let plan = json!({
            "id": "plan",
            "premiums": { "employee": 0 },
            "coverages": { "visit": { "copay": 20, "additionalPremium": 10 } }
        });
        let mut fx = Fixture::new(json!([ { "id": "visit", "categoryId": "medical", "cost": 100 } ]), plan, 1);

        let record = fx.resolve(0, "visit", 2.5);

        assert_eq!(record.totals.copay, 50.0);
        assert_eq!(record.totals.reimbursed, 200.0);
        assert_eq!(record.totals.additional_premium, 25.0);
        assert_relative_eq!(record.entries[0].covered_count, 2.5);
    }

    #[test]
    fn test_tiers_pass_remaining_count_forward() {
        let plan = json!({
            "id": "plan",
            "premiums": { "employee": 0 },
            "coverages": {
                "therapy": [
                    { "copay": 10, "coveredCount": 2 },
                    { "coinsurance": 0.5, "dollarLimit": 100 }
                ]
            }
        });
        let mut fx = Fixture::new(json!([ { "id": "therapy", "categoryId": "medical", "cost": 50 } ]), plan, 1);

        let record = fx.resolve(0, "therapy", 5.0);

        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.entries[0].covered_count, 2.0);
        assert_eq!(record.entries[0].charges.copay, 20.0);
        assert_eq!(record.entries[1].covered_count, 2.0);
        assert_eq!(record.entries[1].charges.coinsurance, 50.0);
        // last tier reports its uncovered tail
        assert_eq!(record.entries[1].not_covered_count, 1.0);
        assert_eq!(record.totals.expenses_not_covered, 50.0);
        assert_eq!(record.totals.service_cost(), record.gross_cost());
    }

    #[test]
    fn test_not_covered_tier_ends_sequence() {
        let plan = json!({
            "id": "plan",
            "premiums": { "employee": 0 },
            "coverages": {
                "cosmetic": [ { "notCovered": true }, { "copay": 5 } ]
            }
        });
        let mut fx = Fixture::new(json!([ { "id": "cosmetic", "categoryId": "medical", "cost": 250 } ]), plan, 1);

        let record = fx.resolve(0, "cosmetic", 2.0);

        assert_eq!(record.entries.len(), 1);
        assert_eq!(record.totals.expenses_not_covered, 500.0);
        assert_eq!(record.totals.copay, 0.0);
    }

    #[test]
    fn test_additional_services_dollars_single_unit() {
        let plan = json!({
            "id": "plan",
            "premiums": { "employee": 0 },
            "coverages": { "additionalServicesDental": { "coinsurance": 0.2 } }
        });
        let mut fx = Fixture::new(
            json!([ { "id": "additionalServicesDental", "categoryId": "medical", "cost": 1 } ]),
            plan,
            1,
        );

        let record = fx.resolve(0, "additionalServicesDental", 750.0);

        assert_eq!(record.count, 1.0);
        assert_eq!(record.unit_cost, 750.0);
        assert_eq!(record.totals.coinsurance, 150.0);
        assert_eq!(record.totals.reimbursed, 600.0);
    }

    #[test]
    fn test_zero_count_produces_no_charges() {
        let mut fx = Fixture::new(
            json!([ { "id": "surgery", "categoryId": "medical", "cost": 500 } ]),
            deductible_plan(json!({ "deductible": "beforeCopay", "coinsurance": 0.2 })),
            1,
        );

        let record = fx.resolve(0, "surgery", 0.0);

        assert!(record.entries.is_empty());
        assert_eq!(record.totals, ChargeBreakdown::default());
        assert_eq!(fx.available("ded", PoolScope::Person(0)), 200.0);
    }

    proptest! {
        #[test]
        fn prop_service_cost_is_conserved(
            unit_cost in 1u32..2_000,
            count in 0u32..12,
            copay in 0u32..100,
            rate in 0u32..=100,
            deductible in 0u32..3_000,
            oop in 0u32..5_000,
            cap in proptest::option::of(1u32..500),
        ) {
            let mut coverage = json!({
                "deductible": "beforeCopay",
                "copay": copay,
                "coinsurance": f64::from(rate) / 100.0,
            });
            if let Some(cap) = cap {
                coverage["singleUseCostMax"] = json!(cap);
            }
            let plan = json!({
                "id": "plan",
                "deductibles": [ { "id": "ded", "categories": ["medical"], "person": deductible } ],
                "outOfPocketMaximums": [ { "id": "oop", "categories": ["medical"], "person": oop } ],
                "premiums": { "employee": 0 },
                "coverages": { "service": coverage }
            });
            let mut fx = Fixture::new(
                json!([ { "id": "service", "categoryId": "medical", "cost": unit_cost } ]),
                plan,
                1,
            );

            let record = fx.resolve(0, "service", f64::from(count));

            prop_assert!((record.totals.service_cost() - record.gross_cost()).abs() < 0.005);
            prop_assert!(fx.available("oop", PoolScope::Person(0)) >= 0.0);
            prop_assert!(record.totals.cost_sharing() <= f64::from(oop) + 0.005);
        }
    }
}
