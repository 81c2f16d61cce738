//! Least annual out-of-pocket exposure a plan guarantees
//!
//! First every coverage tier is scanned for cost the OOP maximum can never
//! cap. If none is found, OOP-maximum pools restricting every charge type are
//! combined pairwise (category-set union, amounts summed) until the cheapest
//! cover of every used category stops improving.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::{AmountKey, CategoryIndex, CompiledConfig, CompiledPlan, CoverageEntry, Plan, Service};
use crate::error::Result;
use crate::money::{add_cents, round_cents};

/// Closure passes before giving up on further improvement
pub const MAX_CLOSURE_PASSES: usize = 100;

/// Why a plan's exposure has no finite bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnboundedReason {
    AdditionalPremium,
    CopayNotTowardsOopMax,
    CoinsuranceNotTowardsOopMax,
    NotCovered,
    /// Last tier caps covered units or dollars, leaving an uncovered tail
    UncoveredTail,
    /// No combination of OOP-maximum pools covers every category
    Indeterminate,
}

/// One OOP-maximum pool contributing to a finite bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundPool {
    pub group_id: String,
    pub family: bool,

    /// Family limit, or person limit times household size
    pub amount: f64,
}

/// What a bound was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum BoundBasis {
    Pools {
        pools: Vec<BoundPool>,
    },
    #[serde(rename_all = "camelCase")]
    Unbounded {
        reason: UnboundedReason,
        service_id: Option<String>,
        entry_index: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorstCaseBound {
    /// `f64::INFINITY` when unbounded
    pub amount: f64,
    pub based_on: BoundBasis,
}

impl WorstCaseBound {
    pub(crate) fn unbounded(reason: UnboundedReason, service_id: Option<&str>, entry_index: Option<usize>) -> Self {
        Self {
            amount: f64::INFINITY,
            based_on: BoundBasis::Unbounded {
                reason,
                service_id: service_id.map(str::to_string),
                entry_index,
            },
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.amount.is_finite()
    }

    pub fn unbounded_reason(&self) -> Option<UnboundedReason> {
        match &self.based_on {
            BoundBasis::Unbounded { reason, .. } => Some(*reason),
            BoundBasis::Pools { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Combination {
    amount: f64,
    pools: Vec<BoundPool>,
}

/// Computes the worst-case bound of one plan
pub struct WorstCaseBoundCalculator<'a> {
    plan: &'a Plan,
    compiled_plan: &'a CompiledPlan,
    compiled: &'a CompiledConfig,
    services: &'a [Service],
}

impl<'a> WorstCaseBoundCalculator<'a> {
    pub fn new(
        plan: &'a Plan,
        compiled_plan: &'a CompiledPlan,
        compiled: &'a CompiledConfig,
        services: &'a [Service],
    ) -> Self {
        Self {
            plan,
            compiled_plan,
            compiled,
            services,
        }
    }

    pub fn calculate(&self, key: &AmountKey<'_>, household_size: usize) -> Result<WorstCaseBound> {
        if let Some(bound) = self.scan_unbounded(key)? {
            debug!("Plan {} worst case unbounded: {:?}", self.plan.id, bound.based_on);
            return Ok(bound);
        }

        let combinations = self.closure(self.seed_combinations(key, household_size)?);

        let required: BTreeSet<CategoryIndex> = (0..self.services.len())
            .map(|i| self.compiled.service_category(i))
            .collect();

        let bound = combinations
            .iter()
            .filter(|(set, _)| required.is_subset(set))
            .min_by(|a, b| a.1.amount.total_cmp(&b.1.amount))
            .map(|(_, combination)| WorstCaseBound {
                amount: combination.amount,
                based_on: BoundBasis::Pools {
                    pools: combination.pools.clone(),
                },
            })
            .unwrap_or_else(|| WorstCaseBound::unbounded(UnboundedReason::Indeterminate, None, None));

        debug!("Plan {} worst case bound {:.2}", self.plan.id, bound.amount);
        Ok(bound)
    }

    /// First tier (in service order) whose cost the OOP maximum cannot cap
    fn scan_unbounded(&self, key: &AmountKey<'_>) -> Result<Option<WorstCaseBound>> {
        for (service_index, service) in self.services.iter().enumerate() {
            let unit_cost = service.cost.resolve(key, &format!("service `{}` cost", service.id))?;
            let tiers = &self.compiled_plan.coverage[service_index];

            for (entry_index, entry) in tiers.iter().enumerate() {
                let is_last = entry_index + 1 == tiers.len();
                if let Some(reason) = unbounded_reason(entry, unit_cost, is_last) {
                    return Ok(Some(WorstCaseBound::unbounded(
                        reason,
                        Some(&service.id),
                        Some(entry_index),
                    )));
                }
            }
        }
        Ok(None)
    }

    /// Cheapest single pool for each category set; only pools restricting
    /// every charge type can bound exposure on their own
    fn seed_combinations(
        &self,
        key: &AmountKey<'_>,
        household_size: usize,
    ) -> Result<BTreeMap<BTreeSet<CategoryIndex>, Combination>> {
        let mut seeds = BTreeMap::new();

        for group in &self.plan.out_of_pocket_maximums {
            if !group.restricts_all_charge_types() {
                continue;
            }
            let categories: BTreeSet<CategoryIndex> = group
                .categories
                .iter()
                .filter_map(|c| self.compiled.category_index(c))
                .collect();

            if let Some(amount) = &group.person {
                let limit = amount.resolve(key, &format!("`{}` person amount", group.id))?;
                let total = round_cents(limit * household_size as f64);
                offer(&mut seeds, categories.clone(), vec![bound_pool(&group.id, false, total)]);
            }
            if let Some(amount) = &group.family {
                let limit = round_cents(amount.resolve(key, &format!("`{}` family amount", group.id))?);
                offer(&mut seeds, categories.clone(), vec![bound_pool(&group.id, true, limit)]);
            }
        }

        Ok(seeds)
    }

    fn closure(
        &self,
        mut combinations: BTreeMap<BTreeSet<CategoryIndex>, Combination>,
    ) -> BTreeMap<BTreeSet<CategoryIndex>, Combination> {
        for pass in 0..MAX_CLOSURE_PASSES {
            let snapshot: Vec<(BTreeSet<CategoryIndex>, Combination)> =
                combinations.iter().map(|(s, c)| (s.clone(), c.clone())).collect();
            let mut improved = false;

            for (i, (left_set, left)) in snapshot.iter().enumerate() {
                for (right_set, right) in &snapshot[i + 1..] {
                    let union: BTreeSet<CategoryIndex> = left_set.union(right_set).copied().collect();
                    let mut pools = left.pools.clone();
                    pools.extend(right.pools.iter().cloned());
                    improved |= offer(&mut combinations, union, pools);
                }
            }

            if !improved {
                return combinations;
            }
            if pass + 1 == MAX_CLOSURE_PASSES {
                warn!(
                    "Plan {} worst case closure stopped after {} passes",
                    self.plan.id, MAX_CLOSURE_PASSES
                );
            }
        }
        combinations
    }
}

fn bound_pool(group_id: &str, family: bool, amount: f64) -> BoundPool {
    BoundPool {
        group_id: group_id.to_string(),
        family,
        amount,
    }
}

/// Insert a combination if its category set is new or it is cheaper
fn offer(
    combinations: &mut BTreeMap<BTreeSet<CategoryIndex>, Combination>,
    categories: BTreeSet<CategoryIndex>,
    pools: Vec<BoundPool>,
) -> bool {
    let amount = pools.iter().fold(0.0, |sum, p| add_cents(sum, p.amount));
    match combinations.get(&categories) {
        Some(existing) if existing.amount <= amount => false,
        _ => {
            combinations.insert(categories, Combination { amount, pools });
            true
        }
    }
}

fn unbounded_reason(entry: &CoverageEntry, unit_cost: f64, is_last: bool) -> Option<UnboundedReason> {
    if entry.additional_premium.unwrap_or(0.0) > 0.0 {
        return Some(UnboundedReason::AdditionalPremium);
    }
    if entry.copay_not_towards_oop_max && entry.copay.unwrap_or(0.0) > 0.0 {
        return Some(UnboundedReason::CopayNotTowardsOopMax);
    }
    if entry.coinsurance_not_towards_oop_max
        && (entry.coinsurance.unwrap_or(0.0) > 0.0 || entry.coinsurance_min_dollar.unwrap_or(0.0) > 0.0)
    {
        return Some(UnboundedReason::CoinsuranceNotTowardsOopMax);
    }
    if unit_cost <= 0.0 {
        return None;
    }
    if entry.not_covered {
        return Some(UnboundedReason::NotCovered);
    }
    if is_last && entry.caps_coverage() {
        return Some(UnboundedReason::UncoveredTail);
    }
    None
}
