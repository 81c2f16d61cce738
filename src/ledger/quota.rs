//! Quota ledger for one plan evaluation
//!
//! Pools are keyed by group id and scope, so a person's charge can be bounded by
//! the minimum of their own pool and the family pool of the same group in a
//! single lookup. The ledger is built fresh for each plan evaluation and is
//! never shared between plans.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{Amount, AmountKey, ChargeType, Plan};
use crate::error::Result;

use super::pool::{CombinedLimitPool, PoolKey, PoolKind, PoolScope, QuotaPool};

/// State of a pool at the end of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatus {
    pub key: PoolKey,
    pub kind: PoolKind,
    pub limit: f64,
    pub used: f64,
    pub available: f64,
    pub limit_met: bool,
}

/// State of a combined limit at the end of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedLimitStatus {
    pub key: PoolKey,
    pub limit: f64,
    pub used: f64,
    pub available: f64,
    pub attained: bool,
}

/// Consumable deductible, OOP-maximum and combined-limit capacity
#[derive(Debug, Clone, Default)]
pub struct QuotaLedger {
    pools: BTreeMap<String, BTreeMap<PoolScope, QuotaPool>>,
    combined: BTreeMap<String, BTreeMap<PoolScope, CombinedLimitPool>>,
}

fn scopes(person: usize) -> [PoolScope; 2] {
    [PoolScope::Person(person), PoolScope::Family]
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the ledger for one plan and household
    pub fn for_plan(plan: &Plan, key: &AmountKey<'_>, household_size: usize) -> Result<Self> {
        let mut ledger = Self::new();

        for group in &plan.deductibles {
            ledger.add_group(
                &group.id,
                PoolKind::Deductible,
                vec![ChargeType::Deductible],
                group.person.as_ref(),
                group.family.as_ref(),
                key,
                household_size,
            )?;
        }

        for group in &plan.out_of_pocket_maximums {
            ledger.add_group(
                &group.id,
                PoolKind::OutOfPocketMax,
                group.charge_types.clone(),
                group.person.as_ref(),
                group.family.as_ref(),
                key,
                household_size,
            )?;
        }

        for limit in &plan.combined_limits {
            if let Some(amount) = &limit.person_reimburse_limit {
                let value = amount.resolve(key, &format!("combined limit `{}` person limit", limit.id))?;
                for person in 0..household_size {
                    ledger.add_combined(PoolKey::new(&limit.id, PoolScope::Person(person)), value);
                }
            }
            if let Some(amount) = &limit.family_reimburse_limit {
                let value = amount.resolve(key, &format!("combined limit `{}` family limit", limit.id))?;
                ledger.add_combined(PoolKey::new(&limit.id, PoolScope::Family), value);
            }
        }

        Ok(ledger)
    }

    #[allow(clippy::too_many_arguments)]
    fn add_group(
        &mut self,
        group_id: &str,
        kind: PoolKind,
        charge_types: Vec<ChargeType>,
        person: Option<&Amount>,
        family: Option<&Amount>,
        key: &AmountKey<'_>,
        household_size: usize,
    ) -> Result<()> {
        if let Some(amount) = person {
            let limit = amount.resolve(key, &format!("`{}` person amount", group_id))?;
            for person in 0..household_size {
                self.add_pool(
                    PoolKey::new(group_id, PoolScope::Person(person)),
                    QuotaPool::new(kind, limit, charge_types.clone()),
                );
            }
        }
        if let Some(amount) = family {
            let limit = amount.resolve(key, &format!("`{}` family amount", group_id))?;
            self.add_pool(
                PoolKey::new(group_id, PoolScope::Family),
                QuotaPool::new(kind, limit, charge_types),
            );
        }
        Ok(())
    }

    pub fn add_pool(&mut self, key: PoolKey, pool: QuotaPool) {
        self.pools.entry(key.group_id).or_default().insert(key.scope, pool);
    }

    pub fn add_combined(&mut self, key: PoolKey, limit: f64) {
        self.combined
            .entry(key.group_id)
            .or_default()
            .insert(key.scope, CombinedLimitPool::new(limit));
    }

    pub fn pool(&self, key: &PoolKey) -> Option<&QuotaPool> {
        self.pools.get(&key.group_id).and_then(|s| s.get(&key.scope))
    }

    pub fn combined_pool(&self, key: &PoolKey) -> Option<&CombinedLimitPool> {
        self.combined.get(&key.group_id).and_then(|s| s.get(&key.scope))
    }

    fn matching<'a>(
        &'a self,
        group_ids: &'a [String],
        person: usize,
        charge_type: ChargeType,
    ) -> impl Iterator<Item = &'a QuotaPool> + 'a {
        group_ids
            .iter()
            .filter_map(move |id| self.pools.get(id))
            .flat_map(move |by_scope| scopes(person).into_iter().filter_map(move |s| by_scope.get(&s)))
            .filter(move |pool| pool.restricts(charge_type))
    }

    /// Whether any pool of the listed groups restricts `charge_type` for `person`
    pub fn has_pools(&self, group_ids: &[String], person: usize, charge_type: ChargeType) -> bool {
        self.matching(group_ids, person, charge_type).next().is_some()
    }

    /// Minimum remaining capacity for `charge_type` across the person and family
    /// pools of the listed groups, or infinity when none apply
    pub fn available_for(&self, group_ids: &[String], person: usize, charge_type: ChargeType) -> f64 {
        self.matching(group_ids, person, charge_type)
            .map(|pool| pool.available)
            .fold(f64::INFINITY, f64::min)
    }

    /// Draw from a single pool
    ///
    /// Panics if the pool does not exist, does not restrict `charge_type`, or
    /// would go negative: each of those means the caller skipped the
    /// availability check.
    pub fn consume(&mut self, key: &PoolKey, charge_type: ChargeType, amount: f64) {
        let pool = self
            .pools
            .get_mut(&key.group_id)
            .and_then(|s| s.get_mut(&key.scope))
            .unwrap_or_else(|| panic!("no quota pool {:?}", key));
        assert!(
            pool.restricts(charge_type),
            "pool {:?} does not restrict {:?} charges",
            key,
            charge_type
        );
        if pool.draw(amount) {
            log::trace!("{:?} pool {:?} reached its limit of {:.2}", pool.kind, key, pool.limit);
        }
    }

    /// Draw `amount` from every person/family pool of the listed groups that
    /// restricts `charge_type`
    pub fn consume_matching(&mut self, group_ids: &[String], person: usize, charge_type: ChargeType, amount: f64) {
        for id in group_ids {
            for scope in scopes(person) {
                let restricts = self
                    .pools
                    .get(id)
                    .and_then(|s| s.get(&scope))
                    .map_or(false, |p| p.restricts(charge_type));
                if restricts {
                    self.consume(&PoolKey::new(id, scope), charge_type, amount);
                }
            }
        }
    }

    /// Remaining reimbursement capacity of a combined limit for `person`
    pub fn combined_available(&self, limit_id: &str, person: usize) -> f64 {
        self.combined
            .get(limit_id)
            .map(|by_scope| {
                scopes(person)
                    .iter()
                    .filter_map(|s| by_scope.get(s))
                    .map(|p| p.available)
                    .fold(f64::INFINITY, f64::min)
            })
            .unwrap_or(f64::INFINITY)
    }

    /// Draw reimbursement from a combined limit; returns true if this draw
    /// exhausted any of its pools
    pub fn consume_combined(&mut self, limit_id: &str, person: usize, amount: f64) -> bool {
        let mut attained = false;
        if let Some(by_scope) = self.combined.get_mut(limit_id) {
            for scope in scopes(person) {
                if let Some(pool) = by_scope.get_mut(&scope) {
                    if pool.draw(amount) {
                        log::trace!("combined limit `{}` {:?} attained", limit_id, scope);
                        attained = true;
                    }
                }
            }
        }
        attained
    }

    /// Snapshot of every deductible and OOP pool
    pub fn pool_statuses(&self) -> Vec<PoolStatus> {
        self.pools
            .iter()
            .flat_map(|(id, by_scope)| {
                by_scope.iter().map(move |(scope, pool)| PoolStatus {
                    key: PoolKey::new(id, *scope),
                    kind: pool.kind,
                    limit: pool.limit,
                    used: pool.used,
                    available: pool.available,
                    limit_met: pool.limit_met,
                })
            })
            .collect()
    }

    /// Snapshot of every combined limit pool
    pub fn combined_statuses(&self) -> Vec<CombinedLimitStatus> {
        self.combined
            .iter()
            .flat_map(|(id, by_scope)| {
                by_scope.iter().map(move |(scope, pool)| CombinedLimitStatus {
                    key: PoolKey::new(id, *scope),
                    limit: pool.limit,
                    used: pool.used,
                    available: pool.available,
                    attained: pool.attained,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::sample_config;
    use proptest::prelude::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn key() -> AmountKey<'static> {
        AmountKey {
            region: "north",
            status: "fullTime",
            coverage_level: "family",
        }
    }

    #[test]
    fn test_for_plan_builds_person_and_family_pools() {
        let config = sample_config();
        let ledger = QuotaLedger::for_plan(&config.plans[0], &key(), 2).unwrap();

        let person = ledger.pool(&PoolKey::new("ded", PoolScope::Person(1))).unwrap();
        assert_eq!(person.limit, 200.0);
        let family = ledger.pool(&PoolKey::new("oop", PoolScope::Family)).unwrap();
        assert_eq!(family.limit, 2000.0);
        assert!(ledger.pool(&PoolKey::new("ded", PoolScope::Person(2))).is_none());
        assert_eq!(ledger.pool_statuses().len(), 6);
    }

    #[test]
    fn test_available_for_takes_minimum_of_person_and_family() {
        let mut ledger = QuotaLedger::new();
        ledger.add_pool(
            PoolKey::new("ded", PoolScope::Person(0)),
            QuotaPool::new(PoolKind::Deductible, 500.0, vec![ChargeType::Deductible]),
        );
        ledger.add_pool(
            PoolKey::new("ded", PoolScope::Family),
            QuotaPool::new(PoolKind::Deductible, 300.0, vec![ChargeType::Deductible]),
        );

        assert_eq!(ledger.available_for(&ids(&["ded"]), 0, ChargeType::Deductible), 300.0);
        // person 1 only sees the family pool
        assert_eq!(ledger.available_for(&ids(&["ded"]), 1, ChargeType::Deductible), 300.0);
        // no pool restricts copays
        assert!(ledger.available_for(&ids(&["ded"]), 0, ChargeType::Copay).is_infinite());
        assert!(ledger.available_for(&[], 0, ChargeType::Deductible).is_infinite());
    }

    #[test]
    fn test_consume_matching_skips_other_charge_types() {
        let mut ledger = QuotaLedger::new();
        ledger.add_pool(
            PoolKey::new("oopCoins", PoolScope::Person(0)),
            QuotaPool::new(PoolKind::OutOfPocketMax, 1000.0, vec![ChargeType::Coinsurance]),
        );
        ledger.add_pool(
            PoolKey::new("oopAll", PoolScope::Person(0)),
            QuotaPool::new(PoolKind::OutOfPocketMax, 2000.0, ChargeType::ALL.to_vec()),
        );

        let groups = ids(&["oopCoins", "oopAll"]);
        ledger.consume_matching(&groups, 0, ChargeType::Copay, 25.0);

        assert_eq!(ledger.pool(&PoolKey::new("oopCoins", PoolScope::Person(0))).unwrap().available, 1000.0);
        assert_eq!(ledger.pool(&PoolKey::new("oopAll", PoolScope::Person(0))).unwrap().available, 1975.0);
    }

    #[test]
    #[should_panic(expected = "does not restrict")]
    fn test_consume_wrong_charge_type_is_fatal() {
        let mut ledger = QuotaLedger::new();
        let key = PoolKey::new("ded", PoolScope::Family);
        ledger.add_pool(key.clone(), QuotaPool::new(PoolKind::Deductible, 100.0, vec![ChargeType::Deductible]));
        ledger.consume(&key, ChargeType::Copay, 10.0);
    }

    #[test]
    #[should_panic(expected = "quota pool overdrawn")]
    fn test_overstepping_availability_is_fatal() {
        let mut ledger = QuotaLedger::new();
        let groups = ids(&["ded"]);
        ledger.add_pool(
            PoolKey::new("ded", PoolScope::Person(0)),
            QuotaPool::new(PoolKind::Deductible, 100.0, vec![ChargeType::Deductible]),
        );
        let available = ledger.available_for(&groups, 0, ChargeType::Deductible);
        ledger.consume_matching(&groups, 0, ChargeType::Deductible, available + 1.0);
    }

    #[test]
    fn test_combined_limits() {
        let mut ledger = QuotaLedger::new();
        ledger.add_combined(PoolKey::new("chiro", PoolScope::Person(0)), 100.0);

        assert_eq!(ledger.combined_available("chiro", 0), 100.0);
        assert!(ledger.combined_available("chiro", 1).is_infinite());
        assert!(ledger.combined_available("other", 0).is_infinite());

        assert!(!ledger.consume_combined("chiro", 0, 80.0));
        assert!(ledger.consume_combined("chiro", 0, 20.0));
        assert_eq!(ledger.combined_statuses()[0].used, 100.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_bounded_consumption_never_goes_negative(
            draws in proptest::collection::vec((0usize..3, 0usize..3, 0u32..80_000), 1..60)
        ) {
            let mut ledger = QuotaLedger::new();
            for person in 0..3 {
                ledger.add_pool(
                    PoolKey::new("ded", PoolScope::Person(person)),
                    QuotaPool::new(PoolKind::Deductible, 250.0, vec![ChargeType::Deductible]),
                );
                ledger.add_pool(
                    PoolKey::new("oop", PoolScope::Person(person)),
                    QuotaPool::new(PoolKind::OutOfPocketMax, 1500.0, ChargeType::ALL.to_vec()),
                );
            }
            ledger.add_pool(
                PoolKey::new("ded", PoolScope::Family),
                QuotaPool::new(PoolKind::Deductible, 600.0, vec![ChargeType::Deductible]),
            );
            ledger.add_pool(
                PoolKey::new("oop", PoolScope::Family),
                QuotaPool::new(PoolKind::OutOfPocketMax, 3000.0, ChargeType::ALL.to_vec()),
            );
            let groups = ids(&["ded", "oop"]);

            for (person, charge_idx, cents) in draws {
                let charge = ChargeType::ALL[charge_idx];
                let wanted = cents as f64 / 100.0;
                let amount = wanted.min(ledger.available_for(&groups, person, charge));
                ledger.consume_matching(&groups, person, charge, amount);

                for status in ledger.pool_statuses() {
                    prop_assert!(status.available >= 0.0);
                    prop_assert!((status.limit - status.used - status.available).abs() < 1e-6);
                    prop_assert_eq!(status.limit_met, status.available == 0.0 && status.used > 0.0);
                }
            }
        }
    }
}
