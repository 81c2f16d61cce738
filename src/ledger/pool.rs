//! Quota pools: deductibles, out-of-pocket maximums and combined reimbursement limits

use serde::{Deserialize, Serialize};

use crate::config::ChargeType;
use crate::money::{add_cents, round_cents, sub_cents};

/// Who a pool's capacity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolScope {
    /// Household member by index
    Person(usize),
    Family,
}

/// Identifies one pool in a ledger
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolKey {
    pub group_id: String,
    pub scope: PoolScope,
}

impl PoolKey {
    pub fn new(group_id: &str, scope: PoolScope) -> Self {
        Self {
            group_id: group_id.to_string(),
            scope,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolKind {
    Deductible,
    OutOfPocketMax,
}

/// Deductible or OOP-maximum capacity
///
/// Invariant: `available = limit - used` and `available >= 0`; `available`
/// only ever decreases within one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaPool {
    pub kind: PoolKind,
    pub charge_types: Vec<ChargeType>,
    pub limit: f64,
    pub used: f64,
    pub available: f64,

    /// Deductible met / OOP maximum reached
    pub limit_met: bool,
}

impl QuotaPool {
    pub fn new(kind: PoolKind, limit: f64, charge_types: Vec<ChargeType>) -> Self {
        let limit = round_cents(limit.max(0.0));
        Self {
            kind,
            charge_types,
            limit,
            used: 0.0,
            available: limit,
            limit_met: false,
        }
    }

    pub fn restricts(&self, charge_type: ChargeType) -> bool {
        self.charge_types.contains(&charge_type)
    }

    /// Draw `amount` from the pool; returns true when this draw met the limit
    pub(crate) fn draw(&mut self, amount: f64) -> bool {
        let amount = round_cents(amount);
        assert!(amount >= 0.0, "negative quota draw of {amount}");
        let available = sub_cents(self.available, amount);
        assert!(
            available >= 0.0,
            "quota pool overdrawn: available {} minus draw {} is negative",
            self.available,
            amount
        );

        let was_open = self.available > 0.0;
        self.available = available;
        self.used = add_cents(self.used, amount);

        if was_open && available == 0.0 {
            self.limit_met = true;
            return true;
        }
        false
    }
}

/// Reimbursement capacity shared by every service referencing one combined limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedLimitPool {
    pub limit: f64,
    pub used: f64,
    pub available: f64,
    pub attained: bool,
}

impl CombinedLimitPool {
    pub fn new(limit: f64) -> Self {
        let limit = round_cents(limit.max(0.0));
        Self {
            limit,
            used: 0.0,
            available: limit,
            attained: false,
        }
    }

    pub(crate) fn draw(&mut self, amount: f64) -> bool {
        let amount = round_cents(amount);
        assert!(amount >= 0.0, "negative reimbursement draw of {amount}");
        let available = sub_cents(self.available, amount);
        assert!(
            available >= 0.0,
            "combined limit overdrawn: available {} minus draw {} is negative",
            self.available,
            amount
        );

        let was_open = self.available > 0.0;
        self.available = available;
        self.used = add_cents(self.used, amount);

        if was_open && available == 0.0 {
            self.attained = true;
            return true;
        }
        false
    }
}
