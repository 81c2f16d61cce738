//! Cost breakdowns produced by the service cost resolver

use serde::{Deserialize, Serialize};

use crate::config::CategoryIndex;
use crate::money::{add_cents, round_cents};

/// Who pays what for some amount of service cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeBreakdown {
    pub deductible: f64,
    pub copay: f64,
    pub coinsurance: f64,

    /// Paid by the plan
    pub reimbursed: f64,

    /// Paid by the member because the plan does not cover it
    pub expenses_not_covered: f64,

    /// Flat per-use surcharge; does not reduce cost and is never fund-eligible
    pub additional_premium: f64,
}

impl ChargeBreakdown {
    /// Accumulate another breakdown, rounding every field to cents
    pub fn add(&mut self, other: &ChargeBreakdown) {
        self.deductible = add_cents(self.deductible, other.deductible);
        self.copay = add_cents(self.copay, other.copay);
        self.coinsurance = add_cents(self.coinsurance, other.coinsurance);
        self.reimbursed = add_cents(self.reimbursed, other.reimbursed);
        self.expenses_not_covered = add_cents(self.expenses_not_covered, other.expenses_not_covered);
        self.additional_premium = add_cents(self.additional_premium, other.additional_premium);
    }

    /// Deductible + copay + coinsurance
    pub fn cost_sharing(&self) -> f64 {
        round_cents(self.deductible + self.copay + self.coinsurance)
    }

    /// Everything the member pays for the service
    pub fn member_costs(&self) -> f64 {
        round_cents(self.cost_sharing() + self.expenses_not_covered + self.additional_premium)
    }

    /// Service cost accounted for (excludes the additional premium surcharge)
    pub fn service_cost(&self) -> f64 {
        round_cents(self.cost_sharing() + self.reimbursed + self.expenses_not_covered)
    }
}

/// Working record for one coverage tier of one person's use of one service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageEntryCosts {
    pub entry_index: usize,

    /// Units processed under this tier
    pub covered_count: f64,

    /// Units this tier left uncovered
    pub not_covered_count: f64,

    pub charges: ChargeBreakdown,
}

impl CoverageEntryCosts {
    pub fn new(entry_index: usize) -> Self {
        Self {
            entry_index,
            ..Default::default()
        }
    }

    /// Record `count` units at `unit_cost` as not covered
    pub fn add_not_covered(&mut self, count: f64, unit_cost: f64) {
        self.not_covered_count += count;
        self.charges.expenses_not_covered =
            add_cents(self.charges.expenses_not_covered, round_cents(count * unit_cost));
    }
}

/// One person's use of one service under one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCostRecord {
    pub person: usize,
    pub service_id: String,
    pub category: CategoryIndex,

    /// Effective unit cost after region lookup (and the additional-services rule)
    pub unit_cost: f64,

    /// Effective count processed
    pub count: f64,

    pub entries: Vec<CoverageEntryCosts>,
    pub totals: ChargeBreakdown,
    pub combined_limit_attained: bool,
}

impl ServiceCostRecord {
    pub fn new(person: usize, service_id: &str, category: CategoryIndex, unit_cost: f64, count: f64) -> Self {
        Self {
            person,
            service_id: service_id.to_string(),
            category,
            unit_cost,
            count,
            entries: Vec::new(),
            totals: ChargeBreakdown::default(),
            combined_limit_attained: false,
        }
    }

    pub fn push_entry(&mut self, entry: CoverageEntryCosts) {
        self.totals.add(&entry.charges);
        self.entries.push(entry);
    }

    /// count × unit cost
    pub fn gross_cost(&self) -> f64 {
        round_cents(self.count * self.unit_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_sums() {
        let breakdown = ChargeBreakdown {
            deductible: 200.0,
            copay: 0.0,
            coinsurance: 60.0,
            reimbursed: 240.0,
            expenses_not_covered: 0.0,
            additional_premium: 5.0,
        };
        assert_eq!(breakdown.cost_sharing(), 260.0);
        assert_eq!(breakdown.member_costs(), 265.0);
        assert_eq!(breakdown.service_cost(), 500.0);
    }

    #[test]
    fn test_record_accumulates_entries() {
        let mut record = ServiceCostRecord::new(0, "therapy", 0, 100.0, 3.0);
        let mut first = CoverageEntryCosts::new(0);
        first.covered_count = 2.0;
        first.charges.copay = 40.0;
        first.charges.reimbursed = 160.0;
        let mut second = CoverageEntryCosts::new(1);
        second.add_not_covered(1.0, 100.0);

        record.push_entry(first);
        record.push_entry(second);

        assert_eq!(record.totals.service_cost(), record.gross_cost());
        assert_eq!(record.totals.expenses_not_covered, 100.0);
    }
}
