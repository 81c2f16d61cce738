//! Per-plan evaluation output

use serde::{Deserialize, Serialize};

use crate::config::AccountType;
use crate::funds::FundAllocation;
use crate::ledger::{CombinedLimitStatus, PoolStatus};
use crate::resolver::ServiceCostRecord;
use crate::worst_case::WorstCaseBound;

/// Annual premiums after any caller adjustment (never negative)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumCosts {
    pub employee: f64,
    pub employer: f64,
}

/// Household cost sharing summed over every service record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotals {
    pub deductibles: f64,
    pub copays: f64,
    pub coinsurance: f64,
    pub reimbursed: f64,
    pub expenses_not_covered: f64,
    pub additional_premiums: f64,

    /// Everything the household pays for care, before funds
    pub total_medical_and_drug_costs: f64,

    /// Cost sharing in categories eligible for all funds
    pub restricted_eligible_costs: f64,

    /// Cost sharing in categories eligible for any funds
    pub fund_eligible_costs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub plan_id: String,
    pub plan_name: String,
    pub account_type: Option<AccountType>,
    pub coverage_level: String,

    pub premiums: PremiumCosts,
    pub totals: PlanTotals,
    pub funds: FundAllocation,

    /// Configured plan core fund (restricted + unrestricted)
    pub plan_fund_amount: f64,

    /// Care costs left after every fund offset
    pub net_out_of_pocket: f64,

    pub employee_total_annual_costs: f64,
    pub employer_or_plan_total_annual_costs: f64,
    pub total_costs: f64,

    pub worst_case: WorstCaseBound,

    /// Worst case bound plus employee premium less plan core funds
    /// (serialized as null when unbounded)
    pub worst_case_employee_costs: f64,

    pub combined_limit_attained: bool,

    pub services: Vec<ServiceCostRecord>,
    pub pools: Vec<PoolStatus>,
    pub combined_limits: Vec<CombinedLimitStatus>,
}

impl PlanResult {
    pub fn has_savings_account(&self) -> bool {
        self.account_type
            .map_or(false, |account| account.is_preferred_savings_account())
    }

    pub fn plan_fund_paid(&self) -> f64 {
        self.funds.plan_fund_paid()
    }

    pub fn match_paid(&self) -> f64 {
        self.funds.match_funds.paid
    }

    /// Match funding offered, whether or not it was used
    pub fn match_available(&self) -> f64 {
        self.funds.match_funds.paid + self.funds.match_funds.unused
    }
}

/// Zeroed result used to build ranking fixtures
#[cfg(test)]
pub(crate) fn test_result(plan_id: &str) -> PlanResult {
    use crate::worst_case::BoundBasis;

    PlanResult {
        plan_id: plan_id.to_string(),
        plan_name: plan_id.to_string(),
        account_type: None,
        coverage_level: "employeeOnly".to_string(),
        premiums: PremiumCosts::default(),
        totals: PlanTotals::default(),
        funds: FundAllocation::default(),
        plan_fund_amount: 0.0,
        net_out_of_pocket: 0.0,
        employee_total_annual_costs: 0.0,
        employer_or_plan_total_annual_costs: 0.0,
        total_costs: 0.0,
        worst_case: WorstCaseBound {
            amount: 0.0,
            based_on: BoundBasis::Pools { pools: Vec::new() },
        },
        worst_case_employee_costs: 0.0,
        combined_limit_attained: false,
        services: Vec::new(),
        pools: Vec::new(),
        combined_limits: Vec::new(),
    }
}

#[cfg(test)]
impl PlanResult {
    /// Mark the worst case unbounded, keeping the bound and the employee
    /// worst case in agreement
    pub(crate) fn with_unbounded_worst_case(mut self, reason: crate::worst_case::UnboundedReason) -> Self {
        self.worst_case = WorstCaseBound::unbounded(reason, None, None);
        self.worst_case_employee_costs = f64::INFINITY;
        self
    }
}
