//! Plan rankings and comparison-wide flags

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::PlanResult;

/// Ranking surfaced as the caller's preferred ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RankingPriority {
    Premium,
    NetOutOfPocket,
    #[default]
    TotalCost,
    WorstCase,
    SavingsAccount,
}

impl FromStr for RankingPriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().replace(&['-', '_'][..], "").as_str() {
            "premium" => Ok(RankingPriority::Premium),
            "netoutofpocket" | "outofpocket" => Ok(RankingPriority::NetOutOfPocket),
            "totalcost" => Ok(RankingPriority::TotalCost),
            "worstcase" => Ok(RankingPriority::WorstCase),
            "savingsaccount" => Ok(RankingPriority::SavingsAccount),
            _ => Err(format!("unknown ranking priority `{}`", value)),
        }
    }
}

impl fmt::Display for RankingPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RankingPriority::Premium => "premium",
            RankingPriority::NetOutOfPocket => "net-out-of-pocket",
            RankingPriority::TotalCost => "total-cost",
            RankingPriority::WorstCase => "worst-case",
            RankingPriority::SavingsAccount => "savings-account",
        };
        f.write_str(name)
    }
}

/// Plan ids sorted cheapest first under each criterion
///
/// Sorts are stable, so ties keep configured plan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub by_premium: Vec<String>,
    pub by_net_out_of_pocket: Vec<String>,
    pub by_employee_total: Vec<String>,
    pub by_worst_case: Vec<String>,

    /// HSA/FSA plans first, then by employee total
    pub by_savings_account: Vec<String>,
}

impl Rankings {
    pub fn rank(results: &[PlanResult]) -> Self {
        Self {
            by_premium: sorted_ids(results, |a, b| a.premiums.employee.total_cmp(&b.premiums.employee)),
            by_net_out_of_pocket: sorted_ids(results, |a, b| a.net_out_of_pocket.total_cmp(&b.net_out_of_pocket)),
            by_employee_total: sorted_ids(results, by_employee_total),
            by_worst_case: sorted_ids(results, |a, b| {
                a.worst_case_employee_costs.total_cmp(&b.worst_case_employee_costs)
            }),
            by_savings_account: sorted_ids(results, |a, b| {
                b.has_savings_account()
                    .cmp(&a.has_savings_account())
                    .then_with(|| by_employee_total(a, b))
            }),
        }
    }

    pub fn by_priority(&self, priority: RankingPriority) -> &[String] {
        match priority {
            RankingPriority::Premium => &self.by_premium,
            RankingPriority::NetOutOfPocket => &self.by_net_out_of_pocket,
            RankingPriority::TotalCost => &self.by_employee_total,
            RankingPriority::WorstCase => &self.by_worst_case,
            RankingPriority::SavingsAccount => &self.by_savings_account,
        }
    }
}

fn by_employee_total(a: &PlanResult, b: &PlanResult) -> Ordering {
    a.employee_total_annual_costs.total_cmp(&b.employee_total_annual_costs)
}

fn sorted_ids<F>(results: &[PlanResult], compare: F) -> Vec<String>
where
    F: Fn(&PlanResult, &PlanResult) -> Ordering,
{
    let mut sorted: Vec<&PlanResult> = results.iter().collect();
    sorted.sort_by(|a, b| compare(a, b));
    sorted.into_iter().map(|r| r.plan_id.clone()).collect()
}

/// "Does any plan have X" flags for the comparison view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateFlags {
    pub has_deductible: bool,
    pub has_copays: bool,
    pub has_coinsurance: bool,
    pub has_plan_funds: bool,
    pub has_match: bool,
    pub has_additional_premiums: bool,
    pub has_expenses_not_covered: bool,
    pub has_combined_limit_attained: bool,
    pub has_unbounded_worst_case: bool,
    pub has_savings_account: bool,
}

impl AggregateFlags {
    pub fn from_results(results: &[PlanResult]) -> Self {
        let mut flags = Self::default();
        for result in results {
            flags.accumulate(result);
        }
        flags
    }

    pub fn accumulate(&mut self, result: &PlanResult) {
        let totals = &result.totals;
        self.has_deductible = self.has_deductible || totals.deductibles > 0.0;
        self.has_copays = self.has_copays || totals.copays > 0.0;
        self.has_coinsurance = self.has_coinsurance || totals.coinsurance > 0.0;
        self.has_plan_funds = self.has_plan_funds || result.plan_fund_amount > 0.0;
        self.has_match = self.has_match || result.match_available() > 0.0;
        self.has_additional_premiums = self.has_additional_premiums || totals.additional_premiums > 0.0;
        self.has_expenses_not_covered = self.has_expenses_not_covered || totals.expenses_not_covered > 0.0;
        self.has_combined_limit_attained = self.has_combined_limit_attained || result.combined_limit_attained;
        self.has_unbounded_worst_case = self.has_unbounded_worst_case || !result.worst_case.is_bounded();
        self.has_savings_account = self.has_savings_account || result.has_savings_account();
    }
}
