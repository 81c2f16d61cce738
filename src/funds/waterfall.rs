//! Fund waterfall allocation
//!
//! Plan/employer/voluntary/rollover balances are applied to fund-eligible cost
//! sharing in a fixed priority order:
//!
//! restricted core → unrestricted core → match → voluntary → rollover
//!
//! Restricted core money is only usable against the restricted-eligible subset
//! of costs (categories eligible for all funds), and is exhausted against that
//! subset before any unrestricted money is applied to the general total.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::money::{round_cents, sub_cents};

/// Which fund sources are applied to eligible costs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundPolicy {
    #[serde(rename = "applyNoFunds")]
    NoFunds,
    /// Plan core funds only
    #[serde(rename = "applyERCoreFundsOnly")]
    EmployerCoreOnly,
    /// Plan core funds and employer match
    #[serde(rename = "applyERFundsOnly")]
    EmployerOnly,
    /// Voluntary contributions and rollover only
    #[serde(rename = "applyEEFundsOnly")]
    EmployeeOnly,
    #[default]
    #[serde(rename = "applyAllFunds")]
    AllFunds,
}

impl FundPolicy {
    pub fn applies_core(&self) -> bool {
        matches!(self, FundPolicy::EmployerCoreOnly | FundPolicy::EmployerOnly | FundPolicy::AllFunds)
    }

    fn applies_match(&self) -> bool {
        matches!(self, FundPolicy::EmployerOnly | FundPolicy::AllFunds)
    }

    fn applies_employee(&self) -> bool {
        matches!(self, FundPolicy::EmployeeOnly | FundPolicy::AllFunds)
    }
}

impl FromStr for FundPolicy {
    type Err = String;

    /// Accepts the configuration names (`applyAllFunds`) or short CLI names (`all-funds`)
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "applyNoFunds" | "no-funds" => Ok(FundPolicy::NoFunds),
            "applyERCoreFundsOnly" | "employer-core" => Ok(FundPolicy::EmployerCoreOnly),
            "applyERFundsOnly" | "employer" => Ok(FundPolicy::EmployerOnly),
            "applyEEFundsOnly" | "employee" => Ok(FundPolicy::EmployeeOnly),
            "applyAllFunds" | "all-funds" => Ok(FundPolicy::AllFunds),
            _ => Err(format!("unknown fund policy `{}`", value)),
        }
    }
}

impl fmt::Display for FundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FundPolicy::NoFunds => "no-funds",
            FundPolicy::EmployerCoreOnly => "employer-core",
            FundPolicy::EmployerOnly => "employer",
            FundPolicy::EmployeeOnly => "employee",
            FundPolicy::AllFunds => "all-funds",
        };
        f.write_str(name)
    }
}

/// Eligible costs and available balances for one plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundInputs {
    /// Costs in categories eligible for all funds (subset of `eligible_costs`)
    pub restricted_eligible_costs: f64,

    /// Costs in categories eligible for any funds
    pub eligible_costs: f64,

    /// Plan core fund usable only against restricted-eligible costs
    pub plan_restricted: f64,

    /// Plan core fund usable against any eligible cost
    pub plan_unrestricted: f64,

    pub match_amount: f64,
    pub voluntary: f64,
    pub rollover: f64,
}

/// Amount paid from one fund source and the balance left in it
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAllocation {
    pub paid: f64,
    pub unused: f64,
}

impl SourceAllocation {
    fn untouched(available: f64) -> Self {
        Self {
            paid: 0.0,
            unused: round_cents(available),
        }
    }
}

/// Balance left over after offsets, split by restriction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carryover {
    pub restricted: f64,
    pub unrestricted: f64,
}

/// Result of running the waterfall for one plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundAllocation {
    pub policy: FundPolicy,
    pub plan_restricted: SourceAllocation,
    pub plan_unrestricted: SourceAllocation,
    pub match_funds: SourceAllocation,
    pub voluntary: SourceAllocation,
    pub rollover: SourceAllocation,

    /// Sum of everything paid
    pub total_offset: f64,

    /// Balances available to roll into next year
    pub carryover: Carryover,
}

impl FundAllocation {
    /// Core plan fund paid (restricted + unrestricted)
    pub fn plan_fund_paid(&self) -> f64 {
        round_cents(self.plan_restricted.paid + self.plan_unrestricted.paid)
    }
}

/// Allocate fund balances against eligible costs under `policy`
pub fn allocate_funds(inputs: &FundInputs, policy: FundPolicy) -> FundAllocation {
    let mut restricted_left = round_cents(inputs.restricted_eligible_costs.max(0.0));
    let mut eligible_left = round_cents(inputs.eligible_costs.max(0.0));

    let plan_restricted = if policy.applies_core() {
        let paid = round_cents(inputs.plan_restricted.max(0.0).min(restricted_left).min(eligible_left));
        restricted_left = sub_cents(restricted_left, paid);
        eligible_left = sub_cents(eligible_left, paid);
        SourceAllocation {
            paid,
            unused: sub_cents(inputs.plan_restricted, paid),
        }
    } else {
        SourceAllocation::untouched(inputs.plan_restricted)
    };
    debug_assert!(restricted_left >= 0.0);

    let mut apply = |available: f64, enabled: bool| -> SourceAllocation {
        if !enabled {
            return SourceAllocation::untouched(available);
        }
        let paid = round_cents(available.max(0.0).min(eligible_left));
        eligible_left = sub_cents(eligible_left, paid);
        SourceAllocation {
            paid,
            unused: sub_cents(available, paid),
        }
    };

    let plan_unrestricted = apply(inputs.plan_unrestricted, policy.applies_core());
    let match_funds = apply(inputs.match_amount, policy.applies_match());
    let voluntary = apply(inputs.voluntary, policy.applies_employee());
    let rollover = apply(inputs.rollover, policy.applies_employee());

    let total_offset = [
        plan_restricted.paid,
        plan_unrestricted.paid,
        match_funds.paid,
        voluntary.paid,
        rollover.paid,
    ]
    .iter()
    .fold(0.0, |acc, paid| round_cents(acc + paid));

    let carryover = Carryover {
        restricted: plan_restricted.unused,
        unrestricted: [
            plan_unrestricted.unused,
            match_funds.unused,
            voluntary.unused,
            rollover.unused,
        ]
        .iter()
        .fold(0.0, |acc, unused| round_cents(acc + unused)),
    };

    FundAllocation {
        policy,
        plan_restricted,
        plan_unrestricted,
        match_funds,
        voluntary,
        rollover,
        total_offset,
        carryover,
    }
}
