//! Plan evaluation: charge every service, offset funds, bound the worst case

use log::debug;

use crate::config::{
    AmountKey, BenefitsConfig, CompiledConfig, CompiledPlan, CoverageLevel, FundEligibility, Plan,
};
use crate::error::{EngineError, Result};
use crate::funds::{allocate_funds, FundInputs};
use crate::household::{CalculationArgs, Household, PremiumAdjustment};
use crate::ledger::QuotaLedger;
use crate::money::{add_cents, round_cents, sub_cents};
use crate::resolver::{ChargeBreakdown, ServiceCostRecord, ServiceCostResolver};
use crate::worst_case::WorstCaseBoundCalculator;

use super::result::{PlanResult, PlanTotals, PremiumCosts};

/// Evaluates plans of one configuration for a household
///
/// Holds only shared references; every evaluation allocates its own ledger,
/// so one evaluator can serve concurrent plan evaluations.
#[derive(Debug, Clone, Copy)]
pub struct PlanEvaluator<'a> {
    config: &'a BenefitsConfig,
    compiled: &'a CompiledConfig,
}

impl<'a> PlanEvaluator<'a> {
    pub fn new(config: &'a BenefitsConfig, compiled: &'a CompiledConfig) -> Self {
        Self { config, compiled }
    }

    /// First coverage level, in configured order, that fits the household
    pub fn select_coverage_level(&self, household: &Household) -> Result<&'a CoverageLevel> {
        let has_spouse = household.has_spouse();
        let children = household.children();

        let level = self
            .config
            .coverage_levels
            .iter()
            .find(|level| level.fits(has_spouse, children))
            .ok_or(EngineError::NoMatchingCoverageLevel {
                spouse: has_spouse,
                children,
            })?;

        debug!(
            "Coverage level {} selected (spouse: {}, children: {})",
            level.id, has_spouse, children
        );
        Ok(level)
    }

    /// Evaluate the plan with id `plan_id`, selecting the coverage level
    pub fn evaluate_plan(&self, plan_id: &str, args: &CalculationArgs) -> Result<PlanResult> {
        let plan_index = self
            .config
            .plans
            .iter()
            .position(|p| p.id == plan_id)
            .ok_or_else(|| EngineError::UnknownPlan(plan_id.to_string()))?;
        let level = self.select_coverage_level(&args.household)?;
        self.evaluate(plan_index, args, &level.id)
    }

    /// Evaluate the plan at `plan_index` under an already selected coverage level
    pub fn evaluate(&self, plan_index: usize, args: &CalculationArgs, coverage_level: &str) -> Result<PlanResult> {
        let plan = self
            .config
            .plans
            .get(plan_index)
            .ok_or_else(|| EngineError::UnknownPlan(format!("#{}", plan_index)))?;
        let compiled_plan = self.compiled.plan(plan_index);
        let household = &args.household;
        if household.members.is_empty() {
            return Err(EngineError::EmptyHousehold);
        }

        let key = AmountKey {
            region: &args.region,
            status: &args.status,
            coverage_level,
        };
        let household_size = household.size();

        let unit_costs = self
            .config
            .services
            .iter()
            .map(|s| s.cost.resolve(&key, &format!("service `{}` cost", s.id)))
            .collect::<Result<Vec<_>>>()?;

        let mut ledger = QuotaLedger::for_plan(plan, &key, household_size)?;
        let services = self.charge_services(compiled_plan, &mut ledger, household, &unit_costs);
        let totals = aggregate(compiled_plan, &services);

        let funding = args.funding_for(&plan.id);
        let (plan_restricted, plan_unrestricted) = plan_funds(plan, &key)?;
        let funds = allocate_funds(
            &FundInputs {
                restricted_eligible_costs: totals.restricted_eligible_costs,
                eligible_costs: totals.fund_eligible_costs,
                plan_restricted,
                plan_unrestricted,
                match_amount: funding.match_amount,
                voluntary: funding.voluntary,
                rollover: funding.rollover,
            },
            args.fund_policy,
        );

        let premiums = premiums(plan, &key, funding.premium_adjustment)?;

        let worst_case = WorstCaseBoundCalculator::new(plan, compiled_plan, self.compiled, &self.config.services)
            .calculate(&key, household_size)?;

        let plan_fund_amount = add_cents(plan_restricted, plan_unrestricted);
        let plan_fund_paid = funds.plan_fund_paid();
        let match_paid = funds.match_funds.paid;

        let net_out_of_pocket = sub_cents(totals.total_medical_and_drug_costs, funds.total_offset);
        let employee_total_annual_costs =
            round_cents(premiums.employee + totals.total_medical_and_drug_costs - plan_fund_paid - match_paid);
        let employer_or_plan_total_annual_costs =
            round_cents(premiums.employer + totals.reimbursed + plan_fund_paid + match_paid);
        let total_costs = add_cents(employee_total_annual_costs, employer_or_plan_total_annual_costs);

        // plan core funds only offset the bound when the policy applies them
        let usable_plan_funds = if args.fund_policy.applies_core() {
            plan_fund_amount
        } else {
            0.0
        };
        let worst_case_employee_costs = if worst_case.is_bounded() {
            add_cents(premiums.employee, sub_cents(worst_case.amount, usable_plan_funds).max(0.0))
        } else {
            f64::INFINITY
        };

        let combined_limit_attained = services.iter().any(|r| r.combined_limit_attained);

        debug!(
            "Plan {} ({}): care {:.2}, funds {:.2}, employee total {:.2}, worst case {:.2}",
            plan.id,
            coverage_level,
            totals.total_medical_and_drug_costs,
            funds.total_offset,
            employee_total_annual_costs,
            worst_case_employee_costs
        );

        Ok(PlanResult {
            plan_id: plan.id.clone(),
            plan_name: plan.display_name().to_string(),
            account_type: plan.account_type,
            coverage_level: coverage_level.to_string(),
            premiums,
            totals,
            funds,
            plan_fund_amount,
            net_out_of_pocket,
            employee_total_annual_costs,
            employer_or_plan_total_annual_costs,
            total_costs,
            worst_case,
            worst_case_employee_costs,
            combined_limit_attained,
            services,
            pools: ledger.pool_statuses(),
            combined_limits: ledger.combined_statuses(),
        })
    }

    /// Deductible-bearing services first, then the rest; members in household
    /// order within each pass
    fn charge_services(
        &self,
        compiled_plan: &CompiledPlan,
        ledger: &mut QuotaLedger,
        household: &Household,
        unit_costs: &[f64],
    ) -> Vec<ServiceCostRecord> {
        let mut resolver = ServiceCostResolver::new(compiled_plan, ledger);
        let mut records = Vec::new();

        for pass in compiled_plan.evaluation_passes() {
            for (person, member) in household.members.iter().enumerate() {
                for &service_index in pass {
                    let service = &self.config.services[service_index];
                    let count = member.count_for(&service.id);
                    if count <= 0.0 {
                        continue;
                    }
                    records.push(resolver.resolve(
                        person,
                        service_index,
                        service,
                        self.compiled.service_category(service_index),
                        unit_costs[service_index],
                        count,
                    ));
                }
            }
        }

        records
    }
}

fn aggregate(compiled_plan: &CompiledPlan, records: &[ServiceCostRecord]) -> PlanTotals {
    let mut charges = ChargeBreakdown::default();
    let mut restricted_eligible = 0.0;
    let mut eligible = 0.0;

    for record in records {
        charges.add(&record.totals);
        let cost_sharing = record.totals.cost_sharing();
        match compiled_plan.fund_eligibility[record.category] {
            FundEligibility::AllFunds => {
                restricted_eligible = add_cents(restricted_eligible, cost_sharing);
                eligible = add_cents(eligible, cost_sharing);
            }
            FundEligibility::NonRestrictedFunds => {
                eligible = add_cents(eligible, cost_sharing);
            }
            FundEligibility::Ineligible => {}
        }
    }

    PlanTotals {
        deductibles: charges.deductible,
        copays: charges.copay,
        coinsurance: charges.coinsurance,
        reimbursed: charges.reimbursed,
        expenses_not_covered: charges.expenses_not_covered,
        additional_premiums: charges.additional_premium,
        total_medical_and_drug_costs: charges.member_costs(),
        restricted_eligible_costs: restricted_eligible,
        fund_eligible_costs: eligible,
    }
}

/// Configured (restricted, unrestricted) plan core fund amounts
fn plan_funds(plan: &Plan, key: &AmountKey<'_>) -> Result<(f64, f64)> {
    let Some(funds) = &plan.funds else {
        return Ok((0.0, 0.0));
    };
    let restricted = match &funds.restricted {
        Some(amount) => amount.resolve(key, &format!("plan `{}` restricted fund", plan.id))?,
        None => 0.0,
    };
    let unrestricted = match &funds.unrestricted {
        Some(amount) => amount.resolve(key, &format!("plan `{}` unrestricted fund", plan.id))?,
        None => 0.0,
    };
    Ok((round_cents(restricted), round_cents(unrestricted)))
}

fn premiums(plan: &Plan, key: &AmountKey<'_>, adjustment: Option<PremiumAdjustment>) -> Result<PremiumCosts> {
    let employee = plan
        .premiums
        .employee
        .resolve(key, &format!("plan `{}` employee premium", plan.id))?;
    let employer = match &plan.premiums.employer {
        Some(amount) => amount.resolve(key, &format!("plan `{}` employer premium", plan.id))?,
        None => 0.0,
    };
    let (employee_delta, employer_delta) = adjustment.map_or((0.0, 0.0), |a| a.deltas());

    Ok(PremiumCosts {
        employee: round_cents((employee + employee_delta).max(0.0)),
        employer: round_cents((employer + employer_delta).max(0.0)),
    })
}
