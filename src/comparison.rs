//! Comparison runner for evaluating every plan offered to a household
//!
//! Compiles the configuration once, then evaluates each region's plans
//! in parallel against the shared, read-only compiled indices.

use std::path::Path;

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{load_config, BenefitsConfig, CompiledConfig};
use crate::error::{EngineError, Result};
use crate::evaluation::{AggregateFlags, PlanEvaluator, PlanResult, RankingPriority, Rankings};
use crate::household::CalculationArgs;

/// Plan results for one household, in configured plan order, plus rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanComparison {
    pub coverage_level: String,
    pub plans: Vec<PlanResult>,
    pub rankings: Rankings,
    pub priority: RankingPriority,

    /// The ranking selected by `priority`
    pub by_priority: Vec<String>,
    pub flags: AggregateFlags,
}

/// Full comparison output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    #[serde(flatten)]
    pub comparison: PlanComparison,

    /// Same household with employee funding removed and only plan core funds
    /// applied
    pub no_employee_funding: Option<PlanComparison>,
}

/// Pre-compiled configuration for running many comparisons
#[derive(Debug, Clone)]
pub struct ComparisonRunner {
    config: BenefitsConfig,
    compiled: CompiledConfig,
}

impl ComparisonRunner {
    pub fn new(config: BenefitsConfig) -> Result<Self> {
        let compiled = CompiledConfig::compile(&config)?;
        Ok(Self { config, compiled })
    }

    /// Create runner by loading the configuration from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(load_config(path)?)
    }

    pub fn config(&self) -> &BenefitsConfig {
        &self.config
    }

    pub fn compiled(&self) -> &CompiledConfig {
        &self.compiled
    }

    pub fn evaluator(&self) -> PlanEvaluator<'_> {
        PlanEvaluator::new(&self.config, &self.compiled)
    }

    /// Evaluate and rank every plan offered in the requested region
    pub fn run(&self, args: &CalculationArgs) -> Result<Comparison> {
        let comparison = self.compare(args)?;

        let no_employee_funding = if args.include_no_employee_funding {
            Some(self.compare(&args.without_employee_funding())?)
        } else {
            None
        };

        Ok(Comparison {
            comparison,
            no_employee_funding,
        })
    }

    /// Evaluate a single plan by id; it must be offered in the requested region
    pub fn run_plan(&self, plan_id: &str, args: &CalculationArgs) -> Result<PlanResult> {
        self.validate(args)?;
        let plan = self
            .config
            .plan(plan_id)
            .ok_or_else(|| EngineError::UnknownPlan(plan_id.to_string()))?;
        if !plan.is_offered_in(&args.region) {
            return Err(EngineError::PlanNotInRegion {
                plan: plan_id.to_string(),
                region: args.region.clone(),
            });
        }
        self.evaluator().evaluate_plan(plan_id, args)
    }

    fn compare(&self, args: &CalculationArgs) -> Result<PlanComparison> {
        self.validate(args)?;
        let evaluator = self.evaluator();
        let level = evaluator.select_coverage_level(&args.household)?;

        let offered: Vec<usize> = self
            .config
            .plans
            .iter()
            .enumerate()
            .filter(|(_, plan)| plan.is_offered_in(&args.region))
            .map(|(index, _)| index)
            .collect();

        info!(
            "Comparing {} plans in region {} for a household of {} ({})",
            offered.len(),
            args.region,
            args.household.size(),
            level.id
        );

        // Plans are independent; collect keeps configured order
        let plans = offered
            .par_iter()
            .map(|&index| evaluator.evaluate(index, args, &level.id))
            .collect::<Result<Vec<_>>>()?;

        let rankings = Rankings::rank(&plans);
        let by_priority = rankings.by_priority(args.priority).to_vec();
        let flags = AggregateFlags::from_results(&plans);

        Ok(PlanComparison {
            coverage_level: level.id.clone(),
            plans,
            rankings,
            priority: args.priority,
            by_priority,
            flags,
        })
    }

    fn validate(&self, args: &CalculationArgs) -> Result<()> {
        if self.config.region(&args.region).is_none() {
            return Err(EngineError::UnknownRegion(args.region.clone()));
        }
        if self.config.status(&args.status).is_none() {
            return Err(EngineError::UnknownStatus(args.status.clone()));
        }
        Ok(())
    }
}
