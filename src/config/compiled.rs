//! Derived configuration indices, computed once per configuration
//!
//! The raw configuration is never mutated. `CompiledConfig::compile` is a pure
//! function of the configuration, so compiling twice yields equal values and the
//! result can be shared read-only across concurrent plan evaluations.

use std::collections::BTreeMap;

use crate::error::{EngineError, Result};

use super::data::{BenefitsConfig, CoverageEntry, FundEligibility, Plan};

/// Index of a category in configured order
pub type CategoryIndex = usize;

/// Derived lookup tables for a whole configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledConfig {
    categories: Vec<String>,
    category_index: BTreeMap<String, CategoryIndex>,

    /// Category of each service, by service index
    service_categories: Vec<CategoryIndex>,

    /// Per-plan indices, parallel to `BenefitsConfig::plans`
    plans: Vec<CompiledPlan>,
}

/// Derived lookup tables for one plan
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlan {
    pub plan_id: String,

    /// Deductible group ids applicable to each category
    pub deductible_groups: Vec<Vec<String>>,

    /// OOP-maximum group ids applicable to each category
    pub oop_groups: Vec<Vec<String>>,

    /// Coverage tiers for each service (never empty)
    pub coverage: Vec<Vec<CoverageEntry>>,

    /// Fund eligibility of each category
    pub fund_eligibility: Vec<FundEligibility>,

    /// Services with a deductible-bearing tier, in configured order
    pub deductible_services: Vec<usize>,

    /// Remaining services, in configured order
    pub other_services: Vec<usize>,
}

impl CompiledConfig {
    /// Derive every index the engine needs from a validated configuration
    pub fn compile(config: &BenefitsConfig) -> Result<Self> {
        let categories: Vec<String> = config.categories.iter().map(|c| c.id.clone()).collect();
        let category_index: BTreeMap<String, CategoryIndex> = categories
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let service_categories = config
            .services
            .iter()
            .map(|service| {
                category_index
                    .get(&service.category_id)
                    .copied()
                    .ok_or_else(|| EngineError::UnknownCategory {
                        service: service.id.clone(),
                        category: service.category_id.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let plans = config
            .plans
            .iter()
            .map(|plan| compile_plan(config, plan, &category_index))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Compiled configuration: {} categories, {} services, {} plans",
            categories.len(),
            service_categories.len(),
            plans.len()
        );

        Ok(Self {
            categories,
            category_index,
            service_categories,
            plans,
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_index(&self, id: &str) -> Option<CategoryIndex> {
        self.category_index.get(id).copied()
    }

    /// Category of the service at `service_index`
    pub fn service_category(&self, service_index: usize) -> CategoryIndex {
        self.service_categories[service_index]
    }

    /// Compiled plan at `plan_index` (parallel to the configured plans)
    pub fn plan(&self, plan_index: usize) -> &CompiledPlan {
        &self.plans[plan_index]
    }

    pub fn plans(&self) -> &[CompiledPlan] {
        &self.plans
    }
}

impl CompiledPlan {
    /// Services in evaluation order: deductible-bearing first, then the rest
    pub fn evaluation_passes(&self) -> [&[usize]; 2] {
        [&self.deductible_services, &self.other_services]
    }
}

fn compile_plan(
    config: &BenefitsConfig,
    plan: &Plan,
    category_index: &BTreeMap<String, CategoryIndex>,
) -> Result<CompiledPlan> {
    let category_count = category_index.len();

    let mut deductible_groups = vec![Vec::new(); category_count];
    for group in &plan.deductibles {
        for category in &group.categories {
            let idx = group_category(plan, &group.id, category, category_index)?;
            if !deductible_groups[idx].contains(&group.id) {
                deductible_groups[idx].push(group.id.clone());
            }
        }
    }

    let mut oop_groups = vec![Vec::new(); category_count];
    for group in &plan.out_of_pocket_maximums {
        for category in &group.categories {
            let idx = group_category(plan, &group.id, category, category_index)?;
            if !oop_groups[idx].contains(&group.id) {
                oop_groups[idx].push(group.id.clone());
            }
        }
    }

    let mut coverage = Vec::with_capacity(config.services.len());
    let mut deductible_services = Vec::new();
    let mut other_services = Vec::new();

    for (service_index, service) in config.services.iter().enumerate() {
        let tiers = plan
            .coverages
            .get(&service.id)
            .ok_or_else(|| EngineError::MissingCoverage {
                plan: plan.id.clone(),
                service: service.id.clone(),
            })?
            .tiers();

        if tiers.is_empty() {
            return Err(EngineError::EmptyCoverage {
                plan: plan.id.clone(),
                service: service.id.clone(),
            });
        }

        for tier in &tiers {
            if let Some(limit) = &tier.combined_limit_id {
                if !plan.combined_limits.iter().any(|l| &l.id == limit) {
                    return Err(EngineError::UnknownCombinedLimit {
                        plan: plan.id.clone(),
                        service: service.id.clone(),
                        limit: limit.clone(),
                    });
                }
            }
        }

        if tiers.iter().any(|t| t.deductible_timing().applies()) {
            deductible_services.push(service_index);
        } else {
            other_services.push(service_index);
        }
        coverage.push(tiers);
    }

    let mut fund_eligibility = vec![FundEligibility::default(); category_count];
    for (category, eligibility) in &plan.fund_eligibility {
        if let Some(&idx) = category_index.get(category) {
            fund_eligibility[idx] = *eligibility;
        }
    }

    Ok(CompiledPlan {
        plan_id: plan.id.clone(),
        deductible_groups,
        oop_groups,
        coverage,
        fund_eligibility,
        deductible_services,
        other_services,
    })
}

fn group_category(
    plan: &Plan,
    group_id: &str,
    category: &str,
    category_index: &BTreeMap<String, CategoryIndex>,
) -> Result<CategoryIndex> {
    category_index
        .get(category)
        .copied()
        .ok_or_else(|| EngineError::UnknownGroupCategory {
            plan: plan.id.clone(),
            group: group_id.to_string(),
            category: category.to_string(),
        })
}
