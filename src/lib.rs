//! Plan Cost Engine - Benefit plan cost-sharing and comparison for households
//!
//! This library provides:
//! - Per-service deductible, copay, coinsurance and reimbursement resolution
//! - Shared person/family deductible, OOP-maximum and combined-limit ledgers
//! - Employer/plan/voluntary/rollover fund waterfall offsets
//! - Worst-case annual exposure bounds
//! - Plan rankings and comparison flags across a region's plans

pub mod comparison;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod funds;
pub mod household;
pub mod ledger;
pub mod money;
pub mod resolver;
pub mod worst_case;

// Re-export commonly used types
pub use comparison::{Comparison, ComparisonRunner, PlanComparison};
pub use config::{load_config, BenefitsConfig, CompiledConfig};
pub use error::{EngineError, Result};
pub use evaluation::{AggregateFlags, PlanEvaluator, PlanResult, RankingPriority, Rankings};
pub use funds::{allocate_funds, FundAllocation, FundPolicy};
pub use household::{load_funding, load_household, CalculationArgs, Household, Member, PlanFunding, Role};
pub use ledger::QuotaLedger;
pub use resolver::{ServiceCostRecord, ServiceCostResolver};
pub use worst_case::{WorstCaseBound, WorstCaseBoundCalculator};
