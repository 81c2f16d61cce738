//! Benefits configuration: raw validated data, keyed amounts and compiled indices

mod amount;
mod compiled;
mod data;
pub mod loader;

#[cfg(test)]
pub(crate) mod test_support;

pub use amount::{Amount, AmountKey, KeyedAmount};
pub use compiled::{CategoryIndex, CompiledConfig, CompiledPlan};
pub use data::{
    AccountType, BenefitsConfig, Category, ChargeType, CombinedLimit, Coverage, CoverageEntry,
    CoverageLevel, DeductibleTiming, FundEligibility, Plan, PlanFunds, Premiums, QuotaGroup,
    Region, Service, Status, ADDITIONAL_SERVICES_PREFIX,
};
pub use loader::{load_config, load_config_from_reader};
