//! Household members, utilization and calculation arguments

mod data;
pub mod loader;

pub use data::{CalculationArgs, Household, Member, PlanFunding, PremiumAdjustment, Role};
pub use loader::{load_funding, load_household, load_household_from_reader};
