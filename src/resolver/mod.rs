//! Service cost resolution: deductible, copay, coinsurance, reimbursement

mod cost;
mod records;

pub use cost::ServiceCostResolver;
pub use records::{ChargeBreakdown, CoverageEntryCosts, ServiceCostRecord};
