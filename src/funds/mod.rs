//! Employer/plan/voluntary/rollover fund offsets

mod waterfall;

pub use waterfall::{allocate_funds, Carryover, FundAllocation, FundInputs, FundPolicy, SourceAllocation};
