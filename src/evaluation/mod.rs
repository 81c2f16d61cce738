//! Plan evaluation, ranking and comparison flags

mod engine;
mod ranking;
mod result;

pub use engine::PlanEvaluator;
pub use ranking::{AggregateFlags, RankingPriority, Rankings};
pub use result::{PlanResult, PlanTotals, PremiumCosts};
